//! Builders shared by the scoring unit tests.

use std::time::SystemTime;

use uuid::Uuid;

use crate::scoring::{
    apply::DeliveryEvent,
    log::Scorecard,
    model::{ElectedTo, ExtraType, MatchInfo, MatchRules, MatchStatus, Toss, WicketType},
};

pub(crate) fn sample_info() -> MatchInfo {
    let home_team_id = Uuid::new_v4();
    MatchInfo {
        id: Uuid::new_v4(),
        venue: "Eden Gardens".into(),
        scheduled_at: SystemTime::UNIX_EPOCH,
        home_team_id,
        away_team_id: Uuid::new_v4(),
        toss: Some(Toss {
            winner_id: home_team_id,
            elected_to: ElectedTo::Bat,
        }),
        rules: MatchRules {
            overs_limit: 20,
            wickets_limit: 10,
        },
        status: MatchStatus::Ongoing,
        umpire_id: None,
        created_at: SystemTime::UNIX_EPOCH,
    }
}

pub(crate) fn ongoing_scorecard(overs_limit: u32, wickets_limit: u32) -> Scorecard {
    let mut info = sample_info();
    info.rules = MatchRules {
        overs_limit,
        wickets_limit,
    };
    Scorecard::new(info)
}

pub(crate) fn dot(batsman_id: Uuid, bowler_id: Uuid) -> DeliveryEvent {
    runs(batsman_id, bowler_id, 0)
}

pub(crate) fn runs(batsman_id: Uuid, bowler_id: Uuid, runs_scored: u8) -> DeliveryEvent {
    DeliveryEvent {
        innings_hint: None,
        batsman_id,
        bowler_id,
        runs_scored,
        is_wicket: false,
        wicket_type: None,
        extra_type: None,
        extra_runs: 0,
        delivery_id: None,
    }
}

pub(crate) fn extra(
    batsman_id: Uuid,
    bowler_id: Uuid,
    extra_type: ExtraType,
    extra_runs: u32,
) -> DeliveryEvent {
    DeliveryEvent {
        extra_type: Some(extra_type),
        extra_runs,
        ..dot(batsman_id, bowler_id)
    }
}

pub(crate) fn wicket(batsman_id: Uuid, bowler_id: Uuid, wicket_type: WicketType) -> DeliveryEvent {
    DeliveryEvent {
        is_wicket: true,
        wicket_type: Some(wicket_type),
        ..dot(batsman_id, bowler_id)
    }
}
