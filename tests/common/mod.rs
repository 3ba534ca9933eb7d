#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use cricket_score_back::{
    config::AppConfig,
    dao::{
        models::{RosterPlayerEntity, TeamEntity},
        score_store::{MemoryScoreStore, ScoreStore},
    },
    dto::{delivery::SubmitDeliveryRequest, matches::CreateMatchRequest, snapshot::MatchSnapshot},
    scoring::model::{ExtraType, WicketType},
    services::match_service,
    state::{AppState, SharedState},
};
use uuid::Uuid;

pub struct Fixture {
    pub state: SharedState,
    pub home: TeamEntity,
    pub away: TeamEntity,
}

fn team(name: &str) -> TeamEntity {
    TeamEntity {
        id: Uuid::new_v4(),
        name: name.into(),
        players: (1..=3)
            .map(|n| RosterPlayerEntity {
                id: Uuid::new_v4(),
                name: format!("{name} #{n}"),
            })
            .collect(),
    }
}

/// Application state backed by a seeded in-memory store.
pub async fn fixture(lock_wait: Duration) -> Fixture {
    let home = team("Harbour Hawks");
    let away = team("Valley Vipers");
    let state = AppState::new(AppConfig {
        lock_wait,
        teams: vec![home.clone(), away.clone()],
        ..AppConfig::default()
    });
    let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
    match_service::seed_teams(&store, &state.config().teams)
        .await
        .unwrap();
    state.install_score_store(store).await;
    Fixture { state, home, away }
}

impl Fixture {
    pub fn match_request(&self, overs_limit: u32, wickets_limit: u32) -> CreateMatchRequest {
        CreateMatchRequest {
            venue: "Newlands".into(),
            scheduled_at: "2026-10-18T09:30:00Z".into(),
            home_team_id: self.home.id,
            away_team_id: self.away.id,
            overs_limit,
            wickets_limit,
            umpire_id: None,
        }
    }

    pub async fn create_match(&self, overs_limit: u32, wickets_limit: u32) -> MatchSnapshot {
        match_service::create_match(&self.state, self.match_request(overs_limit, wickets_limit))
            .await
            .unwrap()
    }
}

pub fn delivery(batsman_id: Uuid, bowler_id: Uuid, runs_scored: u8) -> SubmitDeliveryRequest {
    SubmitDeliveryRequest {
        innings_id: None,
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

pub fn wide(batsman_id: Uuid, bowler_id: Uuid) -> SubmitDeliveryRequest {
    SubmitDeliveryRequest {
        extra_type: Some(ExtraType::Wide),
        extra_runs: 1,
        ..delivery(batsman_id, bowler_id, 0)
    }
}

pub fn bowled(batsman_id: Uuid, bowler_id: Uuid) -> SubmitDeliveryRequest {
    SubmitDeliveryRequest {
        is_wicket: true,
        wicket_type: Some(WicketType::Bowled),
        ..delivery(batsman_id, bowler_id, 0)
    }
}
