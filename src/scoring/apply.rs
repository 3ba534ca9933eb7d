//! Pure scoring transitions: `(scorecard, event) -> (journal, next scorecard)`.
//!
//! Nothing in this module performs I/O. The scoring service loads the committed scorecard,
//! calls one of these functions and commits the returned journal atomically.

use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::scoring::{
    ScoringError,
    aggregate::aggregate_innings,
    log::{Draft, ScoreChange, Scorecard},
    model::{
        Ball, BallId, ExtraType, Innings, MAX_EXTRA_RUNS, MAX_INNINGS, MAX_RUNS_PER_BALL,
        MatchStatus, Toss, WicketType,
    },
    progression::{MatchEvent, evaluate_progress, next_status},
    segmentation::{Position, position_delivery},
    stats::update_player_stats,
};

/// A delivery as submitted by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    /// Innings the scorer believes the ball belongs to.
    pub innings_hint: Option<Uuid>,
    /// Batsman on strike.
    pub batsman_id: Uuid,
    /// Bowler of the delivery.
    pub bowler_id: Uuid,
    /// Runs off the bat.
    pub runs_scored: u8,
    /// Whether a wicket fell.
    pub is_wicket: bool,
    /// Dismissal kind.
    pub wicket_type: Option<WicketType>,
    /// Extra kind.
    pub extra_type: Option<ExtraType>,
    /// Extra runs awarded.
    pub extra_runs: u32,
    /// Idempotency token chosen by the client.
    pub delivery_id: Option<Uuid>,
}

impl DeliveryEvent {
    /// Reject malformed deliveries before anything is written.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let invalid = |message: &str| Err(ScoringError::InvalidDelivery(message.into()));

        if self.batsman_id.is_nil() {
            return invalid("batsman is required");
        }
        if self.bowler_id.is_nil() {
            return invalid("bowler is required");
        }
        if self.batsman_id == self.bowler_id {
            return invalid("batsman and bowler must be different players");
        }
        if self.runs_scored > MAX_RUNS_PER_BALL {
            return Err(ScoringError::InvalidDelivery(format!(
                "runs scored must be between 0 and {MAX_RUNS_PER_BALL}, got {}",
                self.runs_scored
            )));
        }
        if self.extra_runs > MAX_EXTRA_RUNS {
            return Err(ScoringError::InvalidDelivery(format!(
                "extra runs must be between 0 and {MAX_EXTRA_RUNS}, got {}",
                self.extra_runs
            )));
        }
        match self.extra_type {
            None if self.extra_runs > 0 => {
                return invalid("extra runs require an extra type");
            }
            Some(ExtraType::Bye | ExtraType::LegBye) if self.runs_scored > 0 => {
                return invalid("byes and leg byes cannot carry runs off the bat");
            }
            _ => {}
        }
        if self.wicket_type.is_some() && !self.is_wicket {
            return invalid("wicket type given for a delivery without a wicket");
        }
        Ok(())
    }
}

/// Outcome of a pure scoring transition.
#[derive(Debug, Clone)]
pub struct Applied {
    changes: Vec<ScoreChange>,
    scorecard: Scorecard,
    ball: Option<(BallId, Position)>,
    transition: Option<MatchEvent>,
}

impl Applied {
    fn from_draft(
        draft: Draft,
        ball: Option<(BallId, Position)>,
        transition: Option<MatchEvent>,
    ) -> Self {
        let (changes, scorecard) = draft.finish();
        Self {
            changes,
            scorecard,
            ball,
            transition,
        }
    }

    fn unchanged(scorecard: &Scorecard) -> Self {
        Self {
            changes: Vec::new(),
            scorecard: scorecard.clone(),
            ball: None,
            transition: None,
        }
    }

    /// Journal to commit. Empty when the submission was already recorded.
    pub fn changes(&self) -> &[ScoreChange] {
        &self.changes
    }

    /// Scorecard once the journal is committed.
    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    /// Consume the outcome, keeping the resulting scorecard.
    pub fn into_scorecard(self) -> Scorecard {
        self.scorecard
    }

    /// Whether nothing needs to be committed.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Arena id and position of the appended ball, if any.
    pub fn ball(&self) -> Option<(BallId, Position)> {
        self.ball
    }

    /// Status transition triggered by this change, if any.
    pub fn transition(&self) -> Option<MatchEvent> {
        self.transition
    }
}

/// Place, record and aggregate one delivery, then evaluate match progression.
pub fn apply_delivery(
    scorecard: &Scorecard,
    event: &DeliveryEvent,
    recorded_at: SystemTime,
) -> Result<Applied, ScoringError> {
    event.validate()?;

    if let Some(delivery_id) = event.delivery_id {
        if scorecard.find_ball_by_delivery_id(delivery_id).is_some() {
            debug!(%delivery_id, "delivery already recorded");
            return Ok(Applied::unchanged(scorecard));
        }
    }

    if scorecard.info.status != MatchStatus::Ongoing {
        return Err(ScoringError::MatchNotInProgress(scorecard.info.status));
    }
    if scorecard.innings().len() > MAX_INNINGS {
        return Err(ScoringError::InningsLimitReached);
    }

    let mut draft = Draft::begin(scorecard);
    let innings_id = resolve_innings(&mut draft, event.innings_hint)?;

    let position = position_delivery(&mut draft, innings_id, event.bowler_id)?;
    let ball = Ball {
        id: BallId(0),
        segment_id: position.segment,
        ball_number: position.ball_number,
        batsman_id: event.batsman_id,
        runs_scored: event.runs_scored,
        is_wicket: event.is_wicket,
        wicket_type: event.wicket_type,
        extra_type: event.extra_type,
        extra_runs: event.extra_runs,
        delivery_id: event.delivery_id,
        recorded_at,
    };
    let ball_id = draft.append_ball(ball.clone())?;

    aggregate_innings(&mut draft, innings_id, &ball)?;
    update_player_stats(&mut draft, &ball, event.bowler_id)?;

    let status = draft.scorecard().info.status;
    let transition = evaluate_progress(&draft.scorecard().info.rules, draft.scorecard().innings());
    if let Some(progress) = transition {
        draft.set_match_status(next_status(status, progress)?)?;
    }

    Ok(Applied::from_draft(draft, Some((ball_id, position)), transition))
}

/// Record the toss result and open play.
pub fn record_toss(scorecard: &Scorecard, toss: Toss) -> Result<Applied, ScoringError> {
    let info = &scorecard.info;
    if toss.winner_id != info.home_team_id && toss.winner_id != info.away_team_id {
        return Err(ScoringError::InvalidToss(format!(
            "toss winner `{}` is not playing this match",
            toss.winner_id
        )));
    }
    let next = next_status(info.status, MatchEvent::TossRecorded)?;

    let mut draft = Draft::begin(scorecard);
    draft.record(ScoreChange::RecordToss(toss))?;
    draft.set_match_status(next)?;
    Ok(Applied::from_draft(draft, None, Some(MatchEvent::TossRecorded)))
}

/// Open the chase with the sides swapped. Requires exactly one recorded innings.
pub fn start_second_innings(scorecard: &Scorecard) -> Result<Applied, ScoringError> {
    let [first] = scorecard.innings() else {
        return Err(ScoringError::SecondInningsUnavailable(
            scorecard.innings().len(),
        ));
    };
    let next = next_status(scorecard.info.status, MatchEvent::SecondInningsStarted)?;

    let mut draft = Draft::begin(scorecard);
    draft.create_innings(Innings::open(
        2,
        first.bowling_team_id,
        first.batting_team_id,
    ))?;
    draft.set_match_status(next)?;
    Ok(Applied::from_draft(
        draft,
        None,
        Some(MatchEvent::SecondInningsStarted),
    ))
}

fn resolve_innings(draft: &mut Draft, hint: Option<Uuid>) -> Result<Uuid, ScoringError> {
    let scorecard = draft.scorecard();
    let current = scorecard.current_innings().map(|innings| innings.id);

    match (hint, current) {
        (Some(hint), _) if scorecard.innings_by_id(hint).is_none() => {
            Err(ScoringError::InningsNotFound(hint))
        }
        (Some(hint), Some(current)) if hint != current => Err(ScoringError::InningsClosed(hint)),
        (_, Some(current)) => Ok(current),
        (_, None) => {
            let batting = scorecard.info.first_batting_team();
            let bowling = scorecard.info.opponent_of(batting);
            Ok(draft.create_innings(Innings::open(1, batting, bowling))?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        aggregate::recompute_innings_totals,
        fixtures::{dot, extra, ongoing_scorecard, runs, sample_info, wicket},
        model::ElectedTo,
        progression::{Margin, MatchResult, decide_result},
    };

    fn bowl(scorecard: Scorecard, event: DeliveryEvent) -> Scorecard {
        apply_delivery(&scorecard, &event, SystemTime::UNIX_EPOCH)
            .unwrap()
            .into_scorecard()
    }

    #[test]
    fn six_legal_balls_complete_the_first_over() {
        let (batsman, x) = (Uuid::new_v4(), Uuid::new_v4());
        let mut scorecard = ongoing_scorecard(20, 10);
        for _ in 0..6 {
            scorecard = bowl(scorecard, dot(batsman, x));
        }
        assert_eq!(scorecard.current_innings().unwrap().overs.as_decimal(), 1.0);

        let applied = apply_delivery(&scorecard, &dot(batsman, x), SystemTime::UNIX_EPOCH).unwrap();
        let (_, position) = applied.ball().unwrap();
        assert_eq!(position.over_number, 2);
        assert_eq!(position.ball_number, 1);
        assert_ne!(position.segment, scorecard.segments()[0].id);
    }

    #[test]
    fn first_innings_bats_according_to_the_toss() {
        let mut info = sample_info();
        info.toss = Some(Toss {
            winner_id: info.away_team_id,
            elected_to: ElectedTo::Field,
        });
        let home = info.home_team_id;
        let scorecard = bowl(Scorecard::new(info), dot(Uuid::new_v4(), Uuid::new_v4()));
        assert_eq!(scorecard.current_innings().unwrap().batting_team_id, home);
    }

    #[test]
    fn all_out_moves_to_innings_break() {
        let bowler = Uuid::new_v4();
        let mut scorecard = ongoing_scorecard(20, 10);
        for _ in 0..25 {
            scorecard = bowl(scorecard, runs(Uuid::new_v4(), bowler, 6));
        }
        for _ in 0..9 {
            scorecard = bowl(scorecard, wicket(Uuid::new_v4(), bowler, WicketType::Bowled));
        }
        assert_eq!(scorecard.info.status, MatchStatus::Ongoing);

        let applied = apply_delivery(
            &scorecard,
            &wicket(Uuid::new_v4(), bowler, WicketType::Caught),
            SystemTime::UNIX_EPOCH,
        )
        .unwrap();
        assert_eq!(applied.transition(), Some(MatchEvent::InningsClosed));
        let scorecard = applied.into_scorecard();
        let innings = scorecard.current_innings().unwrap();
        assert_eq!((innings.score, innings.wickets), (150, 10));
        assert_eq!(scorecard.info.status, MatchStatus::InningsBreak);

        let err = apply_delivery(&scorecard, &dot(Uuid::new_v4(), bowler), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, ScoringError::MatchNotInProgress(MatchStatus::InningsBreak));
    }

    #[test]
    fn chase_past_the_target_completes_the_match() {
        let (batsman, bowler) = (Uuid::new_v4(), Uuid::new_v4());
        let mut scorecard = ongoing_scorecard(50, 10);
        for _ in 0..25 {
            scorecard = bowl(scorecard, runs(batsman, bowler, 6));
        }
        for _ in 0..10 {
            scorecard = bowl(scorecard, wicket(batsman, bowler, WicketType::Stumped));
        }
        let first = scorecard.current_innings().unwrap().clone();
        assert_eq!(first.score, 150);

        scorecard = start_second_innings(&scorecard).unwrap().into_scorecard();
        assert_eq!(scorecard.info.status, MatchStatus::Ongoing);
        let second = scorecard.current_innings().unwrap().clone();
        assert_eq!(second.batting_team_id, first.bowling_team_id);
        assert_eq!(second.bowling_team_id, first.batting_team_id);

        let (chaser, attack) = (Uuid::new_v4(), Uuid::new_v4());
        scorecard = bowl(scorecard, wicket(chaser, attack, WicketType::Lbw));
        for _ in 0..25 {
            scorecard = bowl(scorecard, runs(chaser, attack, 6));
        }
        assert_eq!(scorecard.current_innings().unwrap().score, 150);
        assert_eq!(scorecard.info.status, MatchStatus::Ongoing);

        scorecard = bowl(scorecard, runs(chaser, attack, 1));
        assert_eq!(scorecard.current_innings().unwrap().score, 151);
        assert_eq!(scorecard.info.status, MatchStatus::Completed);
        assert_eq!(
            decide_result(&scorecard.info, scorecard.innings()),
            Some(MatchResult::Won {
                winner_team_id: second.batting_team_id,
                margin: Margin::Wickets(9)
            })
        );

        let err = apply_delivery(&scorecard, &dot(chaser, attack), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, ScoringError::MatchNotInProgress(MatchStatus::Completed));
    }

    #[test]
    fn wide_scenario_updates_score_and_bowler_only() {
        let (batsman, bowler) = (Uuid::new_v4(), Uuid::new_v4());
        let scorecard = bowl(
            ongoing_scorecard(20, 10),
            extra(batsman, bowler, ExtraType::Wide, 1),
        );
        let innings = scorecard.current_innings().unwrap();
        assert_eq!(innings.score, 1);
        assert_eq!(scorecard.count_legal_balls(innings.id, None), 0);
        assert_eq!(scorecard.player_stat(bowler).unwrap().runs_conceded, 1);
        assert_eq!(
            recompute_innings_totals(&scorecard, innings.id).score,
            innings.score
        );
    }

    #[test]
    fn resubmitted_delivery_token_is_not_appended_twice() {
        let token = Uuid::new_v4();
        let event = DeliveryEvent {
            delivery_id: Some(token),
            ..runs(Uuid::new_v4(), Uuid::new_v4(), 4)
        };
        let scorecard = bowl(ongoing_scorecard(20, 10), event.clone());
        let again = apply_delivery(&scorecard, &event, SystemTime::UNIX_EPOCH).unwrap();

        assert!(again.is_noop());
        assert_eq!(again.scorecard().balls().len(), 1);
        assert_eq!(again.scorecard().version, scorecard.version);
    }

    #[test]
    fn innings_hint_must_point_at_the_current_innings() {
        let (batsman, bowler) = (Uuid::new_v4(), Uuid::new_v4());
        let scorecard = bowl(ongoing_scorecard(20, 10), dot(batsman, bowler));
        let current = scorecard.current_innings().unwrap().id;

        let unknown = Uuid::new_v4();
        let err = apply_delivery(
            &scorecard,
            &DeliveryEvent {
                innings_hint: Some(unknown),
                ..dot(batsman, bowler)
            },
            SystemTime::UNIX_EPOCH,
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::InningsNotFound(unknown));

        let scorecard = bowl(
            scorecard,
            DeliveryEvent {
                innings_hint: Some(current),
                ..dot(batsman, bowler)
            },
        );
        assert_eq!(scorecard.balls().len(), 2);
    }

    #[test]
    fn malformed_deliveries_are_rejected() {
        let (batsman, bowler) = (Uuid::new_v4(), Uuid::new_v4());
        let scorecard = ongoing_scorecard(20, 10);
        let cases = [
            runs(batsman, bowler, 7),
            dot(Uuid::nil(), bowler),
            dot(batsman, Uuid::nil()),
            dot(batsman, batsman),
            DeliveryEvent {
                extra_runs: 2,
                ..dot(batsman, bowler)
            },
            DeliveryEvent {
                runs_scored: 2,
                ..extra(batsman, bowler, ExtraType::Bye, 1)
            },
            DeliveryEvent {
                wicket_type: Some(WicketType::Bowled),
                ..dot(batsman, bowler)
            },
            DeliveryEvent {
                runs_scored: 1,
                extra_runs: u32::MAX,
                ..extra(batsman, bowler, ExtraType::NoBall, 1)
            },
        ];
        for event in cases {
            let err = apply_delivery(&scorecard, &event, SystemTime::UNIX_EPOCH).unwrap_err();
            assert!(
                matches!(err, ScoringError::InvalidDelivery(_)),
                "unexpected error {err:?} for {event:?}"
            );
        }
    }

    #[test]
    fn largest_extra_award_is_counted_in_full() {
        let (batsman, bowler) = (Uuid::new_v4(), Uuid::new_v4());
        let scorecard = bowl(
            ongoing_scorecard(20, 10),
            DeliveryEvent {
                runs_scored: 6,
                ..extra(batsman, bowler, ExtraType::NoBall, MAX_EXTRA_RUNS)
            },
        );
        let innings = scorecard.current_innings().unwrap();
        assert_eq!(innings.score, 6 + MAX_EXTRA_RUNS);
        assert_eq!(
            scorecard.player_stat(bowler).unwrap().runs_conceded,
            6 + MAX_EXTRA_RUNS
        );
        assert_eq!(
            recompute_innings_totals(&scorecard, innings.id).score,
            innings.score
        );
    }

    #[test]
    fn toss_opens_play_once() {
        let mut info = sample_info();
        info.status = MatchStatus::Toss;
        info.toss = None;
        let toss = Toss {
            winner_id: info.away_team_id,
            elected_to: ElectedTo::Bat,
        };
        let scorecard = Scorecard::new(info);

        let err = apply_delivery(
            &scorecard,
            &dot(Uuid::new_v4(), Uuid::new_v4()),
            SystemTime::UNIX_EPOCH,
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::MatchNotInProgress(MatchStatus::Toss));

        let scorecard = record_toss(&scorecard, toss).unwrap().into_scorecard();
        assert_eq!(scorecard.info.status, MatchStatus::Ongoing);
        assert_eq!(scorecard.info.first_batting_team(), toss.winner_id);
        assert!(matches!(
            record_toss(&scorecard, toss),
            Err(ScoringError::Transition(_))
        ));
    }

    #[test]
    fn second_innings_needs_exactly_one_innings() {
        let scorecard = ongoing_scorecard(20, 10);
        assert_eq!(
            start_second_innings(&scorecard).unwrap_err(),
            ScoringError::SecondInningsUnavailable(0)
        );

        let scorecard = bowl(scorecard, dot(Uuid::new_v4(), Uuid::new_v4()));
        let scorecard = start_second_innings(&scorecard).unwrap().into_scorecard();
        assert_eq!(
            start_second_innings(&scorecard).unwrap_err(),
            ScoringError::SecondInningsUnavailable(2)
        );
    }
}
