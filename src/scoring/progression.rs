//! Match progression: `TOSS -> ONGOING -> INNINGS_BREAK -> ONGOING -> COMPLETED`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::scoring::model::{Innings, MatchInfo, MatchRules, MatchStatus};

/// Events that can move a match between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Toss result submitted; play can begin.
    TossRecorded,
    /// The first innings ran out of wickets or overs.
    InningsClosed,
    /// The chasing side walks out.
    SecondInningsStarted,
    /// Target reached, or the chase ran out of wickets or overs.
    MatchDecided,
}

/// Error returned when an event cannot be applied from the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Status the match was in.
    pub from: MatchStatus,
    /// Event that was rejected.
    pub event: MatchEvent,
}

/// Compute the status reached by applying `event` from `from`.
pub fn next_status(from: MatchStatus, event: MatchEvent) -> Result<MatchStatus, InvalidTransition> {
    let next = match (from, event) {
        (MatchStatus::Toss, MatchEvent::TossRecorded) => MatchStatus::Ongoing,
        (MatchStatus::Ongoing, MatchEvent::InningsClosed) => MatchStatus::InningsBreak,
        (MatchStatus::InningsBreak | MatchStatus::Ongoing, MatchEvent::SecondInningsStarted) => {
            MatchStatus::Ongoing
        }
        (MatchStatus::Ongoing, MatchEvent::MatchDecided) => MatchStatus::Completed,
        (from, event) => return Err(InvalidTransition { from, event }),
    };
    Ok(next)
}

/// Decide, after a delivery, whether the innings state calls for a transition.
pub fn evaluate_progress(rules: &MatchRules, innings: &[Innings]) -> Option<MatchEvent> {
    match innings {
        [first] if innings_exhausted(rules, first) => Some(MatchEvent::InningsClosed),
        [first, second]
            if second.score > first.score || innings_exhausted(rules, second) =>
        {
            Some(MatchEvent::MatchDecided)
        }
        _ => None,
    }
}

fn innings_exhausted(rules: &MatchRules, innings: &Innings) -> bool {
    innings.wickets >= rules.wickets_limit || innings.overs.reached(rules.overs_limit)
}

/// How a match was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    /// Defending side won by this many runs.
    Runs(u32),
    /// Chasing side won with this many wickets in hand.
    Wickets(u32),
}

/// Derived result of a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// One side won.
    Won {
        /// Winning team.
        winner_team_id: Uuid,
        /// Winning margin.
        margin: Margin,
    },
    /// Scores finished level.
    Tie,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Won {
                winner_team_id,
                margin: Margin::Runs(runs),
            } => write!(f, "{winner_team_id} won by {runs} runs"),
            MatchResult::Won {
                winner_team_id,
                margin: Margin::Wickets(wickets),
            } => write!(f, "{winner_team_id} won by {wickets} wickets"),
            MatchResult::Tie => f.write_str("match tied"),
        }
    }
}

/// Result of a completed match; `None` while the match is still running.
pub fn decide_result(info: &MatchInfo, innings: &[Innings]) -> Option<MatchResult> {
    if info.status != MatchStatus::Completed {
        return None;
    }
    let [first, second] = innings else {
        return None;
    };

    let result = if second.score > first.score {
        MatchResult::Won {
            winner_team_id: second.batting_team_id,
            margin: Margin::Wickets(info.rules.wickets_limit.saturating_sub(second.wickets)),
        }
    } else if first.score > second.score {
        MatchResult::Won {
            winner_team_id: first.batting_team_id,
            margin: Margin::Runs(first.score - second.score),
        }
    } else {
        MatchResult::Tie
    };
    Some(result)
}
