//! Innings totals derived from the delivery log.

use uuid::Uuid;

use crate::scoring::{
    log::{Draft, LogError, Scorecard},
    model::{Ball, Innings, Overs},
};

/// Score, wickets and overs of an innings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InningsTotals {
    /// Runs including every extra.
    pub score: u32,
    /// Wickets fallen.
    pub wickets: u32,
    /// Legal balls bowled in over notation.
    pub overs: Overs,
}

impl From<&Innings> for InningsTotals {
    fn from(innings: &Innings) -> Self {
        Self {
            score: innings.score,
            wickets: innings.wickets,
            overs: innings.overs,
        }
    }
}

/// Totals after `ball` has been appended. `legal_balls` is the innings-wide legal ball count
/// including that ball.
pub fn totals_after(previous: InningsTotals, ball: &Ball, legal_balls: u32) -> InningsTotals {
    InningsTotals {
        score: previous.score.saturating_add(ball.total_runs()),
        wickets: previous.wickets + u32::from(ball.is_wicket),
        overs: Overs::from_legal_balls(legal_balls),
    }
}

/// Recompute totals from scratch from every ball of the innings.
pub fn recompute_innings_totals(scorecard: &Scorecard, innings_id: Uuid) -> InningsTotals {
    scorecard
        .balls_for_innings(innings_id)
        .fold(InningsTotals::default(), |totals, ball| InningsTotals {
            score: totals.score.saturating_add(ball.total_runs()),
            wickets: totals.wickets + u32::from(ball.is_wicket),
            overs: Overs::from_legal_balls(totals.overs.legal_balls() + u32::from(ball.is_legal())),
        })
}

/// Write the totals of `innings_id` after `ball` was appended to the draft.
pub fn aggregate_innings(
    draft: &mut Draft,
    innings_id: Uuid,
    ball: &Ball,
) -> Result<InningsTotals, LogError> {
    let scorecard = draft.scorecard();
    let previous = scorecard
        .innings_by_id(innings_id)
        .map(InningsTotals::from)
        .ok_or(LogError::UnknownInnings(innings_id))?;
    let legal_balls = scorecard.count_legal_balls(innings_id, None);

    let totals = totals_after(previous, ball, legal_balls);
    draft.upsert_innings_totals(innings_id, totals.score, totals.wickets, totals.overs)?;
    Ok(totals)
}
