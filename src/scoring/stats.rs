//! Match-scoped batting and bowling figures.
//!
//! The updater applies one ball at a time, but every figure must equal what
//! [`recompute_player_stats`] derives from the full log.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::scoring::{
    log::{Draft, LogError, Scorecard},
    model::{Ball, Overs, PlayerStat},
};

/// Batting effect of a ball on the striker's figures.
pub fn apply_batting(stat: &mut PlayerStat, ball: &Ball) {
    stat.runs = stat.runs.saturating_add(u32::from(ball.runs_scored));
    stat.balls_faced += u32::from(ball.faced_by_batsman());
    stat.is_out |= ball.is_wicket;
}

/// Bowling effect of a ball. `legal_balls_bowled` is the bowler's match-wide legal ball count
/// including this ball.
pub fn apply_bowling(stat: &mut PlayerStat, ball: &Ball, legal_balls_bowled: u32) {
    stat.runs_conceded = stat.runs_conceded.saturating_add(ball.runs_conceded());
    stat.wickets += u32::from(ball.bowler_wicket());
    stat.overs_bowled = Overs::from_legal_balls(legal_balls_bowled);
}

/// Apply an appended ball to both participants' figures in the draft.
pub fn update_player_stats(
    draft: &mut Draft,
    ball: &Ball,
    bowler_id: Uuid,
) -> Result<(), LogError> {
    let mut batting = current_stat(draft.scorecard(), ball.batsman_id);
    apply_batting(&mut batting, ball);
    draft.upsert_player_stat(batting)?;

    let legal_balls_bowled = draft.scorecard().count_legal_balls_by_bowler(bowler_id);
    let mut bowling = current_stat(draft.scorecard(), bowler_id);
    apply_bowling(&mut bowling, ball, legal_balls_bowled);
    draft.upsert_player_stat(bowling)
}

/// Derive every player's figures from scratch, in first-involvement order.
pub fn recompute_player_stats(scorecard: &Scorecard) -> IndexMap<Uuid, PlayerStat> {
    let mut stats: IndexMap<Uuid, PlayerStat> = IndexMap::new();
    let mut legal_by_bowler: IndexMap<Uuid, u32> = IndexMap::new();

    for ball in scorecard.balls() {
        let Some(bowler_id) = scorecard.bowler_of(ball) else {
            continue;
        };
        apply_batting(
            stats
                .entry(ball.batsman_id)
                .or_insert_with(|| PlayerStat::new(ball.batsman_id)),
            ball,
        );

        let legal = legal_by_bowler.entry(bowler_id).or_default();
        *legal += u32::from(ball.is_legal());
        apply_bowling(
            stats
                .entry(bowler_id)
                .or_insert_with(|| PlayerStat::new(bowler_id)),
            ball,
            *legal,
        );
    }

    stats
}

fn current_stat(scorecard: &Scorecard, profile_id: Uuid) -> PlayerStat {
    scorecard
        .player_stat(profile_id)
        .cloned()
        .unwrap_or_else(|| PlayerStat::new(profile_id))
}
