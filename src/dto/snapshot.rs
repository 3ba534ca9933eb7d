use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::TeamEntity,
    dto::{format_system_time, matches::MatchSummary},
    scoring::{
        log::Scorecard,
        model::{Ball, ExtraType, Innings, OverSegment, PlayerStat, WicketType},
        progression::{Margin, MatchResult, decide_result},
    },
};

/// Full state of a match: header, both rosters, every innings with its segments and balls, and
/// the match-scoped player figures.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSnapshot {
    #[serde(rename = "match")]
    pub match_info: MatchSummary,
    /// Storage version the snapshot was read at.
    pub version: u64,
    pub home_team: TeamRoster,
    pub away_team: TeamRoster,
    pub innings: Vec<InningsSnapshot>,
    pub player_stats: Vec<PlayerStatSummary>,
    /// Present once the match is completed.
    pub result: Option<MatchResultSummary>,
}

impl MatchSnapshot {
    /// Project a committed scorecard together with the two teams it references.
    pub fn build(scorecard: &Scorecard, home: &TeamEntity, away: &TeamEntity) -> Self {
        Self {
            match_info: MatchSummary::from(&scorecard.info),
            version: scorecard.version,
            home_team: home.into(),
            away_team: away.into(),
            innings: scorecard
                .innings()
                .iter()
                .map(|innings| InningsSnapshot::build(scorecard, innings))
                .collect(),
            player_stats: scorecard.player_stats().map(Into::into).collect(),
            result: decide_result(&scorecard.info, scorecard.innings()).map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Team with its roster.
pub struct TeamRoster {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterPlayer {
    pub id: Uuid,
    pub name: String,
}

impl From<&TeamEntity> for TeamRoster {
    fn from(team: &TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            players: team
                .players
                .iter()
                .map(|player| RosterPlayer {
                    id: player.id,
                    name: player.name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InningsSnapshot {
    pub id: Uuid,
    pub number: u8,
    pub batting_team_id: Uuid,
    pub bowling_team_id: Uuid,
    pub score: u32,
    pub wickets: u32,
    /// Over notation as a number, e.g. `2.4`.
    pub overs: f64,
    /// Over notation as text, e.g. `"2.4"`.
    pub overs_display: String,
    /// Over segments ordered by over number, then by when the bowler came on.
    pub segments: Vec<SegmentSnapshot>,
}

impl InningsSnapshot {
    fn build(scorecard: &Scorecard, innings: &Innings) -> Self {
        Self {
            id: innings.id,
            number: innings.number,
            batting_team_id: innings.batting_team_id,
            bowling_team_id: innings.bowling_team_id,
            score: innings.score,
            wickets: innings.wickets,
            overs: innings.overs.as_decimal(),
            overs_display: innings.overs.to_string(),
            segments: scorecard
                .segments_for_innings(innings.id)
                .map(|segment| SegmentSnapshot::build(scorecard, segment))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Contiguous run of balls by one bowler within an over.
pub struct SegmentSnapshot {
    pub id: u32,
    pub over_number: u32,
    pub bowler_id: Uuid,
    pub balls: Vec<BallSnapshot>,
}

impl SegmentSnapshot {
    fn build(scorecard: &Scorecard, segment: &OverSegment) -> Self {
        Self {
            id: segment.id.0,
            over_number: segment.over_number,
            bowler_id: segment.bowler_id,
            balls: scorecard
                .balls_in_segment(segment.id)
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BallSnapshot {
    pub ball_number: u32,
    pub batsman_id: Uuid,
    pub runs_scored: u8,
    pub is_wicket: bool,
    pub wicket_type: Option<WicketType>,
    pub extra_type: Option<ExtraType>,
    pub extra_runs: u32,
    pub total_runs: u32,
    pub is_legal: bool,
    pub delivery_id: Option<Uuid>,
    pub recorded_at: String,
}

impl From<&Ball> for BallSnapshot {
    fn from(ball: &Ball) -> Self {
        Self {
            ball_number: ball.ball_number,
            batsman_id: ball.batsman_id,
            runs_scored: ball.runs_scored,
            is_wicket: ball.is_wicket,
            wicket_type: ball.wicket_type,
            extra_type: ball.extra_type,
            extra_runs: ball.extra_runs,
            total_runs: ball.total_runs(),
            is_legal: ball.is_legal(),
            delivery_id: ball.delivery_id,
            recorded_at: format_system_time(ball.recorded_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Match-scoped batting and bowling figures of one player.
pub struct PlayerStatSummary {
    pub profile_id: Uuid,
    pub runs: u32,
    pub balls_faced: u32,
    pub is_out: bool,
    pub wickets: u32,
    pub overs_bowled: f64,
    pub overs_bowled_display: String,
    pub runs_conceded: u32,
}

impl From<&PlayerStat> for PlayerStatSummary {
    fn from(stat: &PlayerStat) -> Self {
        Self {
            profile_id: stat.profile_id,
            runs: stat.runs,
            balls_faced: stat.balls_faced,
            is_out: stat.is_out,
            wickets: stat.wickets,
            overs_bowled: stat.overs_bowled.as_decimal(),
            overs_bowled_display: stat.overs_bowled.to_string(),
            runs_conceded: stat.runs_conceded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultOutcome {
    Won,
    Tie,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Derived result of a completed match.
pub struct MatchResultSummary {
    pub outcome: ResultOutcome,
    pub winner_team_id: Option<Uuid>,
    pub margin_runs: Option<u32>,
    pub margin_wickets: Option<u32>,
    pub description: String,
}

impl From<MatchResult> for MatchResultSummary {
    fn from(result: MatchResult) -> Self {
        let description = result.to_string();
        match result {
            MatchResult::Won {
                winner_team_id,
                margin,
            } => Self {
                outcome: ResultOutcome::Won,
                winner_team_id: Some(winner_team_id),
                margin_runs: match margin {
                    Margin::Runs(runs) => Some(runs),
                    Margin::Wickets(_) => None,
                },
                margin_wickets: match margin {
                    Margin::Wickets(wickets) => Some(wickets),
                    Margin::Runs(_) => None,
                },
                description,
            },
            MatchResult::Tie => Self {
                outcome: ResultOutcome::Tie,
                winner_team_id: None,
                margin_runs: None,
                margin_wickets: None,
                description,
            },
        }
    }
}
