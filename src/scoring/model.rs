//! Domain types shared by the scoring state machine and the persistence layer.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Legal deliveries that make up a complete over.
pub const BALLS_PER_OVER: u32 = 6;

/// Highest number of runs a batsman can score off a single delivery.
pub const MAX_RUNS_PER_BALL: u8 = 6;

/// Largest number of extra runs a single delivery may award.
pub const MAX_EXTRA_RUNS: u32 = 7;

/// Maximum number of innings a match may record.
pub const MAX_INNINGS: usize = 2;

/// Lifecycle of a match, mutated only by the progression state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Match created, waiting for the toss result.
    Toss,
    /// An innings is in progress and deliveries are accepted.
    Ongoing,
    /// First innings closed; waiting for the second innings to start.
    InningsBreak,
    /// Terminal state; the scorecard is frozen.
    Completed,
}

/// Choice made by the toss winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ElectedTo {
    /// Toss winner bats first.
    Bat,
    /// Toss winner bowls first.
    Field,
}

/// Outcome of the toss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    /// Team that won the toss.
    pub winner_id: Uuid,
    /// What the toss winner elected to do.
    pub elected_to: ElectedTo,
}

/// Limits configured for a limited-overs match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MatchRules {
    /// Number of overs per innings (at least one).
    pub overs_limit: u32,
    /// Wickets that close an innings (1..=10).
    pub wickets_limit: u32,
}

/// Type of extra awarded on a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtraType {
    /// Ball too wide to hit; not a legal delivery.
    Wide,
    /// Overstepped or otherwise illegal ball; not a legal delivery.
    NoBall,
    /// Runs taken without the bat touching the ball.
    Bye,
    /// Runs taken off the batsman's body.
    LegBye,
}

impl ExtraType {
    /// Whether a delivery carrying this extra counts towards the over.
    pub fn is_legal(self) -> bool {
        !matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }

    /// Whether the extra runs are charged to the bowler's conceded tally.
    pub fn charged_to_bowler(self) -> bool {
        matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }
}

/// How a batsman was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WicketType {
    /// Stumps broken by the bowler.
    Bowled,
    /// Ball caught before bouncing.
    Caught,
    /// Batsman short of the crease while running.
    RunOut,
    /// Batsman broke their own wicket.
    HitWicket,
    /// Batsman left the field injured.
    RetiredHurt,
    /// Stumped by the wicket keeper.
    Stumped,
    /// Leg before wicket.
    Lbw,
}

impl WicketType {
    /// Whether this dismissal adds to the bowler's wicket tally.
    pub fn credited_to_bowler(self) -> bool {
        !matches!(
            self,
            WicketType::RunOut | WicketType::HitWicket | WicketType::RetiredHurt
        )
    }
}

/// Cricket over notation backed by the number of legal balls.
///
/// The integer part is the number of completed overs and the tenths are the legal balls bowled
/// into the current over, so 16 legal balls read as `2.4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overs {
    legal_balls: u32,
}

impl Overs {
    /// Build the notation from a legal ball count.
    pub fn from_legal_balls(legal_balls: u32) -> Self {
        Self { legal_balls }
    }

    /// Total legal balls represented.
    pub fn legal_balls(self) -> u32 {
        self.legal_balls
    }

    /// Completed overs (integer part).
    pub fn completed_overs(self) -> u32 {
        self.legal_balls / BALLS_PER_OVER
    }

    /// Legal balls into the current over (the tenths, 0..=5).
    pub fn balls_into_over(self) -> u32 {
        self.legal_balls % BALLS_PER_OVER
    }

    /// Decimal rendering used on the wire, e.g. `2.4`.
    pub fn as_decimal(self) -> f64 {
        f64::from(self.completed_overs()) + f64::from(self.balls_into_over()) / 10.0
    }

    /// Whether an innings limit of `overs_limit` overs has been reached.
    pub fn reached(self, overs_limit: u32) -> bool {
        self.completed_overs() >= overs_limit
    }
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.completed_overs(), self.balls_into_over())
    }
}

/// Static description of a match plus its progression status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Primary key of the match.
    pub id: Uuid,
    /// Ground where the match is played.
    pub venue: String,
    /// Scheduled start time.
    pub scheduled_at: SystemTime,
    /// Team listed as home side.
    pub home_team_id: Uuid,
    /// Team listed as away side.
    pub away_team_id: Uuid,
    /// Toss result, once recorded.
    pub toss: Option<Toss>,
    /// Overs and wickets limits.
    pub rules: MatchRules,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Official in charge of scoring, if assigned.
    pub umpire_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl MatchInfo {
    /// Team batting first according to the toss, defaulting to the home side before the toss.
    pub fn first_batting_team(&self) -> Uuid {
        match self.toss {
            Some(Toss {
                winner_id,
                elected_to: ElectedTo::Bat,
            }) => winner_id,
            Some(Toss {
                winner_id,
                elected_to: ElectedTo::Field,
            }) => self.opponent_of(winner_id),
            None => self.home_team_id,
        }
    }

    /// The other side of the fixture.
    pub fn opponent_of(&self, team_id: Uuid) -> Uuid {
        if team_id == self.home_team_id {
            self.away_team_id
        } else {
            self.home_team_id
        }
    }
}

/// One team's batting turn with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Innings {
    /// Identifier of the innings.
    pub id: Uuid,
    /// 1 for the first innings, 2 for the chase.
    pub number: u8,
    /// Team at the crease.
    pub batting_team_id: Uuid,
    /// Team in the field.
    pub bowling_team_id: Uuid,
    /// Total runs including extras.
    pub score: u32,
    /// Wickets fallen.
    pub wickets: u32,
    /// Legal balls bowled, in over notation.
    pub overs: Overs,
}

impl Innings {
    /// Open a fresh innings with zeroed totals.
    pub fn open(number: u8, batting_team_id: Uuid, bowling_team_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            batting_team_id,
            bowling_team_id,
            score: 0,
            wickets: 0,
            overs: Overs::default(),
        }
    }
}

/// Arena index of an over segment inside a scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

/// Arena index of a ball inside a scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallId(pub u32);

/// Portion of an over bowled by a single bowler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverSegment {
    /// Arena position; also the creation order within the match.
    pub id: SegmentId,
    /// Innings the segment belongs to.
    pub innings_id: Uuid,
    /// 1-based over number, shared by every segment of the same over.
    pub over_number: u32,
    /// Bowler of every ball in this segment.
    pub bowler_id: Uuid,
}

/// A recorded delivery. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    /// Arena position.
    pub id: BallId,
    /// Segment the ball was appended to.
    pub segment_id: SegmentId,
    /// 1-based, gapless position inside the segment.
    pub ball_number: u32,
    /// Batsman on strike.
    pub batsman_id: Uuid,
    /// Runs off the bat (0..=6).
    pub runs_scored: u8,
    /// Whether a wicket fell.
    pub is_wicket: bool,
    /// Dismissal kind, when a wicket fell.
    pub wicket_type: Option<WicketType>,
    /// Extra kind, if any.
    pub extra_type: Option<ExtraType>,
    /// Runs awarded as extras.
    pub extra_runs: u32,
    /// Client supplied idempotency token.
    pub delivery_id: Option<Uuid>,
    /// When the ball was recorded.
    pub recorded_at: SystemTime,
}

impl Ball {
    /// Whether the ball counts towards the over.
    pub fn is_legal(&self) -> bool {
        self.extra_type.is_none_or(ExtraType::is_legal)
    }

    /// Runs added to the innings total.
    pub fn total_runs(&self) -> u32 {
        u32::from(self.runs_scored).saturating_add(self.extra_runs)
    }

    /// Runs charged against the bowler.
    pub fn runs_conceded(&self) -> u32 {
        match self.extra_type {
            Some(extra) if extra.charged_to_bowler() => self.total_runs(),
            Some(_) => 0,
            None => u32::from(self.runs_scored),
        }
    }

    /// Whether the wicket (if any) is credited to the bowler.
    pub fn bowler_wicket(&self) -> bool {
        self.is_wicket && self.wicket_type.is_none_or(WicketType::credited_to_bowler)
    }

    /// Whether the batsman is charged with a ball faced.
    pub fn faced_by_batsman(&self) -> bool {
        self.extra_type != Some(ExtraType::Wide)
    }
}

/// Match-scoped figures for one player profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStat {
    /// Profile (user) the figures belong to.
    pub profile_id: Uuid,
    /// Runs off the bat.
    pub runs: u32,
    /// Balls faced, wides excluded.
    pub balls_faced: u32,
    /// Whether the player was dismissed in this match.
    pub is_out: bool,
    /// Wickets credited as a bowler.
    pub wickets: u32,
    /// Legal balls bowled across every segment of the match.
    pub overs_bowled: Overs,
    /// Runs charged as a bowler.
    pub runs_conceded: u32,
}

impl PlayerStat {
    /// Zeroed figures for a profile seen for the first time in this match.
    pub fn new(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            ..Self::default()
        }
    }
}
