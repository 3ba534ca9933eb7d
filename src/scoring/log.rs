//! Arena-indexed delivery log for one match and the journal of writes applied to it.
//!
//! A [`Scorecard`] is the whole persisted state of a match: its header, innings, over segments,
//! balls and match-scoped player figures. Segments and balls live in append-only vectors whose
//! positions are their identifiers. Two indexes are rebuilt on load and maintained on every
//! append so positional questions ("which segment is current", "how many legal balls in over
//! 3") never need a full scan of the match.
//!
//! Every mutation goes through [`ScoreChange`]. A [`Draft`] applies changes to a working copy and
//! journals them; stores replay the same journal when committing, so the committed scorecard is
//! exactly the draft the scoring logic saw.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::scoring::model::{
    Ball, BallId, Innings, MatchInfo, MatchStatus, OverSegment, Overs, PlayerStat, SegmentId, Toss,
};

/// Failure raised when a change does not fit the current log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The referenced innings does not belong to this match.
    #[error("innings `{0}` is not part of this match")]
    UnknownInnings(Uuid),
    /// The referenced segment does not exist.
    #[error("over segment {0:?} does not exist")]
    UnknownSegment(SegmentId),
    /// An arena identifier does not match the next free slot.
    #[error("expected next {kind} id {expected}, got {actual}")]
    OutOfOrder {
        /// Arena that rejected the append.
        kind: &'static str,
        /// Next free position.
        expected: u32,
        /// Position carried by the change.
        actual: u32,
    },
    /// A ball number would leave a gap or duplicate inside a segment.
    #[error("segment {segment:?} expects ball {expected}, got {actual}")]
    BallNumberGap {
        /// Segment receiving the ball.
        segment: SegmentId,
        /// Next dense ball number.
        expected: u32,
        /// Ball number carried by the change.
        actual: u32,
    },
}

/// Single write against a match scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScoreChange {
    /// Store the toss result.
    RecordToss(Toss),
    /// Open a new innings.
    CreateInnings(Innings),
    /// Open a new over segment.
    CreateSegment(OverSegment),
    /// Append a ball to an existing segment.
    AppendBall(Ball),
    /// Replace the derived totals of an innings.
    UpsertInningsTotals {
        /// Innings being updated.
        innings_id: Uuid,
        /// Total runs.
        score: u32,
        /// Wickets fallen.
        wickets: u32,
        /// Legal balls bowled.
        overs: Overs,
    },
    /// Make sure a player profile exists for this user.
    EnsureProfile {
        /// User the profile belongs to.
        user_id: Uuid,
    },
    /// Replace the match-scoped figures of a player.
    UpsertPlayerStat(PlayerStat),
    /// Move the match to a new status.
    SetMatchStatus {
        /// Status after the change.
        status: MatchStatus,
    },
}

/// Persisted state of a match: header, delivery log and derived aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScorecardRecord", into = "ScorecardRecord")]
pub struct Scorecard {
    /// Match header, including status.
    pub info: MatchInfo,
    /// Optimistic concurrency version, bumped on every commit.
    pub version: u64,
    innings: Vec<Innings>,
    segments: Vec<OverSegment>,
    balls: Vec<Ball>,
    player_stats: IndexMap<Uuid, PlayerStat>,
    overs_index: HashMap<Uuid, BTreeMap<u32, Vec<SegmentId>>>,
    segment_balls: Vec<Vec<BallId>>,
}

/// Flat serialized form of a [`Scorecard`] without the in-memory indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScorecardRecord {
    info: MatchInfo,
    version: u64,
    innings: Vec<Innings>,
    segments: Vec<OverSegment>,
    balls: Vec<Ball>,
    player_stats: Vec<PlayerStat>,
}

impl From<ScorecardRecord> for Scorecard {
    fn from(record: ScorecardRecord) -> Self {
        let mut scorecard = Scorecard::new(record.info);
        scorecard.version = record.version;
        scorecard.innings = record.innings;
        for segment in record.segments {
            scorecard.index_segment(&segment);
            scorecard.segments.push(segment);
        }
        for ball in record.balls {
            if let Some(slot) = scorecard.segment_balls.get_mut(ball.segment_id.0 as usize) {
                slot.push(ball.id);
            }
            scorecard.balls.push(ball);
        }
        scorecard.player_stats = record
            .player_stats
            .into_iter()
            .map(|stat| (stat.profile_id, stat))
            .collect();
        scorecard
    }
}

impl From<Scorecard> for ScorecardRecord {
    fn from(scorecard: Scorecard) -> Self {
        Self {
            info: scorecard.info,
            version: scorecard.version,
            innings: scorecard.innings,
            segments: scorecard.segments,
            balls: scorecard.balls,
            player_stats: scorecard.player_stats.into_values().collect(),
        }
    }
}

impl Scorecard {
    /// Empty scorecard for a freshly created match.
    pub fn new(info: MatchInfo) -> Self {
        Self {
            info,
            version: 0,
            innings: Vec::new(),
            segments: Vec::new(),
            balls: Vec::new(),
            player_stats: IndexMap::new(),
            overs_index: HashMap::new(),
            segment_balls: Vec::new(),
        }
    }

    /// Identifier of the match.
    pub fn match_id(&self) -> Uuid {
        self.info.id
    }

    /// Innings in the order they were opened.
    pub fn innings(&self) -> &[Innings] {
        &self.innings
    }

    /// Look up an innings by id.
    pub fn innings_by_id(&self, innings_id: Uuid) -> Option<&Innings> {
        self.innings.iter().find(|innings| innings.id == innings_id)
    }

    /// Most recently opened innings.
    pub fn current_innings(&self) -> Option<&Innings> {
        self.innings.last()
    }

    /// Every segment in creation order.
    pub fn segments(&self) -> &[OverSegment] {
        &self.segments
    }

    /// Look up a segment by arena id.
    pub fn segment(&self, id: SegmentId) -> Option<&OverSegment> {
        self.segments.get(id.0 as usize)
    }

    /// Segments of an innings ordered by over number, then creation order.
    pub fn segments_for_innings(&self, innings_id: Uuid) -> impl Iterator<Item = &OverSegment> {
        self.overs_index
            .get(&innings_id)
            .into_iter()
            .flat_map(|overs| overs.values().flatten())
            .filter_map(move |id| self.segment(*id))
    }

    /// Every ball in recording order.
    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Balls of a segment in ball-number order.
    pub fn balls_in_segment(&self, segment_id: SegmentId) -> impl Iterator<Item = &Ball> {
        self.segment_balls
            .get(segment_id.0 as usize)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.balls.get(id.0 as usize))
    }

    /// Balls of an innings in the order they were bowled.
    pub fn balls_for_innings(&self, innings_id: Uuid) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(move |ball| {
            self.segment(ball.segment_id)
                .is_some_and(|segment| segment.innings_id == innings_id)
        })
    }

    /// Match-scoped player figures in first-involvement order.
    pub fn player_stats(&self) -> impl Iterator<Item = &PlayerStat> {
        self.player_stats.values()
    }

    /// Figures of one player, if they have been involved.
    pub fn player_stat(&self, profile_id: Uuid) -> Option<&PlayerStat> {
        self.player_stats.get(&profile_id)
    }

    /// Find a ball previously submitted with the given idempotency token.
    pub fn find_ball_by_delivery_id(&self, delivery_id: Uuid) -> Option<&Ball> {
        self.balls
            .iter()
            .find(|ball| ball.delivery_id == Some(delivery_id))
    }

    /// Last recorded ball of an innings, ordered by over number, segment creation order and
    /// ball number, all descending.
    pub fn find_last_ball(&self, innings_id: Uuid) -> Option<&Ball> {
        let overs = self.overs_index.get(&innings_id)?;
        overs
            .values()
            .rev()
            .flat_map(|segments| segments.iter().rev())
            .find_map(|segment_id| {
                self.segment_balls
                    .get(segment_id.0 as usize)
                    .and_then(|balls| balls.last())
                    .and_then(|id| self.balls.get(id.0 as usize))
            })
    }

    /// Legal balls recorded in an innings, optionally restricted to one over number across all of
    /// its segments.
    pub fn count_legal_balls(&self, innings_id: Uuid, over_number: Option<u32>) -> u32 {
        let Some(overs) = self.overs_index.get(&innings_id) else {
            return 0;
        };
        match over_number {
            Some(number) => overs
                .get(&number)
                .map_or(0, |segments| self.count_legal_balls_in_segments(segments)),
            None => overs
                .values()
                .map(|segments| self.count_legal_balls_in_segments(segments))
                .sum(),
        }
    }

    /// Number of balls (legal or not) already appended to a segment.
    pub fn count_balls_in_segment(&self, segment_id: SegmentId) -> u32 {
        self.segment_balls
            .get(segment_id.0 as usize)
            .map_or(0, |balls| balls.len() as u32)
    }

    /// Legal balls delivered by a bowler across every segment of the match.
    pub fn count_legal_balls_by_bowler(&self, bowler_id: Uuid) -> u32 {
        self.segments
            .iter()
            .filter(|segment| segment.bowler_id == bowler_id)
            .map(|segment| self.count_legal_balls_in_segment(segment.id))
            .sum()
    }

    /// Bowler of the segment a ball belongs to.
    pub fn bowler_of(&self, ball: &Ball) -> Option<Uuid> {
        self.segment(ball.segment_id).map(|segment| segment.bowler_id)
    }

    fn count_legal_balls_in_segments(&self, segments: &[SegmentId]) -> u32 {
        segments
            .iter()
            .map(|segment_id| self.count_legal_balls_in_segment(*segment_id))
            .sum()
    }

    fn count_legal_balls_in_segment(&self, segment_id: SegmentId) -> u32 {
        self.balls_in_segment(segment_id)
            .filter(|ball| ball.is_legal())
            .count() as u32
    }

    fn index_segment(&mut self, segment: &OverSegment) {
        self.overs_index
            .entry(segment.innings_id)
            .or_default()
            .entry(segment.over_number)
            .or_default()
            .push(segment.id);
        self.segment_balls.push(Vec::new());
    }

    /// Apply one change. Stores call this while committing a journal.
    pub fn replay(&mut self, change: &ScoreChange) -> Result<(), LogError> {
        match change {
            ScoreChange::RecordToss(toss) => {
                self.info.toss = Some(*toss);
            }
            ScoreChange::CreateInnings(innings) => {
                self.innings.push(innings.clone());
            }
            ScoreChange::CreateSegment(segment) => {
                if self.innings_by_id(segment.innings_id).is_none() {
                    return Err(LogError::UnknownInnings(segment.innings_id));
                }
                let expected = self.segments.len() as u32;
                if segment.id.0 != expected {
                    return Err(LogError::OutOfOrder {
                        kind: "segment",
                        expected,
                        actual: segment.id.0,
                    });
                }
                self.index_segment(segment);
                self.segments.push(segment.clone());
            }
            ScoreChange::AppendBall(ball) => {
                let expected = self.balls.len() as u32;
                if ball.id.0 != expected {
                    return Err(LogError::OutOfOrder {
                        kind: "ball",
                        expected,
                        actual: ball.id.0,
                    });
                }
                let next_number = self.count_balls_in_segment(ball.segment_id) + 1;
                let slot = self
                    .segment_balls
                    .get_mut(ball.segment_id.0 as usize)
                    .ok_or(LogError::UnknownSegment(ball.segment_id))?;
                if ball.ball_number != next_number {
                    return Err(LogError::BallNumberGap {
                        segment: ball.segment_id,
                        expected: next_number,
                        actual: ball.ball_number,
                    });
                }
                slot.push(ball.id);
                self.balls.push(ball.clone());
            }
            ScoreChange::UpsertInningsTotals {
                innings_id,
                score,
                wickets,
                overs,
            } => {
                let innings = self
                    .innings
                    .iter_mut()
                    .find(|innings| innings.id == *innings_id)
                    .ok_or(LogError::UnknownInnings(*innings_id))?;
                innings.score = *score;
                innings.wickets = *wickets;
                innings.overs = *overs;
            }
            ScoreChange::EnsureProfile { .. } => {}
            ScoreChange::UpsertPlayerStat(stat) => {
                self.player_stats.insert(stat.profile_id, stat.clone());
            }
            ScoreChange::SetMatchStatus { status } => {
                self.info.status = *status;
            }
        }
        Ok(())
    }
}

/// Unit of work over a scorecard: a working copy plus the journal of changes applied to it.
#[derive(Debug, Clone)]
pub struct Draft {
    base_version: u64,
    scorecard: Scorecard,
    changes: Vec<ScoreChange>,
}

impl Draft {
    /// Start a unit of work from the committed scorecard.
    pub fn begin(scorecard: &Scorecard) -> Self {
        Self {
            base_version: scorecard.version,
            scorecard: scorecard.clone(),
            changes: Vec::new(),
        }
    }

    /// Working copy including every change recorded so far.
    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    /// Version the draft was started from.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Journal recorded so far.
    pub fn changes(&self) -> &[ScoreChange] {
        &self.changes
    }

    /// Split the draft into its journal and the resulting scorecard, stamped with the version it
    /// will carry once committed.
    pub fn finish(self) -> (Vec<ScoreChange>, Scorecard) {
        let mut scorecard = self.scorecard;
        scorecard.version = self.base_version + 1;
        (self.changes, scorecard)
    }

    /// Apply a change to the working copy and journal it.
    pub fn record(&mut self, change: ScoreChange) -> Result<(), LogError> {
        self.scorecard.replay(&change)?;
        self.changes.push(change);
        Ok(())
    }

    /// Open an innings.
    pub fn create_innings(&mut self, innings: Innings) -> Result<Uuid, LogError> {
        let id = innings.id;
        self.record(ScoreChange::CreateInnings(innings))?;
        Ok(id)
    }

    /// Open a segment under `over_number` for `bowler_id`.
    pub fn create_segment(
        &mut self,
        innings_id: Uuid,
        over_number: u32,
        bowler_id: Uuid,
    ) -> Result<SegmentId, LogError> {
        let id = SegmentId(self.scorecard.segments.len() as u32);
        self.record(ScoreChange::CreateSegment(OverSegment {
            id,
            innings_id,
            over_number,
            bowler_id,
        }))?;
        Ok(id)
    }

    /// Append a ball; its arena id is assigned here.
    pub fn append_ball(&mut self, mut ball: Ball) -> Result<BallId, LogError> {
        let id = BallId(self.scorecard.balls.len() as u32);
        ball.id = id;
        self.record(ScoreChange::AppendBall(ball))?;
        Ok(id)
    }

    /// Replace an innings' derived totals.
    pub fn upsert_innings_totals(
        &mut self,
        innings_id: Uuid,
        score: u32,
        wickets: u32,
        overs: Overs,
    ) -> Result<(), LogError> {
        self.record(ScoreChange::UpsertInningsTotals {
            innings_id,
            score,
            wickets,
            overs,
        })
    }

    /// Replace a player's match-scoped figures, creating the profile lazily on first involvement.
    pub fn upsert_player_stat(&mut self, stat: PlayerStat) -> Result<(), LogError> {
        if self.scorecard.player_stat(stat.profile_id).is_none() {
            self.record(ScoreChange::EnsureProfile {
                user_id: stat.profile_id,
            })?;
        }
        self.record(ScoreChange::UpsertPlayerStat(stat))
    }

    /// Move the match to a new status.
    pub fn set_match_status(&mut self, status: MatchStatus) -> Result<(), LogError> {
        self.record(ScoreChange::SetMatchStatus { status })
    }
}
