//! Over segmentation: decide which over segment the next delivery belongs to.
//!
//! Nothing here keeps a cursor. The current over, segment and ball number are re-derived from the
//! log every time, which is why the coordinator must serialize writers per match.

use tracing::debug;
use uuid::Uuid;

use crate::scoring::{
    log::{Draft, LogError, Scorecard},
    model::{BALLS_PER_OVER, SegmentId},
};

/// Why a new segment has to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenReason {
    /// The innings has no ball yet.
    FirstBall,
    /// A different bowler takes over mid-over; the over number is shared.
    BowlerChange,
    /// The previous over number already holds six legal balls.
    OverComplete,
}

/// Placement decision for the next delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Keep appending to the current segment.
    Continue {
        /// Segment receiving the ball.
        segment: SegmentId,
    },
    /// Open a new segment for the incoming bowler.
    Open {
        /// Over number of the new segment.
        over_number: u32,
        /// What triggered the new segment.
        reason: OpenReason,
    },
}

/// Where a ball lands once the placement has been carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Segment receiving the ball.
    pub segment: SegmentId,
    /// Over number of that segment.
    pub over_number: u32,
    /// Dense 1-based ball number inside the segment.
    pub ball_number: u32,
}

/// Decide the placement of the next delivery bowled by `bowler_id` in `innings_id`.
///
/// A completed over always opens the next over number, even for the same bowler: the engine does
/// not police consecutive overs.
pub fn place_delivery(scorecard: &Scorecard, innings_id: Uuid, bowler_id: Uuid) -> Placement {
    let Some(last_ball) = scorecard.find_last_ball(innings_id) else {
        return Placement::Open {
            over_number: 1,
            reason: OpenReason::FirstBall,
        };
    };
    let Some(last_segment) = scorecard.segment(last_ball.segment_id) else {
        return Placement::Open {
            over_number: 1,
            reason: OpenReason::FirstBall,
        };
    };

    let legal_in_over = scorecard.count_legal_balls(innings_id, Some(last_segment.over_number));
    if legal_in_over >= BALLS_PER_OVER {
        Placement::Open {
            over_number: last_segment.over_number + 1,
            reason: OpenReason::OverComplete,
        }
    } else if last_segment.bowler_id != bowler_id {
        Placement::Open {
            over_number: last_segment.over_number,
            reason: OpenReason::BowlerChange,
        }
    } else {
        Placement::Continue {
            segment: last_segment.id,
        }
    }
}

/// Carry out the placement against a draft, opening a segment when needed, and return the
/// position the next ball must take.
pub fn position_delivery(
    draft: &mut Draft,
    innings_id: Uuid,
    bowler_id: Uuid,
) -> Result<Position, LogError> {
    let (segment, over_number) = match place_delivery(draft.scorecard(), innings_id, bowler_id) {
        Placement::Continue { segment } => {
            let over_number = draft
                .scorecard()
                .segment(segment)
                .map(|segment| segment.over_number)
                .ok_or(LogError::UnknownSegment(segment))?;
            (segment, over_number)
        }
        Placement::Open {
            over_number,
            reason,
        } => {
            debug!(
                %innings_id,
                over_number,
                ?reason,
                %bowler_id,
                "opening over segment"
            );
            let segment = draft.create_segment(innings_id, over_number, bowler_id)?;
            (segment, over_number)
        }
    };

    Ok(Position {
        segment,
        over_number,
        ball_number: draft.scorecard().count_balls_in_segment(segment) + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        apply::apply_delivery,
        fixtures::{dot, extra, ongoing_scorecard},
        model::ExtraType,
    };

    fn bowl(scorecard: Scorecard, event: crate::scoring::apply::DeliveryEvent) -> Scorecard {
        apply_delivery(&scorecard, &event, std::time::SystemTime::UNIX_EPOCH)
            .unwrap()
            .into_scorecard()
    }

    #[test]
    fn first_ball_opens_over_one() {
        let scorecard = ongoing_scorecard(20, 10);
        let placement = place_delivery(&scorecard, Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            placement,
            Placement::Open {
                over_number: 1,
                reason: OpenReason::FirstBall
            }
        );
    }

    #[test]
    fn completed_over_opens_next_number_even_for_same_bowler() {
        let (batsman, x) = (Uuid::new_v4(), Uuid::new_v4());
        let mut scorecard = ongoing_scorecard(20, 10);
        for _ in 0..6 {
            scorecard = bowl(scorecard, dot(batsman, x));
        }
        let innings = scorecard.current_innings().unwrap().clone();
        assert_eq!(innings.overs.to_string(), "1.0");

        assert_eq!(
            place_delivery(&scorecard, innings.id, x),
            Placement::Open {
                over_number: 2,
                reason: OpenReason::OverComplete
            }
        );
        assert_eq!(
            place_delivery(&scorecard, innings.id, Uuid::new_v4()),
            Placement::Open {
                over_number: 2,
                reason: OpenReason::OverComplete
            }
        );

        let scorecard = bowl(scorecard, dot(batsman, x));
        assert_eq!(scorecard.segments().len(), 2);
        assert_eq!(scorecard.segments()[1].over_number, 2);
        assert_eq!(scorecard.balls().last().unwrap().ball_number, 1);
    }

    #[test]
    fn bowler_change_mid_over_splits_the_over() {
        let (batsman, x, y, z) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let mut scorecard = ongoing_scorecard(20, 10);
        for _ in 0..12 {
            scorecard = bowl(scorecard, dot(batsman, z));
        }
        scorecard = bowl(scorecard, dot(batsman, x));
        scorecard = bowl(scorecard, dot(batsman, x));
        for _ in 0..4 {
            scorecard = bowl(scorecard, dot(batsman, y));
        }

        let innings_id = scorecard.current_innings().unwrap().id;
        let over_three: Vec<_> = scorecard
            .segments_for_innings(innings_id)
            .filter(|segment| segment.over_number == 3)
            .cloned()
            .collect();
        assert_eq!(over_three.len(), 2);
        assert_eq!(over_three[0].bowler_id, x);
        assert_eq!(over_three[1].bowler_id, y);
        assert_eq!(scorecard.count_balls_in_segment(over_three[0].id), 2);
        let y_numbers: Vec<u32> = scorecard
            .balls_in_segment(over_three[1].id)
            .map(|ball| ball.ball_number)
            .collect();
        assert_eq!(y_numbers, vec![1, 2, 3, 4]);
        assert_eq!(scorecard.count_legal_balls(innings_id, Some(3)), 6);
        assert!(
            scorecard
                .balls_in_segment(over_three[0].id)
                .all(|ball| scorecard.bowler_of(ball) == Some(x))
        );

        assert_eq!(
            place_delivery(&scorecard, innings_id, y),
            Placement::Open {
                over_number: 4,
                reason: OpenReason::OverComplete
            }
        );
    }

    #[test]
    fn illegal_deliveries_do_not_close_the_over() {
        let (batsman, x) = (Uuid::new_v4(), Uuid::new_v4());
        let mut scorecard = ongoing_scorecard(20, 10);
        for _ in 0..5 {
            scorecard = bowl(scorecard, dot(batsman, x));
        }
        scorecard = bowl(scorecard, extra(batsman, x, ExtraType::Wide, 1));
        scorecard = bowl(scorecard, extra(batsman, x, ExtraType::NoBall, 1));

        let innings_id = scorecard.current_innings().unwrap().id;
        assert_eq!(
            place_delivery(&scorecard, innings_id, x),
            Placement::Continue {
                segment: SegmentId(0)
            }
        );
        scorecard = bowl(scorecard, dot(batsman, x));
        assert_eq!(scorecard.count_balls_in_segment(SegmentId(0)), 8);
        assert_eq!(scorecard.current_innings().unwrap().overs.to_string(), "1.0");
    }

    #[test]
    fn consecutive_changes_in_one_over_create_one_segment_each() {
        let batsman = Uuid::new_v4();
        let bowlers = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let mut scorecard = ongoing_scorecard(20, 10);
        for bowler in bowlers {
            scorecard = bowl(scorecard, dot(batsman, bowler));
        }
        assert_eq!(scorecard.segments().len(), 3);
        assert!(scorecard.segments().iter().all(|s| s.over_number == 1));
        assert!(scorecard.balls().iter().all(|b| b.ball_number == 1));
    }
}
