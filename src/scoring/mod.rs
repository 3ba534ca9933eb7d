//! Pure scoring engine: domain model, delivery log and the transitions applied to it.

pub mod aggregate;
pub mod apply;
pub mod log;
pub mod model;
pub mod progression;
pub mod segmentation;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixtures;

use thiserror::Error;
use uuid::Uuid;

use crate::scoring::{log::LogError, model::MatchStatus, progression::InvalidTransition};

pub use apply::{Applied, DeliveryEvent, apply_delivery, record_toss, start_second_innings};

/// Rejections raised by the scoring engine before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The delivery payload is malformed.
    #[error("invalid delivery: {0}")]
    InvalidDelivery(String),
    /// The toss payload is malformed.
    #[error("invalid toss: {0}")]
    InvalidToss(String),
    /// Deliveries are only accepted while the match is ongoing.
    #[error("match is not in progress (status {0:?})")]
    MatchNotInProgress(MatchStatus),
    /// The innings hint does not belong to this match.
    #[error("innings `{0}` not found")]
    InningsNotFound(Uuid),
    /// The innings hint names an innings that is no longer being played.
    #[error("innings `{0}` is closed")]
    InningsClosed(Uuid),
    /// No further innings can be opened.
    #[error("innings limit reached")]
    InningsLimitReached,
    /// A second innings needs exactly one recorded innings.
    #[error("second innings requires exactly one recorded innings, found {0}")]
    SecondInningsUnavailable(usize),
    /// Status change not allowed from the current status.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The journal does not fit the log.
    #[error(transparent)]
    Log(#[from] LogError),
}
