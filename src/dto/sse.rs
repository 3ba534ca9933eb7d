use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::snapshot::{MatchResultSummary, MatchSnapshot},
    scoring::model::MatchStatus,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every committed delivery.
pub struct ScoreUpdatedEvent {
    pub match_id: Uuid,
    pub snapshot: MatchSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the match status moves.
pub struct MatchStatusEvent {
    pub match_id: Uuid,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResultSummary>,
}
