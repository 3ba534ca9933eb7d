use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        snapshot::{MatchResultSummary, MatchSnapshot},
        sse::{MatchStatusEvent, ScoreUpdatedEvent, ServerEvent, SystemStatus},
    },
    scoring::model::MatchStatus,
    state::SharedState,
};

const EVENT_SCORE_UPDATED: &str = "score.updated";
const EVENT_MATCH_STATUS_CHANGED: &str = "match.status_changed";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Broadcast the committed snapshot of a match after a delivery.
pub fn broadcast_score_updated(state: &SharedState, snapshot: &MatchSnapshot) {
    let payload = ScoreUpdatedEvent {
        match_id: snapshot.match_info.id,
        snapshot: snapshot.clone(),
    };
    send_public_event(state, EVENT_SCORE_UPDATED, &payload);
}

/// Broadcast a match status change, including the result once the match is completed.
pub fn broadcast_status_changed(
    state: &SharedState,
    match_id: Uuid,
    status: MatchStatus,
    result: Option<MatchResultSummary>,
) {
    let payload = MatchStatusEvent {
        match_id,
        status,
        result,
    };
    send_public_event(state, EVENT_MATCH_STATUS_CHANGED, &payload);
}

/// Broadcast whether the backend is running in degraded mode.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
