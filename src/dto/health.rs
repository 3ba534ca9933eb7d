use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of matches with a scoring write in flight.
    pub active_matches: usize,
}

impl HealthResponse {
    /// Storage reachable; scoring requests are accepted.
    pub fn ok(active_matches: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_matches,
        }
    }

    /// No storage installed; scoring requests fail with 503.
    pub fn degraded(active_matches: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            active_matches,
        }
    }
}
