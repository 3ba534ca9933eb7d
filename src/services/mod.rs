/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match lifecycle: creation, toss, second innings and snapshot queries.
pub mod match_service;
/// Player career projection.
pub mod player_service;
/// Delivery submission through the per-match gate.
pub mod scoring_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
