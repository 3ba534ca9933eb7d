use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Cricket Score Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::record_toss,
        crate::routes::matches::submit_delivery,
        crate::routes::matches::start_second_innings,
        crate::routes::players::career,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::TossRequest,
            crate::dto::matches::MatchSummary,
            crate::dto::delivery::SubmitDeliveryRequest,
            crate::dto::snapshot::MatchSnapshot,
            crate::dto::player::CareerSummary,
            crate::dto::sse::Handshake,
            crate::dto::sse::ScoreUpdatedEvent,
            crate::dto::sse::MatchStatusEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "matches", description = "Match lifecycle and ball-by-ball scoring"),
        (name = "players", description = "Player career figures"),
    )
)]
pub struct ApiDoc;
