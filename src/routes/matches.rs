use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        delivery::SubmitDeliveryRequest,
        matches::{CreateMatchRequest, MatchSummary, TossRequest},
        snapshot::MatchSnapshot,
    },
    error::AppError,
    services::{match_service, scoring_service},
    state::SharedState,
};

/// Match lifecycle and scoring endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/toss", post(record_toss))
        .route("/matches/{id}/deliveries", post(submit_delivery))
        .route("/matches/{id}/innings/second", post(start_second_innings))
}

/// Schedule a match between two seeded teams.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created and waiting for the toss", body = MatchSnapshot),
        (status = 400, description = "Invalid limits, schedule or teams"),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchSnapshot>), AppError> {
    payload.validate()?;
    let snapshot = match_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// List every match, oldest first.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses((status = 200, description = "Known matches", body = [MatchSummary]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    Ok(Json(match_service::list_matches(&state).await?))
}

/// Committed state of a match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match snapshot", body = MatchSnapshot),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::get_snapshot(&state, id).await?))
}

/// Record the toss and open play.
#[utoipa::path(
    post,
    path = "/matches/{id}/toss",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = TossRequest,
    responses(
        (status = 200, description = "Toss recorded; match is ongoing", body = MatchSnapshot),
        (status = 400, description = "Toss already recorded or winner not playing"),
        (status = 409, description = "Match busy; retry")
    )
)]
pub async fn record_toss(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TossRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::record_toss(&state, id, payload).await?))
}

/// Record one ball.
#[utoipa::path(
    post,
    path = "/matches/{id}/deliveries",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = SubmitDeliveryRequest,
    responses(
        (status = 200, description = "Delivery recorded, or already recorded under the same delivery_id", body = MatchSnapshot),
        (status = 400, description = "Malformed delivery or match not in progress"),
        (status = 404, description = "Unknown match or innings"),
        (status = 409, description = "Match busy; retry"),
        (status = 503, description = "Storage unavailable or transaction timed out; retry")
    )
)]
pub async fn submit_delivery(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitDeliveryRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        scoring_service::submit_delivery(&state, id, payload).await?,
    ))
}

/// Open the chase after the innings break.
#[utoipa::path(
    post,
    path = "/matches/{id}/innings/second",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Second innings opened", body = MatchSnapshot),
        (status = 400, description = "No closed first innings to follow")
    )
)]
pub async fn start_second_innings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(
        match_service::start_second_innings(&state, id).await?,
    ))
}
