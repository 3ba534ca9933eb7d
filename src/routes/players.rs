use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::player::CareerSummary, error::AppError, services::player_service, state::SharedState,
};

/// Player statistics endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/players/{id}/career", get(career))
}

/// Career figures of a player across every match.
#[utoipa::path(
    get,
    path = "/players/{id}/career",
    tag = "players",
    params(("id" = Uuid, Path, description = "User identifier of the player")),
    responses(
        (status = 200, description = "Career figures", body = CareerSummary),
        (status = 404, description = "Player never appeared in a delivery")
    )
)]
pub async fn career(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CareerSummary>, AppError> {
    Ok(Json(player_service::career(&state, id).await?))
}
