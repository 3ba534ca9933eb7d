use uuid::Uuid;

use crate::{dto::player::CareerSummary, error::ServiceError, state::SharedState};

/// Career figures of a player summed over every match they appeared in.
pub async fn career(state: &SharedState, user_id: Uuid) -> Result<CareerSummary, ServiceError> {
    let store = state.require_score_store().await?;
    let profile = store
        .find_profile(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player profile `{user_id}`")))?;
    let rows = store.player_stats_for(user_id).await?;
    Ok(CareerSummary::build(&profile, &rows))
}
