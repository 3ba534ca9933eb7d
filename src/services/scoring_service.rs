use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::score_store::ScoreStore,
    dto::{delivery::SubmitDeliveryRequest, snapshot::MatchSnapshot},
    error::ServiceError,
    scoring::{Applied, DeliveryEvent, ScoringError, apply_delivery, log::Scorecard},
    services::{match_service::snapshot_of, sse_events},
    state::{MatchGuard, SharedState},
};

/// Scorecard committed by [`transact`], with the one it replaced.
///
/// The match gate stays held until this value is dropped, so events about the commit go out
/// before the next writer of the same match can commit.
pub(crate) struct Committed {
    pub scorecard: Scorecard,
    pub previous: Scorecard,
    pub applied: Applied,
    _gate: MatchGuard,
}

impl Committed {
    /// Whether the match status moved.
    pub fn status_changed(&self) -> bool {
        self.previous.info.status != self.scorecard.info.status
    }
}

/// Run one scoring transition of `match_id` under its gate: load the committed scorecard, apply
/// `operation` and commit the resulting journal in a single store call.
pub(crate) async fn transact<F>(
    state: &SharedState,
    match_id: Uuid,
    operation: F,
) -> Result<(Arc<dyn ScoreStore>, Committed), ServiceError>
where
    F: FnOnce(&Scorecard) -> Result<Applied, ScoringError> + Send,
{
    let store = state.require_score_store().await?;
    let gate = state.lock_match(match_id).await?;
    let (previous, scorecard, applied) = state
        .within_deadline(match_id, async {
            let previous = store
                .load_scorecard(match_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}`")))?;

            let applied = operation(&previous)?;
            if applied.is_noop() {
                let scorecard = previous.clone();
                return Ok::<_, ServiceError>((previous, scorecard, applied));
            }

            let scorecard = store
                .commit(match_id, previous.version, applied.changes().to_vec())
                .await?;
            debug!(%match_id, version = scorecard.version, "scorecard committed");
            Ok((previous, scorecard, applied))
        })
        .await?;

    Ok((
        store,
        Committed {
            scorecard,
            previous,
            applied,
            _gate: gate,
        },
    ))
}

/// Record one delivery and return the committed snapshot.
///
/// A resubmission carrying a `delivery_id` already present in the match returns the current
/// snapshot without recording anything.
pub async fn submit_delivery(
    state: &SharedState,
    match_id: Uuid,
    request: SubmitDeliveryRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let event: DeliveryEvent = request.into();
    let recorded_at = SystemTime::now();

    let (store, committed) = transact(state, match_id, |scorecard| {
        apply_delivery(scorecard, &event, recorded_at)
    })
    .await?;

    let snapshot = snapshot_of(&store, &committed.scorecard).await?;
    if committed.applied.is_noop() {
        info!(%match_id, delivery_id = ?event.delivery_id, "duplicate delivery ignored");
        return Ok(snapshot);
    }

    if let Some((_, position)) = committed.applied.ball() {
        info!(
            %match_id,
            over = position.over_number,
            ball = position.ball_number,
            bowler = %event.bowler_id,
            version = committed.scorecard.version,
            "delivery recorded"
        );
    }

    sse_events::broadcast_score_updated(state, &snapshot);
    if committed.status_changed() {
        info!(%match_id, status = ?snapshot.match_info.status, "match status changed");
        sse_events::broadcast_status_changed(
            state,
            match_id,
            committed.scorecard.info.status,
            snapshot.result.clone(),
        );
    }

    Ok(snapshot)
}
