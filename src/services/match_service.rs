use std::{sync::Arc, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{models::TeamEntity, score_store::ScoreStore},
    dto::{
        matches::{CreateMatchRequest, MatchSummary, TossRequest},
        snapshot::MatchSnapshot,
    },
    error::ServiceError,
    scoring::{
        self,
        log::Scorecard,
        model::{MatchInfo, MatchRules, MatchStatus, Toss},
    },
    services::{scoring_service::transact, sse_events},
    state::SharedState,
};

/// Write the configured teams to a freshly installed store.
pub async fn seed_teams(
    store: &Arc<dyn ScoreStore>,
    teams: &[TeamEntity],
) -> Result<(), ServiceError> {
    for team in teams {
        store.save_team(team.clone()).await?;
    }
    if !teams.is_empty() {
        info!(count = teams.len(), "seeded teams");
    }
    Ok(())
}

/// Schedule a match between two known teams. The match waits for its toss.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let store = state.require_score_store().await?;
    let scheduled_at = request.scheduled_time().ok_or_else(|| {
        ServiceError::InvalidRequest("scheduled_at must be an RFC 3339 timestamp".into())
    })?;
    if request.home_team_id == request.away_team_id {
        return Err(ServiceError::InvalidRequest(
            "home and away teams must be different".into(),
        ));
    }

    let home = require_team(&store, request.home_team_id).await?;
    let away = require_team(&store, request.away_team_id).await?;

    let info = MatchInfo {
        id: Uuid::new_v4(),
        venue: request.venue,
        scheduled_at,
        home_team_id: home.id,
        away_team_id: away.id,
        toss: None,
        rules: MatchRules {
            overs_limit: request.overs_limit,
            wickets_limit: request.wickets_limit,
        },
        status: MatchStatus::Toss,
        umpire_id: request.umpire_id,
        created_at: SystemTime::now(),
    };
    let scorecard = Scorecard::new(info);
    store.create_match(scorecard.clone()).await?;
    info!(match_id = %scorecard.match_id(), home = %home.name, away = %away.name, "match created");

    Ok(MatchSnapshot::build(&scorecard, &home, &away))
}

/// Every match, oldest first.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchSummary>, ServiceError> {
    let store = state.require_score_store().await?;
    let matches = store.list_matches().await?;
    Ok(matches.iter().map(MatchSummary::from).collect())
}

/// Committed state of one match. Reads never wait for the match gate.
pub async fn get_snapshot(
    state: &SharedState,
    match_id: Uuid,
) -> Result<MatchSnapshot, ServiceError> {
    let store = state.require_score_store().await?;
    let scorecard = store
        .load_scorecard(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}`")))?;
    snapshot_of(&store, &scorecard).await
}

/// Record the toss and open play.
pub async fn record_toss(
    state: &SharedState,
    match_id: Uuid,
    request: TossRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let toss: Toss = request.into();
    let (store, committed) = transact(state, match_id, |scorecard| {
        scoring::record_toss(scorecard, toss)
    })
    .await?;

    let snapshot = snapshot_of(&store, &committed.scorecard).await?;
    info!(
        %match_id,
        winner = %request.winner_id,
        elected_to = ?request.elected_to,
        "toss recorded"
    );
    sse_events::broadcast_status_changed(state, match_id, committed.scorecard.info.status, None);
    Ok(snapshot)
}

/// Open the chase once the first innings has closed.
pub async fn start_second_innings(
    state: &SharedState,
    match_id: Uuid,
) -> Result<MatchSnapshot, ServiceError> {
    let (store, committed) = transact(state, match_id, scoring::start_second_innings).await?;

    let snapshot = snapshot_of(&store, &committed.scorecard).await?;
    if committed.previous.info.status == MatchStatus::Ongoing {
        warn!(%match_id, "second innings opened while the first was still in play");
    }
    info!(%match_id, "second innings started");
    sse_events::broadcast_status_changed(state, match_id, committed.scorecard.info.status, None);
    Ok(snapshot)
}

/// Project a committed scorecard into its snapshot, loading both teams.
pub(crate) async fn snapshot_of(
    store: &Arc<dyn ScoreStore>,
    scorecard: &Scorecard,
) -> Result<MatchSnapshot, ServiceError> {
    let home = require_team(store, scorecard.info.home_team_id).await?;
    let away = require_team(store, scorecard.info.away_team_id).await?;
    Ok(MatchSnapshot::build(scorecard, &home, &away))
}

async fn require_team(store: &Arc<dyn ScoreStore>, id: Uuid) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{id}`")))
}
