use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{ScoreStore, profiles_to_ensure};
use crate::{
    dao::{
        models::{PlayerMatchStatEntity, PlayerProfileEntity, TeamEntity},
        storage::{StorageError, StorageResult},
    },
    scoring::{
        log::{ScoreChange, Scorecard},
        model::MatchInfo,
    },
};

/// In-process [`ScoreStore`] used when no database is configured, and by the test suites.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    teams: DashMap<Uuid, TeamEntity>,
    matches: DashMap<Uuid, Scorecard>,
    profiles: DashMap<Uuid, PlayerProfileEntity>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_match(&self, scorecard: Scorecard) -> StorageResult<()> {
        match self.inner.matches.entry(scorecard.match_id()) {
            Entry::Occupied(entry) => Err(StorageError::conflict(format!(
                "match `{}` already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(scorecard);
                Ok(())
            }
        }
    }

    fn collect_matches(&self) -> Vec<MatchInfo> {
        let mut matches: Vec<MatchInfo> = self
            .inner
            .matches
            .iter()
            .map(|entry| entry.value().info.clone())
            .collect();
        matches.sort_by_key(|info| info.created_at);
        matches
    }

    fn apply_journal(
        &self,
        match_id: Uuid,
        expected_version: u64,
        changes: &[ScoreChange],
    ) -> StorageResult<Scorecard> {
        let mut entry = self
            .inner
            .matches
            .get_mut(&match_id)
            .ok_or(StorageError::NotFound {
                entity: "match",
                id: match_id,
            })?;

        if entry.version != expected_version {
            return Err(StorageError::conflict(format!(
                "match `{match_id}` is at version {}, expected {expected_version}",
                entry.version
            )));
        }

        let mut next = entry.value().clone();
        for change in changes {
            next.replay(change)
                .map_err(|err| StorageError::conflict(err.to_string()))?;
        }
        next.version = expected_version + 1;
        *entry.value_mut() = next.clone();
        drop(entry);

        for user_id in profiles_to_ensure(changes) {
            self.inner
                .profiles
                .entry(user_id)
                .or_insert_with(|| PlayerProfileEntity {
                    user_id,
                    created_at: SystemTime::now(),
                    first_match_id: match_id,
                });
        }

        Ok(next)
    }

    fn collect_player_stats(&self, user_id: Uuid) -> Vec<PlayerMatchStatEntity> {
        let mut rows: Vec<(SystemTime, PlayerMatchStatEntity)> = self
            .inner
            .matches
            .iter()
            .filter_map(|entry| {
                let scorecard = entry.value();
                scorecard.player_stat(user_id).map(|stat| {
                    (
                        scorecard.info.created_at,
                        PlayerMatchStatEntity {
                            match_id: scorecard.match_id(),
                            stat: stat.clone(),
                        },
                    )
                })
            })
            .collect();
        rows.sort_by_key(|(created_at, _)| *created_at);
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.get(&id).map(|team| team.clone())) })
    }

    fn create_match(&self, scorecard: Scorecard) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(scorecard) })
    }

    fn load_scorecard(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Scorecard>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .matches
                .get(&match_id)
                .map(|scorecard| scorecard.clone()))
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchInfo>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.collect_matches()) })
    }

    fn commit(
        &self,
        match_id: Uuid,
        expected_version: u64,
        changes: Vec<ScoreChange>,
    ) -> BoxFuture<'static, StorageResult<Scorecard>> {
        let store = self.clone();
        Box::pin(async move { store.apply_journal(match_id, expected_version, &changes) })
    }

    fn find_profile(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .profiles
                .get(&user_id)
                .map(|profile| profile.clone()))
        })
    }

    fn player_stats_for(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerMatchStatEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.collect_player_stats(user_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
