use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoMatchDocument, MongoProfileDocument, MongoTeamDocument, doc_id},
};
use crate::{
    dao::{
        models::{PlayerMatchStatEntity, PlayerProfileEntity, TeamEntity},
        score_store::{ScoreStore, profiles_to_ensure},
        storage::{StorageError, StorageResult},
    },
    scoring::{
        log::{ScoreChange, Scorecard},
        model::MatchInfo,
    },
};

const MATCH_COLLECTION_NAME: &str = "matches";
const TEAM_COLLECTION_NAME: &str = "teams";
const PROFILE_COLLECTION_NAME: &str = "player_profiles";

/// MongoDB-backed [`ScoreStore`] implementation.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.match_collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"participants": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_participants_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "participants",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn match_collection(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        self.database()
            .await
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
    }

    async fn profile_collection(&self) -> Collection<MongoProfileDocument> {
        self.database()
            .await
            .collection::<MongoProfileDocument>(PROFILE_COLLECTION_NAME)
    }

    async fn save_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        self.team_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTeam { id, source })?;
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .team_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTeam { id, source })?;
        document.map(TeamEntity::try_from).transpose()
    }

    async fn create_match(&self, scorecard: Scorecard) -> MongoResult<()> {
        let id = scorecard.match_id();
        let document: MongoMatchDocument = scorecard.into();
        self.match_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;
        Ok(())
    }

    async fn load_document(&self, id: Uuid) -> MongoResult<Option<MongoMatchDocument>> {
        self.match_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchInfo>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;

        Ok(documents
            .into_iter()
            .map(|document| document.scorecard.info)
            .collect())
    }

    async fn commit(
        &self,
        id: Uuid,
        expected_version: u64,
        changes: Vec<ScoreChange>,
    ) -> StorageResult<Scorecard> {
        let document = self
            .load_document(id)
            .await?
            .ok_or(StorageError::NotFound { entity: "match", id })?;
        if document.version != expected_version as i64 {
            return Err(StorageError::conflict(format!(
                "match `{id}` is at version {}, expected {expected_version}",
                document.version
            )));
        }

        let mut scorecard = document.scorecard;
        for change in &changes {
            scorecard
                .replay(change)
                .map_err(|err| StorageError::conflict(err.to_string()))?;
        }
        scorecard.version = expected_version + 1;

        for write in commit_writes(&changes) {
            match write {
                CommitWrite::EnsureProfile(user_id) => self.ensure_profile(user_id, id).await?,
                CommitWrite::ReplaceMatch => {
                    self.replace_versioned(id, expected_version, &scorecard).await?
                }
            }
        }
        debug!(
            match_id = %id,
            version = scorecard.version,
            changes = changes.len(),
            "journal committed"
        );
        Ok(scorecard)
    }

    async fn replace_versioned(
        &self,
        id: Uuid,
        expected_version: u64,
        scorecard: &Scorecard,
    ) -> StorageResult<()> {
        let next: MongoMatchDocument = scorecard.clone().into();
        let mut filter = doc_id(id);
        filter.insert("version", expected_version as i64);
        let result = self
            .match_collection()
            .await
            .replace_one(filter, &next)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;
        if result.matched_count == 0 {
            return Err(StorageError::conflict(format!(
                "match `{id}` moved past version {expected_version} during commit"
            )));
        }
        Ok(())
    }

    async fn ensure_profile(&self, user_id: Uuid, match_id: Uuid) -> MongoResult<()> {
        self.profile_collection()
            .await
            .update_one(
                doc_id(user_id),
                doc! {"$setOnInsert": {
                    "created_at": DateTime::now(),
                    "first_match_id": match_id.to_string(),
                }},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveProfile {
                id: user_id,
                source,
            })?;
        Ok(())
    }

    async fn find_profile(&self, user_id: Uuid) -> MongoResult<Option<PlayerProfileEntity>> {
        let document = self
            .profile_collection()
            .await
            .find_one(doc_id(user_id))
            .await
            .map_err(|source| MongoDaoError::LoadProfile {
                id: user_id,
                source,
            })?;
        document.map(PlayerProfileEntity::try_from).transpose()
    }

    async fn player_stats_for(&self, user_id: Uuid) -> MongoResult<Vec<PlayerMatchStatEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {"participants": user_id.to_string()})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;

        Ok(documents
            .into_iter()
            .filter_map(|document| {
                let scorecard = document.scorecard;
                scorecard
                    .player_stat(user_id)
                    .cloned()
                    .map(|stat| PlayerMatchStatEntity {
                        match_id: scorecard.match_id(),
                        stat,
                    })
            })
            .collect())
    }
}

/// One write issued by [`MongoScoreStore::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitWrite {
    EnsureProfile(Uuid),
    ReplaceMatch,
}

/// Writes of a commit in execution order. Profile upserts are idempotent and go first, so the
/// versioned match replace is the last write and the only one that commits the journal.
fn commit_writes(changes: &[ScoreChange]) -> Vec<CommitWrite> {
    profiles_to_ensure(changes)
        .map(CommitWrite::EnsureProfile)
        .chain(std::iter::once(CommitWrite::ReplaceMatch))
        .collect()
}

impl ScoreStore for MongoScoreStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn create_match(&self, scorecard: Scorecard) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_match(scorecard).await.map_err(Into::into) })
    }

    fn load_scorecard(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Scorecard>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_document(match_id)
                .await
                .map(|document| document.map(|document| document.scorecard))
                .map_err(Into::into)
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchInfo>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn commit(
        &self,
        match_id: Uuid,
        expected_version: u64,
        changes: Vec<ScoreChange>,
    ) -> BoxFuture<'static, StorageResult<Scorecard>> {
        let store = self.clone();
        Box::pin(async move { store.commit(match_id, expected_version, changes).await })
    }

    fn find_profile(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_profile(user_id).await.map_err(Into::into) })
    }

    fn player_stats_for(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerMatchStatEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.player_stats_for(user_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
