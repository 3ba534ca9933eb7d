pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{PlayerMatchStatEntity, PlayerProfileEntity, TeamEntity};
use crate::dao::storage::StorageResult;
use crate::scoring::{
    log::{ScoreChange, Scorecard},
    model::MatchInfo,
};
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::MemoryScoreStore;

/// Abstraction over the persistence layer for teams, match scorecards and player profiles.
///
/// `commit` is the only way to change a stored scorecard: the journal is applied atomically
/// and only if the stored version still equals `expected_version`.
pub trait ScoreStore: Send + Sync {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn create_match(&self, scorecard: Scorecard) -> BoxFuture<'static, StorageResult<()>>;
    fn load_scorecard(&self, match_id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<Scorecard>>>;
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchInfo>>>;
    fn commit(
        &self,
        match_id: Uuid,
        expected_version: u64,
        changes: Vec<ScoreChange>,
    ) -> BoxFuture<'static, StorageResult<Scorecard>>;
    fn find_profile(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>>;
    fn player_stats_for(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerMatchStatEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Users whose profile must exist once `changes` are committed.
pub(crate) fn profiles_to_ensure(changes: &[ScoreChange]) -> impl Iterator<Item = Uuid> + '_ {
    changes.iter().filter_map(|change| match change {
        ScoreChange::EnsureProfile { user_id } => Some(*user_id),
        _ => None,
    })
}
