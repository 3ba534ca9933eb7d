pub mod gate;
mod sse;

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::score_store::ScoreStore, error::ServiceError};

pub use self::gate::{MatchGates, MatchGuard};
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, per-match gates and the broadcast hub.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    public_sse: SseHub,
    gates: MatchGates,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            score_store: RwLock::new(None),
            public_sse: SseHub::new(config.sse_capacity),
            gates: MatchGates::new(),
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while storage is unavailable.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Matches with a writer holding or waiting for their gate.
    pub fn active_matches(&self) -> usize {
        self.gates.len()
    }

    /// Take the gate of `match_id`, waiting at most the configured lock wait.
    ///
    /// A busy match yields [`ServiceError::Conflict`], which is safe to retry.
    pub async fn lock_match(&self, match_id: Uuid) -> Result<MatchGuard, ServiceError> {
        self.gates
            .acquire(match_id, self.config.lock_wait)
            .await
            .ok_or_else(|| {
                warn!(
                    %match_id,
                    wait = ?self.config.lock_wait,
                    "match is busy; rejecting writer"
                );
                ServiceError::Conflict(format!(
                    "match `{match_id}` is being updated by another request"
                ))
            })
    }

    /// Bound `work` by the transaction timeout, yielding [`ServiceError::Timeout`] past it.
    pub async fn within_deadline<Fut, T>(
        &self,
        match_id: Uuid,
        work: Fut,
    ) -> Result<T, ServiceError>
    where
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        match timeout(self.config.transaction_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    %match_id,
                    limit = ?self.config.transaction_timeout,
                    "scoring transaction timed out"
                );
                Err(ServiceError::Timeout)
            }
        }
    }
}
