//! Per-match mutual exclusion for scoring transactions.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    time::timeout,
};
use uuid::Uuid;

type Gates = DashMap<Uuid, Arc<Mutex<()>>>;

/// One async mutex per match. Writers to different matches never contend.
///
/// An entry only lives while a writer holds or waits for it, so ids that never resolve to a
/// match do not accumulate.
#[derive(Default)]
pub struct MatchGates {
    gates: Arc<Gates>,
}

/// Exclusive access to one match. Dropping it releases the gate.
pub struct MatchGuard {
    gates: Arc<Gates>,
    match_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MatchGuard {
    fn drop(&mut self) {
        self.guard.take();
        forget_if_idle(&self.gates, self.match_id);
    }
}

impl MatchGates {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait at most `wait` for exclusive access to `match_id`. `None` when the wait elapsed.
    pub async fn acquire(&self, match_id: Uuid, wait: Duration) -> Option<MatchGuard> {
        let gate = self
            .gates
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let locked = timeout(wait, gate.lock_owned()).await;
        match locked {
            Ok(guard) => Some(MatchGuard {
                gates: self.gates.clone(),
                match_id,
                guard: Some(guard),
            }),
            Err(_) => {
                forget_if_idle(&self.gates, match_id);
                None
            }
        }
    }

    /// Number of matches currently held or awaited by a writer.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether no writer holds or waits for any gate.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

/// Drop the entry of `match_id` once the registry holds the last reference to it.
///
/// Clones are only taken under the shard lock `remove_if` also holds, so a count of one means
/// nobody holds or waits for the gate.
fn forget_if_idle(gates: &Gates, match_id: Uuid) {
    gates.remove_if(&match_id, |_, gate| Arc::strong_count(gate) == 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_writer_times_out_while_first_holds_the_gate() {
        let gates = MatchGates::new();
        let match_id = Uuid::new_v4();

        let held = gates.acquire(match_id, Duration::from_millis(50)).await;
        assert!(held.is_some());
        assert!(
            gates
                .acquire(match_id, Duration::from_millis(20))
                .await
                .is_none()
        );

        drop(held);
        assert!(
            gates
                .acquire(match_id, Duration::from_millis(20))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn different_matches_do_not_contend() {
        let gates = MatchGates::new();
        let first = gates.acquire(Uuid::new_v4(), Duration::from_millis(20)).await;
        let second = gates.acquire(Uuid::new_v4(), Duration::from_millis(20)).await;
        assert!(first.is_some() && second.is_some());
        assert_eq!(gates.len(), 2);

        drop(first);
        assert_eq!(gates.len(), 1);
        drop(second);
        assert!(gates.is_empty());
    }

    #[tokio::test]
    async fn released_gates_are_forgotten() {
        let gates = MatchGates::new();
        for _ in 0..100 {
            let guard = gates.acquire(Uuid::new_v4(), Duration::from_millis(20)).await;
            assert!(guard.is_some());
        }
        assert!(gates.is_empty());
    }

    #[tokio::test]
    async fn gate_survives_while_a_writer_waits() {
        let gates = Arc::new(MatchGates::new());
        let match_id = Uuid::new_v4();
        let held = gates.acquire(match_id, Duration::from_millis(20)).await;

        let waiter = tokio::spawn({
            let gates = gates.clone();
            async move {
                gates
                    .acquire(match_id, Duration::from_secs(5))
                    .await
                    .is_some()
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);
        assert_eq!(gates.len(), 1);

        assert!(waiter.await.unwrap());
        assert!(gates.is_empty());
    }

    #[tokio::test]
    async fn timed_out_writer_leaves_the_holder_in_place() {
        let gates = MatchGates::new();
        let match_id = Uuid::new_v4();
        let held = gates.acquire(match_id, Duration::from_millis(20)).await;
        assert!(gates.acquire(match_id, Duration::from_millis(10)).await.is_none());
        assert_eq!(gates.len(), 1);
        drop(held);
        assert!(gates.is_empty());
    }
}
