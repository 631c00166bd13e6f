use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Advisory locks keyed by (professional, date). The creation path holds the
/// key's lock across its whole check-then-insert sequence, so two concurrent
/// requests for intersecting slots serialize and the loser sees the winner's
/// row during its own conflict check.
#[derive(Default)]
pub struct SlotLocks {
    inner: std::sync::Mutex<HashMap<(i64, NaiveDate), Arc<Mutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, professional_id: i64, date: NaiveDate) -> OwnedMutexGuard<()> {
        let slot = {
            let mut registry = self.inner.lock().expect("slot lock registry poisoned");
            Arc::clone(registry.entry((professional_id, date)).or_default())
        };
        slot.lock_owned().await
    }

    /// Locks for several keys, taken in sorted order so concurrent multi-key
    /// holders cannot deadlock each other.
    pub async fn acquire_all(&self, mut keys: Vec<(i64, NaiveDate)>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for (professional_id, date) in keys {
            guards.push(self.acquire(professional_id, date).await);
        }
        guards
    }
}
