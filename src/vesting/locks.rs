//! Per-record single-writer discipline
//!
//! Claims and revokes on the same record id run one at a time; operations on
//! different ids proceed in parallel.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct RecordLocks {
    // An entry lives only while some task holds or waits for its id
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one record id; the map entry is dropped with the last user
pub struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`; released when the guard drops
    pub async fn acquire(&self, id: &str) -> RecordGuard<'_> {
        let lock = self
            .inner
            .lock()
            .entry(id.to_string())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;
        RecordGuard {
            locks: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_ids(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means nobody else needs it
        let mut inner = self.locks.inner.lock();
        if inner
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            inner.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = Arc::new(RecordLocks::new());
        let guard = locks.acquire("lock-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("lock-1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        assert_eq!(locks.tracked_ids(), 1);

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.tracked_ids(), 0);
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = RecordLocks::new();
        let _first = locks.acquire("a").await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire("b")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_entries_do_not_outlive_their_guards() {
        let locks = RecordLocks::new();
        for i in 0..1_000 {
            let _guard = locks.acquire(&format!("unknown-{}", i)).await;
        }
        assert_eq!(locks.tracked_ids(), 0);
    }
}
