//! Per-candidate async locks
//!
//! Every engine write to a candidate happens while holding that candidate's
//! lock. Multi-candidate operations lock in sorted id order, so two requests
//! touching overlapping candidates serialize instead of deadlocking.
//!
//! A registry entry lives only while some request holds or waits on it; the
//! last [`LockSet`] to release an id removes it.

use crate::error::{RankingError, Result};
use crate::types::CandidateId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<CandidateId, Arc<AsyncMutex<()>>>>>;

/// Registry of one async mutex per candidate id
#[derive(Debug, Default)]
pub struct CandidateLocks {
    locks: Registry,
}

/// Guards for a set of candidates; released on drop
#[derive(Debug)]
pub struct LockSet {
    guards: Vec<OwnedMutexGuard<()>>,
    ids: Vec<CandidateId>,
    registry: Registry,
}

impl Drop for LockSet {
    fn drop(&mut self) {
        self.guards.clear();

        let Ok(mut locks) = self.registry.lock() else {
            return;
        };
        for id in &self.ids {
            // the registry's own reference is the only one left
            if locks.get(id).is_some_and(|handle| Arc::strong_count(handle) == 1) {
                locks.remove(id);
            }
        }
    }
}

impl CandidateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: &CandidateId) -> Result<Arc<AsyncMutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| RankingError::InternalError {
            message: "Failed to acquire candidate lock registry".to_string(),
        })?;

        Ok(locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    /// Lock every id in `ids`; duplicates are locked once
    pub async fn acquire<'a, I>(&self, ids: I) -> Result<LockSet>
    where
        I: IntoIterator<Item = &'a CandidateId>,
    {
        let mut ids: Vec<CandidateId> = ids.into_iter().cloned().collect();
        ids.sort();
        ids.dedup();

        let mut set = LockSet {
            guards: Vec::with_capacity(ids.len()),
            ids,
            registry: self.locks.clone(),
        };

        for i in 0..set.ids.len() {
            let handle = self.handle(&set.ids[i])?;
            set.guards.push(handle.lock_owned().await);
        }

        Ok(set)
    }

    /// Number of ids currently present in the registry
    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_duplicates_locked_once() {
        let locks = CandidateLocks::new();
        let a = "a".to_string();

        let set = locks.acquire([&a, &a]).await.unwrap();
        assert_eq!(set.guards.len(), 1);
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_sets_serialize() {
        let locks = Arc::new(CandidateLocks::new());
        let (a, b, c) = ("a".to_string(), "b".to_string(), "c".to_string());

        let held = locks.acquire([&b, &a]).await.unwrap();

        let contender = {
            let locks = locks.clone();
            let (b, c) = (b.clone(), c.clone());
            tokio::spawn(async move { locks.acquire([&c, &b]).await.map(|set| set.guards.len()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        // "b" is still wanted by the waiting task
        drop(held);

        let acquired = tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(acquired, 2);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_disjoint_sets_do_not_block() {
        let locks = CandidateLocks::new();
        let (a, b, c, d) = (
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        );

        let _first = locks.acquire([&a, &b]).await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire([&c, &d]))
            .await
            .expect("disjoint lock set should not wait");
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_ids_leave_registry() {
        let locks = CandidateLocks::new();

        for i in 0..1000 {
            let (x, y) = (format!("gone-{}", i), format!("gone-{}-other", i));
            let set = locks.acquire([&x, &y]).await.unwrap();
            assert_eq!(locks.tracked(), 2);
            drop(set);
        }

        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_shared_id_kept_while_held() {
        let locks = CandidateLocks::new();
        let (a, b, c) = ("a".to_string(), "b".to_string(), "c".to_string());

        let first = locks.acquire([&a, &b]).await.unwrap();
        let second = locks.acquire([&c]).await.unwrap();
        drop(second);

        assert_eq!(locks.tracked(), 2);
        drop(first);
        assert_eq!(locks.tracked(), 0);
    }
}
