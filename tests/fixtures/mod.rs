//! Test fixtures and repository wrappers for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use review_ranker::config::AppConfig;
use review_ranker::error::Result;
use review_ranker::storage::{CandidateRepository, InMemoryCandidateRepository};
use review_ranker::types::{Candidate, CandidateId, RatingTally};
use review_ranker::{RankingEngine, RankingError};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Build a pool from `(id, rating)` pairs, in the given order
pub fn pool(entries: &[(&str, i64)]) -> Vec<Candidate> {
    entries
        .iter()
        .map(|(id, rating)| Candidate::new(*id, format!("Applicant {}", id), *rating))
        .collect()
}

/// Pool of `size` candidates with ids `c0..` and spread-out ratings
pub fn spread_pool(size: usize) -> Vec<Candidate> {
    (0..size)
        .map(|i| {
            Candidate::new(
                format!("c{}", i),
                format!("Applicant {}", i),
                900 + (i as i64 * 7) % 250,
            )
        })
        .collect()
}

/// In-memory repository preloaded with `candidates`
pub fn repository_with(candidates: Vec<Candidate>) -> Arc<InMemoryCandidateRepository> {
    Arc::new(InMemoryCandidateRepository::with_candidates(candidates).unwrap())
}

/// Engine over `repository` with default configuration
pub fn engine_over(repository: Arc<dyn CandidateRepository>) -> RankingEngine {
    RankingEngine::new(repository, &AppConfig::default()).unwrap()
}

pub async fn stored(repository: &InMemoryCandidateRepository, id: &str) -> Candidate {
    repository
        .fetch_by_id(&id.to_string())
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("candidate {} missing", id))
}

/// Repository that answers every read after a fixed delay
pub struct SlowRepository {
    inner: Arc<InMemoryCandidateRepository>,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(inner: Arc<InMemoryCandidateRepository>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl CandidateRepository for SlowRepository {
    async fn fetch_all(&self) -> Result<Vec<Candidate>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_all().await
    }

    async fn fetch_by_id(&self, id: &CandidateId) -> Result<Option<Candidate>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_by_id(id).await
    }

    async fn save_match_history(
        &self,
        id: &CandidateId,
        matches_played: &BTreeSet<CandidateId>,
        expected_version: u64,
    ) -> Result<u64> {
        self.inner
            .save_match_history(id, matches_played, expected_version)
            .await
    }

    async fn save_rating_and_tally(
        &self,
        id: &CandidateId,
        tally: &RatingTally,
        expected_version: u64,
    ) -> Result<u64> {
        self.inner
            .save_rating_and_tally(id, tally, expected_version)
            .await
    }

    async fn reset_all_match_histories(&self) -> Result<usize> {
        self.inner.reset_all_match_histories().await
    }
}

/// Repository that rejects writes to selected candidates and can report
/// the first few writes as version conflicts
pub struct FaultyRepository {
    inner: Arc<InMemoryCandidateRepository>,
    rejected: Mutex<BTreeSet<CandidateId>>,
    pending_conflicts: AtomicUsize,
    writes: AtomicUsize,
}

impl FaultyRepository {
    pub fn new(inner: Arc<InMemoryCandidateRepository>) -> Self {
        Self {
            inner,
            rejected: Mutex::new(BTreeSet::new()),
            pending_conflicts: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Fail every write to `id` with a storage error
    pub fn reject_writes_to(&self, id: &str) {
        self.rejected.lock().unwrap().insert(id.to_string());
    }

    /// Report the next `count` writes as conflicts without applying them
    pub fn inject_conflicts(&self, count: usize) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Writes that reached the inner repository
    pub fn applied_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self, id: &CandidateId) -> Result<()> {
        if self.rejected.lock().unwrap().contains(id) {
            return Err(RankingError::StorageError {
                message: format!("write to {} rejected", id),
            }
            .into());
        }

        let conflict = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(RankingError::ConcurrentUpdateConflict {
                candidate_id: id.clone(),
            }
            .into());
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl CandidateRepository for FaultyRepository {
    async fn fetch_all(&self) -> Result<Vec<Candidate>> {
        self.inner.fetch_all().await
    }

    async fn fetch_by_id(&self, id: &CandidateId) -> Result<Option<Candidate>> {
        self.inner.fetch_by_id(id).await
    }

    async fn save_match_history(
        &self,
        id: &CandidateId,
        matches_played: &BTreeSet<CandidateId>,
        expected_version: u64,
    ) -> Result<u64> {
        self.check_write(id)?;
        self.inner
            .save_match_history(id, matches_played, expected_version)
            .await
    }

    async fn save_rating_and_tally(
        &self,
        id: &CandidateId,
        tally: &RatingTally,
        expected_version: u64,
    ) -> Result<u64> {
        self.check_write(id)?;
        self.inner
            .save_rating_and_tally(id, tally, expected_version)
            .await
    }

    async fn reset_all_match_histories(&self) -> Result<usize> {
        self.inner.reset_all_match_histories().await
    }
}
