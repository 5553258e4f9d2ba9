//! In-memory candidate repository
//!
//! Keeps candidates in insertion order, which is the pool order the
//! matchmaker sees for equal ratings.

use crate::error::{RankingError, Result};
use crate::storage::repository::CandidateRepository;
use crate::types::{Candidate, CandidateId, RatingTally};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::RwLock;
use tracing::info;

/// In-memory candidate storage implementation
#[derive(Debug, Default)]
pub struct InMemoryCandidateRepository {
    candidates: RwLock<Vec<Candidate>>,
}

impl InMemoryCandidateRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository preloaded with a pool
    pub fn with_candidates(candidates: Vec<Candidate>) -> Result<Self> {
        let repository = Self::new();
        for candidate in candidates {
            repository.insert(candidate)?;
        }
        Ok(repository)
    }

    /// Store a newly registered candidate
    pub fn insert(&self, candidate: Candidate) -> Result<()> {
        let mut candidates = self.write_lock()?;

        if candidates.iter().any(|c| c.id == candidate.id) {
            return Err(RankingError::StorageError {
                message: format!("Candidate {} already exists", candidate.id),
            }
            .into());
        }

        candidates.push(candidate);
        Ok(())
    }

    /// Number of stored candidates
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Candidate>>> {
        self.candidates.read().map_err(|_| {
            RankingError::InternalError {
                message: "Failed to acquire candidates read lock".to_string(),
            }
            .into()
        })
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Candidate>>> {
        self.candidates.write().map_err(|_| {
            RankingError::InternalError {
                message: "Failed to acquire candidates write lock".to_string(),
            }
            .into()
        })
    }

    /// Apply `update` to one candidate if its version still matches
    fn compare_and_swap<F>(&self, id: &CandidateId, expected_version: u64, update: F) -> Result<u64>
    where
        F: FnOnce(&mut Candidate),
    {
        let mut candidates = self.write_lock()?;

        let candidate = candidates.iter_mut().find(|c| &c.id == id).ok_or_else(|| {
            RankingError::CandidateNotFound {
                candidate_id: id.clone(),
            }
        })?;

        if candidate.version != expected_version {
            return Err(RankingError::ConcurrentUpdateConflict {
                candidate_id: id.clone(),
            }
            .into());
        }

        update(candidate);
        candidate.version += 1;
        candidate.updated_at = current_timestamp();

        Ok(candidate.version)
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn fetch_all(&self) -> Result<Vec<Candidate>> {
        Ok(self.read_lock()?.clone())
    }

    async fn fetch_by_id(&self, id: &CandidateId) -> Result<Option<Candidate>> {
        Ok(self.read_lock()?.iter().find(|c| &c.id == id).cloned())
    }

    async fn save_match_history(
        &self,
        id: &CandidateId,
        matches_played: &BTreeSet<CandidateId>,
        expected_version: u64,
    ) -> Result<u64> {
        self.compare_and_swap(id, expected_version, |candidate| {
            candidate.matches_played = matches_played.clone();
        })
    }

    async fn save_rating_and_tally(
        &self,
        id: &CandidateId,
        tally: &RatingTally,
        expected_version: u64,
    ) -> Result<u64> {
        self.compare_and_swap(id, expected_version, |candidate| {
            candidate.rating = tally.rating;
            candidate.wins = tally.wins;
            candidate.losses = tally.losses;
            candidate.rating_count = tally.rating_count;
        })
    }

    async fn reset_all_match_histories(&self) -> Result<usize> {
        let mut candidates = self.write_lock()?;
        let now = current_timestamp();

        for candidate in candidates.iter_mut() {
            candidate.matches_played.clear();
            candidate.version += 1;
            candidate.updated_at = now;
        }

        info!("Reset match history for {} candidates", candidates.len());
        Ok(candidates.len())
    }
}
