//! Candidate repository interface
//!
//! These are the only storage operations the engine needs. Every write takes
//! the version the caller read and fails with
//! [`RankingError::ConcurrentUpdateConflict`](crate::error::RankingError) when
//! the stored candidate moved on in the meantime.

use crate::error::Result;
use crate::types::{Candidate, CandidateId, RatingTally};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Trait for candidate storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Get every candidate in storage order
    async fn fetch_all(&self) -> Result<Vec<Candidate>>;

    /// Get one candidate, `None` if the id is unknown
    async fn fetch_by_id(&self, id: &CandidateId) -> Result<Option<Candidate>>;

    /// Replace a candidate's match history; returns the new version
    async fn save_match_history(
        &self,
        id: &CandidateId,
        matches_played: &BTreeSet<CandidateId>,
        expected_version: u64,
    ) -> Result<u64>;

    /// Replace a candidate's rating and counters; returns the new version
    async fn save_rating_and_tally(
        &self,
        id: &CandidateId,
        tally: &RatingTally,
        expected_version: u64,
    ) -> Result<u64>;

    /// Clear every candidate's match history; returns how many were stored
    async fn reset_all_match_histories(&self) -> Result<usize>;
}
