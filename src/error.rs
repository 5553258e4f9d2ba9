//! Error types for the ranking engine
//!
//! Operations return `anyhow::Result` like the rest of the crate; callers that
//! need to branch on the failure kind downcast to [`RankingError`].

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranking scenarios
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Not enough candidates for comparison: {available} available, 2 required")]
    InsufficientCandidates { available: usize },

    #[error("All candidate pairs have been compared, match history reset for {reset} candidates")]
    AllPairsExhausted { reset: usize },

    #[error("Candidate not found: {candidate_id}")]
    CandidateNotFound { candidate_id: String },

    #[error("Concurrent update conflict on candidate: {candidate_id}")]
    ConcurrentUpdateConflict { candidate_id: String },

    #[error("Invalid comparison outcome: {reason}")]
    InvalidOutcome { reason: String },

    #[error("Repository operation '{operation}' timed out after {timeout_ms}ms")]
    RepositoryTimeout { operation: String, timeout_ms: u64 },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal engine error: {message}")]
    InternalError { message: String },
}

impl RankingError {
    /// Whether the caller can reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RankingError::AllPairsExhausted { .. }
                | RankingError::ConcurrentUpdateConflict { .. }
                | RankingError::RepositoryTimeout { .. }
        )
    }

    /// Whether the failure was caused by bad caller input rather than engine state
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RankingError::CandidateNotFound { .. } | RankingError::InvalidOutcome { .. }
        )
    }
}

/// Extract the ranking error kind from an `anyhow::Error`, if there is one
pub fn ranking_error(error: &anyhow::Error) -> Option<&RankingError> {
    error.downcast_ref::<RankingError>()
}

/// Check whether an error is an optimistic-lock conflict
pub fn is_conflict(error: &anyhow::Error) -> bool {
    matches!(
        ranking_error(error),
        Some(RankingError::ConcurrentUpdateConflict { .. })
    )
}
