//! Rating updater trait
//!
//! A rating updater is a pure function of the two candidates' current state.
//! Fetching fresh state and persisting the result belong to the engine.

use crate::error::{RankingError, Result};
use crate::types::{Candidate, RatingUpdate};

/// Trait for applying a comparison outcome to two candidates
pub trait RatingUpdater: Send + Sync {
    /// Compute new ratings and tallies for a decided comparison
    ///
    /// # Arguments
    /// * `winner` - Current stored state of the preferred candidate
    /// * `loser` - Current stored state of the other candidate
    fn apply_outcome(&self, winner: &Candidate, loser: &Candidate) -> Result<RatingUpdate>;

    /// Probability that a candidate rated `rating` is preferred over `opponent`
    fn expected_score(&self, rating: i64, opponent: i64) -> f64;

    /// Rating assigned to new candidates
    fn initial_rating(&self) -> i64;
}

/// Reject outcomes that compare a candidate with itself
pub fn ensure_distinct(winner: &Candidate, loser: &Candidate) -> Result<()> {
    if winner.id == loser.id {
        return Err(RankingError::InvalidOutcome {
            reason: format!("candidate {} cannot be compared with itself", winner.id),
        }
        .into());
    }
    Ok(())
}
