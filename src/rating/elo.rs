//! Elo rating updater
//!
//! Wraps the `skillratings` Elo implementation. Ratings are stored as whole
//! numbers, so the winner's gain is truncated toward zero and the loser loses
//! exactly that amount; the pool total never drifts from repeated rounding.

use crate::config::RatingConfig;
use crate::error::{RankingError, Result};
use crate::rating::calculator::{ensure_distinct, RatingUpdater};
use crate::types::{Candidate, RatingChange, RatingTally, RatingUpdate};
use skillratings::elo::{expected_score, EloConfig, EloRating};
use tracing::debug;

/// Elo-based rating updater
#[derive(Debug, Clone)]
pub struct EloRatingUpdater {
    elo_config: EloConfig,
    initial_rating: i64,
}

impl EloRatingUpdater {
    /// Create a new updater from validated configuration
    pub fn new(config: &RatingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            elo_config: EloConfig {
                k: config.k_factor,
            },
            initial_rating: config.initial_rating,
        })
    }

    /// Whole-point gain for the winner, truncated toward zero.
    ///
    /// Computed as `k * (1 - E)` so the result stays within `0..k` however
    /// large the ratings themselves are.
    fn winner_gain(&self, winner_rating: i64, loser_rating: i64) -> i64 {
        let expected = RatingUpdater::expected_score(self, winner_rating, loser_rating);
        (self.elo_config.k * (1.0 - expected)).trunc() as i64
    }
}

fn overflow(candidate: &Candidate, field: &str) -> anyhow::Error {
    RankingError::InvalidOutcome {
        reason: format!("{} of candidate {} would overflow", field, candidate.id),
    }
    .into()
}

impl Default for EloRatingUpdater {
    fn default() -> Self {
        let config = RatingConfig::default();
        Self {
            elo_config: EloConfig {
                k: config.k_factor,
            },
            initial_rating: config.initial_rating,
        }
    }
}

impl RatingUpdater for EloRatingUpdater {
    fn apply_outcome(&self, winner: &Candidate, loser: &Candidate) -> Result<RatingUpdate> {
        ensure_distinct(winner, loser)?;

        let gain = self.winner_gain(winner.rating, loser.rating);

        debug!(
            "Elo update: {} ({}) beats {} ({}), delta {}",
            winner.id, winner.rating, loser.id, loser.rating, gain
        );

        let winner_tally = RatingTally {
            rating: winner
                .rating
                .checked_add(gain)
                .ok_or_else(|| overflow(winner, "rating"))?,
            wins: winner
                .wins
                .checked_add(1)
                .ok_or_else(|| overflow(winner, "wins"))?,
            losses: winner.losses,
            rating_count: winner
                .rating_count
                .checked_add(1)
                .ok_or_else(|| overflow(winner, "rating_count"))?,
        };
        let loser_tally = RatingTally {
            rating: loser
                .rating
                .checked_sub(gain)
                .ok_or_else(|| overflow(loser, "rating"))?,
            wins: loser.wins,
            losses: loser
                .losses
                .checked_add(1)
                .ok_or_else(|| overflow(loser, "losses"))?,
            rating_count: loser
                .rating_count
                .checked_add(1)
                .ok_or_else(|| overflow(loser, "rating_count"))?,
        };

        Ok(RatingUpdate {
            winner: RatingChange {
                candidate_id: winner.id.clone(),
                old_rating: winner.rating,
                new_tally: winner_tally,
            },
            loser: RatingChange {
                candidate_id: loser.id.clone(),
                old_rating: loser.rating,
                new_tally: loser_tally,
            },
        })
    }

    fn expected_score(&self, rating: i64, opponent: i64) -> f64 {
        let (score, _) = expected_score(
            &EloRating {
                rating: rating as f64,
            },
            &EloRating {
                rating: opponent as f64,
            },
        );
        score
    }

    fn initial_rating(&self) -> i64 {
        self.initial_rating
    }
}
