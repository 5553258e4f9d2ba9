//! Rating system configuration

use crate::error::{RankingError, Result};
use crate::types::DEFAULT_INITIAL_RATING;
use serde::{Deserialize, Serialize};

/// Largest accepted K-factor
pub const MAX_K_FACTOR: f64 = 1000.0;

/// Elo parameters used by the rating updater
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum rating change per comparison
    pub k_factor: f64,
    /// Rating assigned to newly registered candidates
    pub initial_rating: i64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

impl RatingConfig {
    /// Config with a custom K-factor and the default baseline
    pub fn with_k_factor(k_factor: f64) -> Self {
        Self {
            k_factor,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(RankingError::ConfigurationError {
                message: format!("K-factor must be positive and finite, got {}", self.k_factor),
            }
            .into());
        }

        if self.k_factor > MAX_K_FACTOR {
            return Err(RankingError::ConfigurationError {
                message: format!(
                    "K-factor must be at most {}, got {}",
                    MAX_K_FACTOR, self.k_factor
                ),
            }
            .into());
        }

        Ok(())
    }
}
