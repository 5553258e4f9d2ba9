//! Pair selection for the next comparison
//!
//! The closest-rating matchmaker examines every unordered pair of the pool
//! once, skips pairs already shown this round, and picks the smallest rating
//! difference. The scan is O(n²) per call, which is fine for review pools of
//! tens to low hundreds of candidates.

use crate::config::{MatchmakingConfig, ScanOrder};
use crate::error::{RankingError, Result};
use crate::matchmaking::history::{
    already_paired, is_exhausted, record_pairing, reset_all_histories,
};
use crate::types::{Candidate, CandidatePair};
use crate::utils::rating_difference;
use std::cmp::Reverse;
use tracing::debug;

/// Result of a pair selection
#[derive(Debug, Clone, PartialEq)]
pub enum PairSelection {
    /// Pair to show next; both sides already list each other as played
    Matched(CandidatePair),
    /// Every pair was already shown. Carries the whole pool with cleared
    /// histories, which the caller must persist before failing the request.
    Exhausted { reset: Vec<Candidate> },
}

/// Trait for pair selection algorithms
pub trait Matchmaker: Send + Sync {
    /// Select the next pair to compare from the full candidate pool
    fn select_pair(&self, candidates: &[Candidate]) -> Result<PairSelection>;
}

/// Closest-rating matchmaker
#[derive(Debug, Clone, Default)]
pub struct ClosestRatingMatchmaker {
    config: MatchmakingConfig,
}

impl ClosestRatingMatchmaker {
    pub fn new(config: MatchmakingConfig) -> Self {
        Self { config }
    }

    /// Indices of `candidates` in scan order
    fn scan_order(&self, candidates: &[Candidate]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        if self.config.scan_order == ScanOrder::RatingDescending {
            // sort_by_key is stable, equal ratings keep pool order
            order.sort_by_key(|&i| Reverse(candidates[i].rating));
        }
        order
    }

    /// Closest unplayed pair as `(first, second, difference)`, first in scan order
    fn closest_unplayed(&self, candidates: &[Candidate]) -> Option<(usize, usize, i64)> {
        let order = self.scan_order(candidates);
        let mut best: Option<(usize, usize, i64)> = None;

        for (pos, &i) in order.iter().enumerate() {
            for &j in &order[pos + 1..] {
                let (a, b) = (&candidates[i], &candidates[j]);
                if a.id == b.id || already_paired(a, b) {
                    continue;
                }

                let diff = rating_difference(a.rating, b.rating);
                // strict comparison keeps the first pair scanned on ties
                if best.map_or(true, |(_, _, best_diff)| diff < best_diff) {
                    best = Some((i, j, diff));
                }
            }
        }

        best
    }
}

impl Matchmaker for ClosestRatingMatchmaker {
    fn select_pair(&self, candidates: &[Candidate]) -> Result<PairSelection> {
        if candidates.len() < 2 {
            return Err(RankingError::InsufficientCandidates {
                available: candidates.len(),
            }
            .into());
        }

        match self.closest_unplayed(candidates) {
            Some((i, j, rating_difference)) => {
                let mut first = candidates[i].clone();
                let mut second = candidates[j].clone();
                record_pairing(&mut first, &mut second);

                Ok(PairSelection::Matched(CandidatePair {
                    first,
                    second,
                    rating_difference,
                }))
            }
            None => {
                debug_assert!(is_exhausted(candidates));
                debug!(
                    "No unplayed pair among {} candidates, history exhausted",
                    candidates.len()
                );
                Ok(PairSelection::Exhausted {
                    reset: reset_all_histories(candidates.to_vec()),
                })
            }
        }
    }
}

/// Candidates with the fewest applied ratings, ties in pool order
pub fn least_reviewed(candidates: &[Candidate], limit: usize) -> Vec<Candidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|c| c.rating_count);
    sorted.truncate(limit);
    sorted
}

/// Leaderboard order: rating descending, ties in pool order
pub fn standings(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|c| Reverse(c.rating));
    sorted
}
