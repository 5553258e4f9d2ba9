//! Common types used throughout the ranking engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for candidates
pub type CandidateId = String;

/// Baseline rating assigned at intake
pub const DEFAULT_INITIAL_RATING: i64 = 1000;

/// An applicant being ranked by pairwise comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default)]
    pub name: String,
    pub rating: i64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    /// Ids this candidate has already been shown against in the current round
    #[serde(default)]
    pub matches_played: BTreeSet<CandidateId>,
    #[serde(default)]
    pub rating_count: u32,
    /// Optimistic-concurrency version, bumped on every stored write
    #[serde(default)]
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Create a fresh candidate at the given baseline rating
    pub fn new(id: impl Into<CandidateId>, name: impl Into<String>, initial_rating: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            rating: initial_rating,
            wins: 0,
            losses: 0,
            matches_played: BTreeSet::new(),
            rating_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this candidate has already been paired with `other` this round
    pub fn has_played(&self, other: &CandidateId) -> bool {
        self.matches_played.contains(other)
    }

    /// Snapshot of the rating fields written after an outcome
    pub fn tally(&self) -> RatingTally {
        RatingTally {
            rating: self.rating,
            wins: self.wins,
            losses: self.losses,
            rating_count: self.rating_count,
        }
    }
}

/// Rating and win/loss counters persisted together after an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTally {
    pub rating: i64,
    pub wins: u32,
    pub losses: u32,
    pub rating_count: u32,
}

/// A reviewer's verdict on a shown pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub winner_id: CandidateId,
    pub loser_id: CandidateId,
}

impl ComparisonOutcome {
    pub fn new(winner_id: impl Into<CandidateId>, loser_id: impl Into<CandidateId>) -> Self {
        Self {
            winner_id: winner_id.into(),
            loser_id: loser_id.into(),
        }
    }
}

/// Pair selected for the next comparison.
///
/// Both candidates already carry each other's id in `matches_played`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub first: Candidate,
    pub second: Candidate,
    pub rating_difference: i64,
}

impl CandidatePair {
    /// Ids of the pair in selection order
    pub fn ids(&self) -> (&CandidateId, &CandidateId) {
        (&self.first.id, &self.second.id)
    }

    /// Whether the pair consists of exactly these two ids, in either order
    pub fn is_pair_of(&self, a: &str, b: &str) -> bool {
        (self.first.id == a && self.second.id == b) || (self.first.id == b && self.second.id == a)
    }
}

/// Rating change for one side of an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub candidate_id: CandidateId,
    pub old_rating: i64,
    pub new_tally: RatingTally,
}

impl RatingChange {
    pub fn new_rating(&self) -> i64 {
        self.new_tally.rating
    }

    pub fn delta(&self) -> i64 {
        self.new_tally.rating - self.old_rating
    }
}

/// New state for both sides of a recorded outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub winner: RatingChange,
    pub loser: RatingChange,
}

impl RatingUpdate {
    /// `(new_winner_rating, new_loser_rating)`
    pub fn new_ratings(&self) -> (i64, i64) {
        (self.winner.new_rating(), self.loser.new_rating())
    }
}
