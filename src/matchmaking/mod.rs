//! Matchmaking for pairwise review
//!
//! This module picks which two candidates a reviewer sees next and keeps the
//! per-round match history that prevents repeat pairings.

pub mod history;
pub mod pairing;

// Re-export commonly used types
pub use history::{already_paired, record_pairing, reset_all_histories};
pub use pairing::{least_reviewed, standings, ClosestRatingMatchmaker, Matchmaker, PairSelection};
