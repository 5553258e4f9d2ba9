//! Review Ranker - pairwise applicant ranking engine
//!
//! This crate selects which two applicants a reviewer compares next and
//! updates their Elo ratings from the reported outcome.

pub mod config;
pub mod engine;
pub mod error;
pub mod matchmaking;
pub mod metrics;
pub mod rating;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankingError, Result};
pub use types::*;

// Re-export key components
pub use engine::RankingEngine;
pub use matchmaking::{ClosestRatingMatchmaker, Matchmaker, PairSelection};
pub use rating::{EloRatingUpdater, RatingUpdater};
pub use storage::{CandidateRepository, InMemoryCandidateRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
