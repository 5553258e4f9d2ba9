//! Rating system integration using the Elo algorithm
//!
//! This module provides the rating updater trait and an Elo implementation
//! backed by the skillratings crate.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::RatingUpdater;
pub use elo::EloRatingUpdater;
