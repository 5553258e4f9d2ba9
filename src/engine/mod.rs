//! Ranking engine orchestration
//!
//! This module wires the matchmaker and rating updater to candidate storage
//! and owns the locking, retry and timeout discipline around them.

pub mod locks;
pub mod ranking;

// Re-export commonly used types
pub use locks::{CandidateLocks, LockSet};
pub use ranking::RankingEngine;
