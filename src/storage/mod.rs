//! Candidate storage
//!
//! This module defines the repository interface the engine reads and writes
//! through, plus an in-memory implementation.

pub mod memory;
pub mod repository;

// Re-export commonly used types
pub use memory::InMemoryCandidateRepository;
pub use repository::CandidateRepository;

#[cfg(test)]
pub use repository::MockCandidateRepository;
