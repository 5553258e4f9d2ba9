//! Configuration management for the review-ranker engine
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod matchmaking;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, EngineSettings, ServiceSettings};
pub use matchmaking::{MatchmakingConfig, ScanOrder};
pub use rating::RatingConfig;
