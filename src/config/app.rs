//! Main application configuration
//!
//! This module defines the primary configuration structures for the ranking
//! engine, including environment variable and TOML file loading and validation.

use crate::config::matchmaking::{MatchmakingConfig, ScanOrder};
use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub matchmaking: MatchmakingConfig,
    pub engine: EngineSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Engine concurrency and storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound on any single repository call
    pub repository_timeout_ms: u64,
    /// How many times a stale read is re-fetched before the conflict surfaces
    pub max_conflict_retries: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "review-ranker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            repository_timeout_ms: 10_000,
            max_conflict_retries: 3,
        }
    }
}

impl EngineSettings {
    /// Get repository timeout as Duration
    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repository_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a TOML file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.service.log_level = log_level;
        }

        // Rating settings
        if let Some(k) = lookup("ELO_K_FACTOR") {
            config.rating.k_factor = k
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", k))?;
        }
        if let Some(initial) = lookup("INITIAL_RATING") {
            config.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_RATING value: {}", initial))?;
        }

        // Matchmaking settings
        if let Some(order) = lookup("PAIR_SCAN_ORDER") {
            config.matchmaking.scan_order = order
                .parse::<ScanOrder>()
                .map_err(|e| anyhow!("Invalid PAIR_SCAN_ORDER value: {}", e))?;
        }

        // Engine settings
        if let Some(timeout) = lookup("REPOSITORY_TIMEOUT_MS") {
            config.engine.repository_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid REPOSITORY_TIMEOUT_MS value: {}", timeout))?;
        }
        if let Some(retries) = lookup("MAX_CONFLICT_RETRIES") {
            config.engine.max_conflict_retries = retries
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_CONFLICT_RETRIES value: {}", retries))?;
        }

        validate_config(&config)?;
        Ok(config)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;

    if config.engine.repository_timeout_ms == 0 {
        return Err(anyhow!("Repository timeout must be greater than 0"));
    }

    Ok(())
}
