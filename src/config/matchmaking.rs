//! Matchmaking configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which the pair scan walks the candidate pool.
///
/// Ties on rating difference go to the first pair encountered, so the order
/// decides which of several equally close pairs is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Stable sort by descending rating; equal ratings keep pool order
    #[default]
    RatingDescending,
    /// Pool order as returned by the repository
    AsProvided,
}

impl FromStr for ScanOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "rating_descending" | "rating" => Ok(ScanOrder::RatingDescending),
            "as_provided" | "pool" => Ok(ScanOrder::AsProvided),
            other => Err(format!("unknown scan order '{}'", other)),
        }
    }
}

/// Pair selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    pub scan_order: ScanOrder,
}
