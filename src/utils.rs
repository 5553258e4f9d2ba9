//! Utility functions for the ranking engine

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique candidate ID
pub fn generate_candidate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: i64, rating2: i64) -> i64 {
    (rating1 - rating2).abs()
}
