//! Metrics for the review-ranker engine
//!
//! This module provides Prometheus metrics collection for pair selection,
//! rating updates and concurrency conflicts.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RankingMetrics, ResetReason};
