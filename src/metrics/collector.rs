//! Metrics collection using Prometheus
//!
//! This module records pair selections, history resets, outcomes and
//! optimistic-lock conflicts for the ranking engine.

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why the match history was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// No unplayed pair was left when a pair was requested
    Exhaustion,
    /// Reset requested directly, e.g. to start a new review round
    Administrative,
}

impl ResetReason {
    fn as_label(&self) -> &'static str {
        match self {
            ResetReason::Exhaustion => "exhaustion",
            ResetReason::Administrative => "administrative",
        }
    }
}

/// Main metrics collector for the ranking engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Ranking metrics
    ranking_metrics: RankingMetrics,
}

/// Ranking-related metrics
#[derive(Clone)]
pub struct RankingMetrics {
    /// Pairs handed out for comparison
    pub pairs_selected_total: IntCounter,

    /// Match history resets by reason
    pub history_resets_total: IntCounterVec,

    /// Outcomes applied to ratings
    pub outcomes_recorded_total: IntCounter,

    /// Optimistic-lock conflicts by operation
    pub conflicts_total: IntCounterVec,

    /// Engine operation durations
    pub operation_duration: HistogramVec,

    /// Rating points moved per outcome
    pub rating_delta: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let ranking_metrics = RankingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            ranking_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get ranking metrics
    pub fn ranking(&self) -> &RankingMetrics {
        &self.ranking_metrics
    }

    /// Record a pair being handed out
    pub fn record_pair_selected(&self, duration: Duration) {
        self.ranking_metrics.pairs_selected_total.inc();
        self.record_operation("select_pair", duration);
    }

    /// Record a match history reset
    pub fn record_history_reset(&self, reason: ResetReason) {
        self.ranking_metrics
            .history_resets_total
            .with_label_values(&[reason.as_label()])
            .inc();
    }

    /// Record an outcome applied to ratings
    pub fn record_outcome(&self, rating_delta: i64, duration: Duration) {
        self.ranking_metrics.outcomes_recorded_total.inc();
        self.ranking_metrics
            .rating_delta
            .observe(rating_delta.unsigned_abs() as f64);
        self.record_operation("record_outcome", duration);
    }

    /// Record a version conflict that forced a re-read
    pub fn record_conflict(&self, operation: &str) {
        self.ranking_metrics
            .conflicts_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record an engine operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.ranking_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RankingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let pairs_selected_total = IntCounter::new(
            "review_ranker_pairs_selected_total",
            "Pairs handed out for comparison",
        )?;
        registry.register(Box::new(pairs_selected_total.clone()))?;

        let history_resets_total = IntCounterVec::new(
            Opts::new(
                "review_ranker_history_resets_total",
                "Match history resets",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(history_resets_total.clone()))?;

        let outcomes_recorded_total = IntCounter::new(
            "review_ranker_outcomes_recorded_total",
            "Comparison outcomes applied to ratings",
        )?;
        registry.register(Box::new(outcomes_recorded_total.clone()))?;

        let conflicts_total = IntCounterVec::new(
            Opts::new(
                "review_ranker_conflicts_total",
                "Optimistic-lock conflicts",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(conflicts_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "review_ranker_operation_duration_seconds",
                "Engine operation duration",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new(
                "review_ranker_rating_delta",
                "Rating points moved per outcome",
            )
            .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 24.0, 32.0, 64.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        Ok(Self {
            pairs_selected_total,
            history_resets_total,
            outcomes_recorded_total,
            conflicts_total,
            operation_duration,
            rating_delta,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
