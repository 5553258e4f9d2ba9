//! Ranking engine orchestrating pair selection and rating updates
//!
//! The engine reads candidates through a [`CandidateRepository`], asks the
//! matchmaker or rating updater for the new state and writes it back.
//!
//! Concurrency discipline:
//! - pair selection and history resets are serialized by a single pairing lock;
//! - every candidate write holds that candidate's lock (sorted order, always
//!   taken after the pairing lock);
//! - every write is a compare-and-swap on the candidate version. Stale reads
//!   are retried up to `max_conflict_retries` times, then surface as
//!   [`RankingError::ConcurrentUpdateConflict`];
//! - every repository call is bounded by `repository_timeout_ms`.

use crate::config::{AppConfig, EngineSettings};
use crate::engine::locks::CandidateLocks;
use crate::error::{is_conflict, RankingError, Result};
use crate::matchmaking::{least_reviewed, standings, ClosestRatingMatchmaker, Matchmaker, PairSelection};
use crate::metrics::{MetricsCollector, ResetReason};
use crate::rating::{EloRatingUpdater, RatingUpdater};
use crate::storage::CandidateRepository;
use crate::types::{Candidate, CandidateId, CandidatePair, ComparisonOutcome, RatingUpdate};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// The main ranking engine
pub struct RankingEngine {
    /// Candidate storage
    repository: Arc<dyn CandidateRepository>,
    /// Pair selection algorithm
    matchmaker: Arc<dyn Matchmaker>,
    /// Rating update algorithm
    rating_updater: Arc<dyn RatingUpdater>,
    /// Timeouts and retry limits
    settings: EngineSettings,
    /// Serializes pair selection and history resets
    pairing_lock: Mutex<()>,
    /// Serializes writes per candidate
    candidate_locks: CandidateLocks,
    /// Metrics collector for recording ranking events
    metrics_collector: Arc<MetricsCollector>,
}

impl RankingEngine {
    /// Create an engine with the closest-rating matchmaker and Elo updates
    pub fn new(repository: Arc<dyn CandidateRepository>, config: &AppConfig) -> Result<Self> {
        let metrics_collector = Arc::new(MetricsCollector::new()?);

        Ok(Self::with_components(
            repository,
            Arc::new(ClosestRatingMatchmaker::new(config.matchmaking.clone())),
            Arc::new(EloRatingUpdater::new(&config.rating)?),
            config.engine.clone(),
            metrics_collector,
        ))
    }

    /// Create with custom algorithms, settings and metrics
    pub fn with_components(
        repository: Arc<dyn CandidateRepository>,
        matchmaker: Arc<dyn Matchmaker>,
        rating_updater: Arc<dyn RatingUpdater>,
        settings: EngineSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            repository,
            matchmaker,
            rating_updater,
            settings,
            pairing_lock: Mutex::new(()),
            candidate_locks: CandidateLocks::new(),
            metrics_collector,
        }
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Rating assigned to newly registered candidates
    pub fn initial_rating(&self) -> i64 {
        self.rating_updater.initial_rating()
    }

    /// Select the next pair to compare and mark it as shown.
    ///
    /// When every pair has been shown, all match histories are reset and the
    /// call fails with [`RankingError::AllPairsExhausted`]; the caller retries.
    pub async fn select_comparison_pair(&self) -> Result<CandidatePair> {
        let timer = self.metrics_collector.start_timer();
        let _pairing = self.pairing_lock.lock().await;
        let mut attempt = 0;

        loop {
            let candidates = self
                .bounded("fetch_all", self.repository.fetch_all())
                .await?;

            let pair = match self.matchmaker.select_pair(&candidates)? {
                PairSelection::Matched(pair) => pair,
                PairSelection::Exhausted { reset } => {
                    let count = self
                        .reset_histories_locked(&reset, ResetReason::Exhaustion)
                        .await?;
                    warn!(
                        "All {} candidates have compared against each other, match history reset",
                        count
                    );
                    return Err(RankingError::AllPairsExhausted { reset: count }.into());
                }
            };

            let _locks = self
                .candidate_locks
                .acquire([&pair.first.id, &pair.second.id])
                .await?;

            match self.persist_pairing(pair).await {
                Ok(pair) => {
                    self.metrics_collector.record_pair_selected(timer.stop());
                    info!(
                        "Pair selected: {} ({}) vs {} ({}), difference {}",
                        pair.first.id,
                        pair.first.rating,
                        pair.second.id,
                        pair.second.rating,
                        pair.rating_difference
                    );
                    return Ok(pair);
                }
                Err(e) if is_conflict(&e) => {
                    self.metrics_collector.record_conflict("select_pair");
                    if attempt >= self.settings.max_conflict_retries {
                        warn!("Pair selection gave up after {} conflicts", attempt + 1);
                        return Err(e);
                    }
                    attempt += 1;
                    debug!("Pair selection read stale state ({}), retry {}", e, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a reviewer's verdict to both candidates' ratings and tallies
    pub async fn record_outcome(&self, outcome: &ComparisonOutcome) -> Result<RatingUpdate> {
        if outcome.winner_id == outcome.loser_id {
            return Err(RankingError::InvalidOutcome {
                reason: format!(
                    "winner and loser are the same candidate: {}",
                    outcome.winner_id
                ),
            }
            .into());
        }

        let timer = self.metrics_collector.start_timer();

        // unknown ids fail here, before they reach the lock registry
        self.fetch_existing(&outcome.winner_id).await?;
        self.fetch_existing(&outcome.loser_id).await?;

        let _locks = self
            .candidate_locks
            .acquire([&outcome.winner_id, &outcome.loser_id])
            .await?;
        let mut attempt = 0;

        loop {
            match self.apply_outcome_once(outcome).await {
                Ok(update) => {
                    self.metrics_collector
                        .record_outcome(update.winner.delta(), timer.stop());
                    info!(
                        "Outcome recorded: {} {} -> {}, {} {} -> {}",
                        update.winner.candidate_id,
                        update.winner.old_rating,
                        update.winner.new_rating(),
                        update.loser.candidate_id,
                        update.loser.old_rating,
                        update.loser.new_rating()
                    );
                    return Ok(update);
                }
                Err(e) if is_conflict(&e) => {
                    self.metrics_collector.record_conflict("record_outcome");
                    if attempt >= self.settings.max_conflict_retries {
                        warn!("Outcome update gave up after {} conflicts", attempt + 1);
                        return Err(e);
                    }
                    attempt += 1;
                    debug!("Outcome update read stale state ({}), retry {}", e, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Clear every candidate's match history, e.g. to start a new review round
    pub async fn reset_all_histories(&self) -> Result<usize> {
        let _pairing = self.pairing_lock.lock().await;
        let candidates = self
            .bounded("fetch_all", self.repository.fetch_all())
            .await?;

        self.reset_histories_locked(&candidates, ResetReason::Administrative)
            .await
    }

    /// All candidates, highest rating first
    pub async fn standings(&self) -> Result<Vec<Candidate>> {
        let candidates = self
            .bounded("fetch_all", self.repository.fetch_all())
            .await?;
        Ok(standings(&candidates))
    }

    /// Candidates with the fewest applied ratings
    pub async fn least_reviewed(&self, limit: usize) -> Result<Vec<Candidate>> {
        let candidates = self
            .bounded("fetch_all", self.repository.fetch_all())
            .await?;
        Ok(least_reviewed(&candidates, limit))
    }

    /// Run one repository call under the configured timeout
    async fn bounded<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.settings.repository_timeout(), future).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Repository operation '{}' timed out after {}ms",
                    operation, self.settings.repository_timeout_ms
                );
                Err(RankingError::RepositoryTimeout {
                    operation: operation.to_string(),
                    timeout_ms: self.settings.repository_timeout_ms,
                }
                .into())
            }
        }
    }

    async fn fetch_existing(&self, id: &CandidateId) -> Result<Candidate> {
        self.bounded("fetch_by_id", self.repository.fetch_by_id(id))
            .await?
            .ok_or_else(|| {
                RankingError::CandidateNotFound {
                    candidate_id: id.clone(),
                }
                .into()
            })
    }

    /// Reset histories; caller holds the pairing lock
    async fn reset_histories_locked(
        &self,
        candidates: &[Candidate],
        reason: ResetReason,
    ) -> Result<usize> {
        let _locks = self
            .candidate_locks
            .acquire(candidates.iter().map(|c| &c.id))
            .await?;

        let count = self
            .bounded(
                "reset_all_match_histories",
                self.repository.reset_all_match_histories(),
            )
            .await?;

        self.metrics_collector.record_history_reset(reason);
        info!("Match history reset ({:?}) for {} candidates", reason, count);
        Ok(count)
    }

    /// Write both sides of a selected pair.
    ///
    /// Caller holds both candidates' locks. Fails with a conflict, without
    /// writing, if either candidate changed since the pool was read.
    async fn persist_pairing(&self, mut pair: CandidatePair) -> Result<CandidatePair> {
        for selected in [&pair.first, &pair.second] {
            let stored = self.fetch_existing(&selected.id).await?;
            if stored.version != selected.version {
                return Err(RankingError::ConcurrentUpdateConflict {
                    candidate_id: selected.id.clone(),
                }
                .into());
            }
        }

        let first_version = self
            .bounded(
                "save_match_history",
                self.repository.save_match_history(
                    &pair.first.id,
                    &pair.first.matches_played,
                    pair.first.version,
                ),
            )
            .await?;

        let second_version = match self
            .bounded(
                "save_match_history",
                self.repository.save_match_history(
                    &pair.second.id,
                    &pair.second.matches_played,
                    pair.second.version,
                ),
            )
            .await
        {
            Ok(version) => version,
            Err(e) => {
                // drop the first side again so the history stays symmetric
                let mut previous = pair.first.matches_played.clone();
                previous.remove(&pair.second.id);
                return Err(self
                    .compensate(
                        &pair.first.id,
                        e,
                        self.repository
                            .save_match_history(&pair.first.id, &previous, first_version),
                    )
                    .await);
            }
        };

        pair.first.version = first_version;
        pair.second.version = second_version;
        Ok(pair)
    }

    /// Fetch fresh state, compute the update and write both sides.
    ///
    /// Caller holds both candidates' locks.
    async fn apply_outcome_once(&self, outcome: &ComparisonOutcome) -> Result<RatingUpdate> {
        let winner = self.fetch_existing(&outcome.winner_id).await?;
        let loser = self.fetch_existing(&outcome.loser_id).await?;

        let update = self.rating_updater.apply_outcome(&winner, &loser)?;

        let winner_version = self
            .bounded(
                "save_rating_and_tally",
                self.repository.save_rating_and_tally(
                    &winner.id,
                    &update.winner.new_tally,
                    winner.version,
                ),
            )
            .await?;

        if let Err(e) = self
            .bounded(
                "save_rating_and_tally",
                self.repository.save_rating_and_tally(
                    &loser.id,
                    &update.loser.new_tally,
                    loser.version,
                ),
            )
            .await
        {
            let previous = winner.tally();
            return Err(self
                .compensate(
                    &winner.id,
                    e,
                    self.repository
                        .save_rating_and_tally(&winner.id, &previous, winner_version),
                )
                .await);
        }

        Ok(update)
    }

    /// Undo a first write after the second one failed.
    ///
    /// Returns the error to surface: `cause` when the undo succeeded,
    /// or a non-retryable storage error when the candidate is left half-updated.
    async fn compensate<F>(&self, id: &CandidateId, cause: anyhow::Error, undo: F) -> anyhow::Error
    where
        F: Future<Output = Result<u64>>,
    {
        match self.bounded("compensate", undo).await {
            Ok(_) => cause,
            Err(undo_error) => {
                error!(
                    "Failed to undo partial write on candidate {}: {} (after: {})",
                    id, undo_error, cause
                );
                RankingError::StorageError {
                    message: format!(
                        "candidate {} left partially updated: {}; undo failed: {}",
                        id, cause, undo_error
                    ),
                }
                .into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ranking_error;
    use crate::storage::{InMemoryCandidateRepository, MockCandidateRepository};
    use crate::types::RatingTally;

    fn candidate(id: &str, rating: i64) -> Candidate {
        Candidate::new(id, "", rating)
    }

    fn engine_with(repository: Arc<dyn CandidateRepository>) -> RankingEngine {
        RankingEngine::new(repository, &AppConfig::default()).unwrap()
    }

    fn mock_pool(pool: Vec<Candidate>) -> MockCandidateRepository {
        let mut mock = MockCandidateRepository::new();
        let all = pool.clone();
        mock.expect_fetch_all().returning(move || Ok(all.clone()));
        mock.expect_fetch_by_id()
            .returning(move |id| Ok(pool.iter().find(|c| &c.id == id).cloned()));
        mock
    }

    #[tokio::test]
    async fn test_scenario_pool_selection_sequence() {
        let repository = Arc::new(
            InMemoryCandidateRepository::with_candidates(vec![
                candidate("1", 1000),
                candidate("2", 1000),
                candidate("3", 1200),
            ])
            .unwrap(),
        );
        let engine = engine_with(repository.clone());

        let first = engine.select_comparison_pair().await.unwrap();
        assert!(first.is_pair_of("1", "2"));

        let second = engine.select_comparison_pair().await.unwrap();
        assert!(second.is_pair_of("1", "3"));

        let stored = repository.fetch_by_id(&"1".to_string()).await.unwrap().unwrap();
        assert!(stored.has_played(&"2".to_string()));
        assert!(stored.has_played(&"3".to_string()));
        assert_eq!(engine.metrics().ranking().pairs_selected_total.get(), 2);
    }

    #[tokio::test]
    async fn test_history_write_failure_surfaces() {
        let mut mock = mock_pool(vec![candidate("a", 1100), candidate("b", 1000)]);
        // first write lands, the undo of it lands too
        mock.expect_save_match_history()
            .withf(|id, _, _| id.as_str() == "a")
            .times(2)
            .returning(|_, _, version| Ok(version + 1));
        mock.expect_save_match_history()
            .withf(|id, _, _| id.as_str() == "b")
            .times(1)
            .returning(|_, _, _| {
                Err(RankingError::StorageError {
                    message: "write rejected".to_string(),
                }
                .into())
            });

        let engine = engine_with(Arc::new(mock));
        let err = engine.select_comparison_pair().await.unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::StorageError { message }) if message == "write rejected"
        ));
    }

    #[tokio::test]
    async fn test_failed_undo_reports_partial_write() {
        let mut mock = mock_pool(vec![candidate("w", 1000), candidate("l", 1000)]);
        mock.expect_save_rating_and_tally()
            .withf(|id, tally, _| id.as_str() == "w" && tally.rating == 1016)
            .times(1)
            .returning(|_, _, version| Ok(version + 1));
        mock.expect_save_rating_and_tally()
            .withf(|id, _, _| id.as_str() == "l")
            .times(1)
            .returning(|_, _, _| {
                Err(RankingError::StorageError {
                    message: "loser write rejected".to_string(),
                }
                .into())
            });
        mock.expect_save_rating_and_tally()
            .withf(|id, tally: &RatingTally, _| id.as_str() == "w" && tally.rating == 1000)
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("connection reset")));

        let engine = engine_with(Arc::new(mock));
        let err = engine
            .record_outcome(&ComparisonOutcome::new("w", "l"))
            .await
            .unwrap_err();

        match ranking_error(&err) {
            Some(RankingError::StorageError { message }) => {
                assert!(message.contains("left partially updated"));
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_candidate_not_found() {
        let engine = engine_with(Arc::new(mock_pool(vec![candidate("a", 1000)])));

        let err = engine
            .record_outcome(&ComparisonOutcome::new("a", "ghost"))
            .await
            .unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::CandidateNotFound { candidate_id }) if candidate_id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_do_not_grow_lock_registry() {
        let repository = Arc::new(
            InMemoryCandidateRepository::with_candidates(vec![
                candidate("a", 1000),
                candidate("b", 1000),
            ])
            .unwrap(),
        );
        let engine = engine_with(repository);

        for i in 0..500 {
            let err = engine
                .record_outcome(&ComparisonOutcome::new("a", format!("stale-{}", i)))
                .await
                .unwrap_err();
            assert!(matches!(
                ranking_error(&err),
                Some(RankingError::CandidateNotFound { .. })
            ));
        }
        assert_eq!(engine.candidate_locks.tracked(), 0);

        engine
            .record_outcome(&ComparisonOutcome::new("a", "b"))
            .await
            .unwrap();
        engine.select_comparison_pair().await.unwrap();
        assert_eq!(engine.candidate_locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_persistent_conflict_gives_up() {
        let mut mock = mock_pool(vec![candidate("w", 1000), candidate("l", 1000)]);
        mock.expect_save_rating_and_tally()
            .times(4)
            .returning(|id, _, _| {
                Err(RankingError::ConcurrentUpdateConflict {
                    candidate_id: id.clone(),
                }
                .into())
            });

        let engine = engine_with(Arc::new(mock));
        let err = engine
            .record_outcome(&ComparisonOutcome::new("w", "l"))
            .await
            .unwrap_err();

        assert!(is_conflict(&err));
        assert_eq!(
            engine
                .metrics()
                .ranking()
                .conflicts_total
                .with_label_values(&["record_outcome"])
                .get(),
            4
        );
    }

    #[tokio::test]
    async fn test_self_comparison_rejected_before_storage() {
        // no expectations: any repository call would panic
        let engine = engine_with(Arc::new(MockCandidateRepository::new()));

        let err = engine
            .record_outcome(&ComparisonOutcome::new("a", "a"))
            .await
            .unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::InvalidOutcome { .. })
        ));
    }
}
