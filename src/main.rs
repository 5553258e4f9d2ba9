//! Command line entry point for the review-ranker engine
//!
//! Operates on a JSON file holding the candidate pool: each invocation loads
//! the pool, runs one engine operation and writes the pool back when the
//! operation changed it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use review_ranker::config::AppConfig;
use review_ranker::error::ranking_error;
use review_ranker::storage::{CandidateRepository, InMemoryCandidateRepository};
use review_ranker::utils::generate_candidate_id;
use review_ranker::{Candidate, ComparisonOutcome, RankingEngine, RankingError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Review Ranker - pairwise applicant comparison with Elo ratings
#[derive(Parser)]
#[command(
    name = "review-ranker",
    version,
    about = "Select applicant pairs for review and rank them by Elo rating",
    long_about = "Review Ranker picks the closest-rated pair of applicants that has not been \
                 compared yet, records which one a reviewer preferred, and keeps Elo ratings \
                 and win/loss tallies in a JSON pool file."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Candidate pool file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "candidates.json",
        help = "JSON file holding the candidate pool"
    )]
    pool: PathBuf,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// K-factor override
    #[arg(long, value_name = "K", help = "Override the Elo K-factor")]
    k_factor: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new candidate at the baseline rating
    Add {
        /// Display name
        name: String,
        /// Explicit id (a UUID is generated otherwise)
        #[arg(long)]
        id: Option<String>,
    },
    /// Select the next pair to compare
    Pair,
    /// Record which candidate the reviewer preferred
    Record {
        #[arg(long)]
        winner: String,
        #[arg(long)]
        loser: String,
    },
    /// Clear all match histories to start a new review round
    Reset,
    /// Print every candidate, highest rating first
    Standings,
    /// Print the candidates with the fewest reviews
    LeastReviewed {
        #[arg(long, default_value_t = 2)]
        limit: usize,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(k_factor) = args.k_factor {
        config.rating.k_factor = k_factor;
    }

    review_ranker::config::validate_config(&config)?;
    Ok(config)
}

fn load_pool(path: &Path) -> Result<Vec<Candidate>> {
    if !path.exists() {
        info!("Pool file {} not found, starting empty", path.display());
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse pool file {}", path.display()))
}

async fn save_pool(path: &Path, repository: &InMemoryCandidateRepository) -> Result<()> {
    let candidates = repository.fetch_all().await?;
    let contents = serde_json::to_string_pretty(&candidates)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write pool file {}", path.display()))?;
    info!("Saved {} candidates to {}", candidates.len(), path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let repository = Arc::new(InMemoryCandidateRepository::with_candidates(load_pool(
        &args.pool,
    )?)?);
    if repository.is_empty()? {
        warn!("Candidate pool {} is empty", args.pool.display());
    } else {
        info!("Loaded {} candidates from {}", repository.len()?, args.pool.display());
    }
    let engine = RankingEngine::new(repository.clone(), &config)?;

    match args.command {
        Command::Add { name, id } => {
            let candidate = Candidate::new(
                id.unwrap_or_else(generate_candidate_id),
                name,
                engine.initial_rating(),
            );
            repository.insert(candidate.clone())?;
            save_pool(&args.pool, &repository).await?;
            print_json(&candidate)
        }
        Command::Pair => match engine.select_comparison_pair().await {
            Ok(pair) => {
                save_pool(&args.pool, &repository).await?;
                print_json(&pair)
            }
            Err(e) => {
                if let Some(RankingError::AllPairsExhausted { .. }) = ranking_error(&e) {
                    // the reset is part of the failed call and must be kept
                    save_pool(&args.pool, &repository).await?;
                    warn!("{}; run `pair` again to start the next round", e);
                }
                Err(e)
            }
        },
        Command::Record { winner, loser } => {
            let update = engine
                .record_outcome(&ComparisonOutcome::new(winner, loser))
                .await?;
            save_pool(&args.pool, &repository).await?;
            print_json(&update)
        }
        Command::Reset => {
            let count = engine.reset_all_histories().await?;
            save_pool(&args.pool, &repository).await?;
            print_json(&serde_json::json!({ "reset": count }))
        }
        Command::Standings => print_json(&engine.standings().await?),
        Command::LeastReviewed { limit } => print_json(&engine.least_reviewed(limit).await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "{} v{} (K={}, baseline {})",
        config.service.name,
        review_ranker::VERSION,
        config.rating.k_factor,
        config.rating.initial_rating
    );

    if let Err(e) = run(args, config).await {
        error!("{}", e);
        let code = match ranking_error(&e) {
            Some(kind) if kind.is_client_error() => 2,
            Some(kind) if kind.is_retryable() => 3,
            _ => 1,
        };
        std::process::exit(code);
    }

    Ok(())
}
