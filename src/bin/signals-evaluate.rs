//! Signal evaluation preparation
//!
//! Validates every stored signal, loads the prices each symbol needs into
//! the compute engine and writes the scorer request, prepared prices
//! included, as JSON.
//!
//! Environment:
//! - BACKTEST_CONFIG: path to a JSON file with `conditions` and `strategy_rules` (required)
//! - EVALUATION_OUTPUT: output file for the request (stdout when unset)

use backtestlab::config::{self, PipelineConfig};
use backtestlab::db::{MarketStore, QuestDatabase};
use backtestlab::engine::SeriesEngine;
use backtestlab::jobs::{BacktestConfig, EvaluationJob, RunContext};
use backtestlab::logging;
use backtestlab::metrics::Metrics;
use dotenvy::dotenv;
use std::env;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let environment = config::get_environment();
    info!("Starting signal evaluation");
    info!(environment = %environment, "Environment");

    let config_path = env::var("BACKTEST_CONFIG")
        .map_err(|_| "BACKTEST_CONFIG must point to a backtest configuration file")?;
    let backtest = BacktestConfig::from_file(&config_path)?;
    info!(
        path = %config_path,
        sources = backtest.strategy_rules.len(),
        "Loaded backtest configuration for {} sources",
        backtest.strategy_rules.len()
    );

    let pipeline_config = PipelineConfig::from_env()?;
    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing QuestDB connection...");
    let database = match QuestDatabase::new().await {
        Ok(db) => {
            info!("QuestDB connected");
            db
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to QuestDB");
            return Err(format!("QuestDB connection required for signal evaluation: {}", e).into());
        }
    };
    let store: Arc<dyn MarketStore> = Arc::new(database);

    let ctx = RunContext::new(store, pipeline_config, Some(metrics.clone()));
    let mut engine = SeriesEngine::new();

    let prepared = EvaluationJob::new(&ctx).prepare(&mut engine).await?;
    for symbol in &prepared.symbols {
        info!(
            symbol = %symbol.window.symbol,
            signals = symbol.signals,
            prices = symbol.ingest.records,
            batches = symbol.ingest.batches,
            aligned = symbol.aligned,
            "Prepared {} ({} signals, {} prices)",
            symbol.window.symbol,
            symbol.signals,
            symbol.ingest.records
        );
    }
    info!(
        signals = prepared.signals.len(),
        dropped = prepared.dropped,
        "Prepared {} signals ({} dropped)",
        prepared.signals.len(),
        prepared.dropped
    );

    let request = prepared.into_request(backtest, &engine);
    let body = serde_json::to_string_pretty(&request)?;
    match env::var("EVALUATION_OUTPUT") {
        Ok(path) => {
            std::fs::write(&path, body)?;
            info!(path = %path, "Evaluation request written to {}", path);
        }
        Err(_) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    let exposition = metrics.gather_text()?;
    debug!(metrics = %exposition, "Run metrics");
    Ok(())
}
