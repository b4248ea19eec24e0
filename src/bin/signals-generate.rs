//! Band-crossing signal generation
//!
//! Loads the full bar series of one symbol from QuestDB, scans it for band
//! crossings and stores the resulting signals.
//!
//! Usage: signals-generate <SYMBOL>

use backtestlab::config::{self, PipelineConfig};
use backtestlab::db::{MarketStore, QuestDatabase};
use backtestlab::engine::SeriesEngine;
use backtestlab::jobs::{GenerationJob, RunContext};
use backtestlab::logging;
use backtestlab::metrics::Metrics;
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let symbol = env::args()
        .nth(1)
        .ok_or("usage: signals-generate <SYMBOL>")?;

    let environment = config::get_environment();
    info!("Starting signal generation");
    info!(environment = %environment, "Environment");

    let pipeline_config = PipelineConfig::from_env()?;
    info!(
        window = pipeline_config.band.window,
        factor = pipeline_config.band.std_dev_factor,
        source = %pipeline_config.band.source,
        "Band parameters: window {}, factor {}",
        pipeline_config.band.window,
        pipeline_config.band.std_dev_factor
    );

    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing QuestDB connection...");
    let database = match QuestDatabase::new().await {
        Ok(db) => {
            info!("QuestDB connected");
            db
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to QuestDB");
            return Err(format!("QuestDB connection required for signal generation: {}", e).into());
        }
    };
    let store: Arc<dyn MarketStore> = Arc::new(database);

    let ctx = RunContext::new(store, pipeline_config, Some(metrics.clone()));
    let mut engine = SeriesEngine::new();

    let report = GenerationJob::new(&ctx).run(&mut engine, &symbol).await?;
    info!(
        symbol = %report.symbol,
        bars = report.bars,
        generated = report.signals_generated,
        stored = report.signals_stored,
        "Signal generation finished for {}",
        report.symbol
    );

    let exposition = metrics.gather_text()?;
    debug!(metrics = %exposition, "Run metrics");
    Ok(())
}
