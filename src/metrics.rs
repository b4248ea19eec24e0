//! Prometheus counters for ingestion and signal runs

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{PipelineError, Result};

pub struct Metrics {
    registry: Registry,
    pub price_records_ingested: IntCounterVec,
    pub price_batches_flushed: IntCounterVec,
    pub signals_filtered: IntCounter,
    pub signals_generated: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let price_records_ingested = IntCounterVec::new(
            Opts::new(
                "price_records_ingested_total",
                "Price records forwarded to the compute engine",
            ),
            &["symbol", "kind"],
        )
        .map_err(metrics_error)?;
        let price_batches_flushed = IntCounterVec::new(
            Opts::new(
                "price_batches_flushed_total",
                "Price batches appended to the compute engine",
            ),
            &["symbol"],
        )
        .map_err(metrics_error)?;
        let signals_filtered = IntCounter::new(
            "signals_filtered_total",
            "Signals dropped because of non-numeric take-profit targets",
        )
        .map_err(metrics_error)?;
        let signals_generated = IntCounterVec::new(
            Opts::new("signals_generated_total", "Band-crossing signals emitted"),
            &["symbol", "action"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(price_records_ingested.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(price_batches_flushed.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(signals_filtered.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(signals_generated.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            price_records_ingested,
            price_batches_flushed,
            signals_filtered,
            signals_generated,
        })
    }

    /// Render all registered metrics in the text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

fn metrics_error(e: prometheus::Error) -> PipelineError {
    PipelineError::Config(format!("metrics: {}", e))
}
