//! Signal generation run: load a symbol's bars, ingest them, scan for band
//! crossings and persist the result.

use futures_util::TryStreamExt;
use tracing::{info, warn};

use crate::db::{price_stream, PriceQuery};
use crate::engine::ComputeEngine;
use crate::error::{PipelineError, Result};
use crate::jobs::context::RunContext;
use crate::models::price::{PriceBar, PriceKind, PriceRecord};
use crate::pipeline::PriceIngestor;
use crate::signals::BandCrossingGenerator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub symbol: String,
    pub bars: usize,
    pub batches: usize,
    pub signals_generated: usize,
    pub signals_stored: usize,
}

pub struct GenerationJob<'c> {
    ctx: &'c RunContext,
}

impl<'c> GenerationJob<'c> {
    pub fn new(ctx: &'c RunContext) -> Self {
        Self { ctx }
    }

    pub async fn run<E: ComputeEngine + ?Sized>(
        &self,
        engine: &mut E,
        symbol: &str,
    ) -> Result<GenerationReport> {
        let config = &self.ctx.config;
        let mut report = GenerationReport {
            symbol: symbol.to_string(),
            ..GenerationReport::default()
        };

        let records: Vec<PriceRecord> = price_stream(
            self.ctx.store.as_ref(),
            symbol,
            PriceKind::Bar,
            PriceQuery::all(),
            config.page_size,
        )
        .try_collect()
        .await?;

        let bars = records
            .iter()
            .map(|record| match record {
                PriceRecord::Bar(bar) => Ok(bar.clone()),
                PriceRecord::Tick(_) => Err(PipelineError::invalid_input(format!(
                    "band crossing needs bars, '{}' returned ticks",
                    symbol
                ))),
            })
            .collect::<Result<Vec<PriceBar>>>()?;

        if bars.is_empty() {
            warn!(symbol = %symbol, "No bars stored for {}, nothing to generate", symbol);
            return Ok(report);
        }
        report.bars = bars.len();

        let base_index = engine.series_len(symbol);
        let ingest = PriceIngestor::new(&mut *engine)
            .with_batch_size(config.batch_size)
            .with_caching(config.caching)
            .with_metrics(self.ctx.metrics.clone())
            .ingest_records(symbol, records, None)?;
        report.batches = ingest.batches;

        let signals = BandCrossingGenerator::new(config.band.clone())
            .with_metrics(self.ctx.metrics.clone())
            .generate(&*engine, symbol, base_index, &bars)?;
        report.signals_generated = signals.len();

        if !signals.is_empty() {
            report.signals_stored = self.ctx.store.insert_signals(&signals).await?;
        }

        info!(
            symbol = %symbol,
            bars = report.bars,
            generated = report.signals_generated,
            stored = report.signals_stored,
            "Generation run for {} stored {} of {} signals",
            symbol,
            report.signals_stored,
            report.signals_generated
        );
        Ok(report)
    }
}
