//! Batched price ingestion into the compute engine.
//!
//! Records are converted as they arrive and buffered per symbol. Whenever
//! the buffer reaches the batch size it is appended to the engine as one
//! unit and cleared; whatever is left at end of stream is appended
//! unconditionally. Peak memory is bounded by the batch size, not by the
//! length of the series.

use std::sync::Arc;

use futures_util::{pin_mut, Stream, TryStreamExt};
use tracing::{debug, info};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::engine::ComputeEngine;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::models::normalized::{EngineBar, EngineTick, PriceBatch};
use crate::models::price::{PriceKind, PriceRecord};
use crate::pipeline::convert::{bar_to_engine, quote_to_engine};
use crate::pipeline::sentiment::SentimentAligner;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub records: usize,
    pub batches: usize,
    pub largest_batch: usize,
}

/// Converted records waiting for the next flush. Holds a single kind at a time.
#[derive(Debug, Default)]
struct BatchAccumulator {
    pending: Option<PriceBatch>,
}

impl BatchAccumulator {
    fn kind(&self) -> Option<PriceKind> {
        match self.pending {
            Some(PriceBatch::Bars(_)) => Some(PriceKind::Bar),
            Some(PriceBatch::Ticks(_)) => Some(PriceKind::Tick),
            None => None,
        }
    }

    fn len(&self) -> usize {
        self.pending.as_ref().map(PriceBatch::len).unwrap_or(0)
    }

    fn push_bar(&mut self, bar: EngineBar) {
        match &mut self.pending {
            Some(PriceBatch::Bars(bars)) => bars.push(bar),
            _ => self.pending = Some(PriceBatch::Bars(vec![bar])),
        }
    }

    fn push_tick(&mut self, tick: EngineTick) {
        match &mut self.pending {
            Some(PriceBatch::Ticks(ticks)) => ticks.push(tick),
            _ => self.pending = Some(PriceBatch::Ticks(vec![tick])),
        }
    }

    fn take(&mut self) -> Option<PriceBatch> {
        self.pending.take()
    }
}

pub struct PriceIngestor<'e, E: ComputeEngine + ?Sized> {
    engine: &'e mut E,
    batch_size: usize,
    caching: bool,
    metrics: Option<Arc<Metrics>>,
}

impl<'e, E: ComputeEngine + ?Sized> PriceIngestor<'e, E> {
    pub fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            batch_size: DEFAULT_BATCH_SIZE,
            caching: true,
            metrics: None,
        }
    }

    /// Batch size is clamped to at least one record.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// `false` disables intermediate flushes: the whole series goes to the
    /// engine in one append at end of stream.
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Stream `records` (ascending, one symbol) into the engine. Tick
    /// records get their sentiment from `aligner` when one is given and
    /// must already carry one otherwise.
    pub async fn ingest<S>(
        &mut self,
        symbol: &str,
        records: S,
        mut aligner: Option<&mut SentimentAligner>,
    ) -> Result<IngestReport>
    where
        S: Stream<Item = Result<PriceRecord>>,
    {
        pin_mut!(records);
        let mut accumulator = BatchAccumulator::default();
        let mut report = IngestReport::default();

        while let Some(record) = records.try_next().await? {
            self.accept(
                symbol,
                &mut accumulator,
                record,
                aligner.as_deref_mut(),
                &mut report,
            )?;
        }
        self.flush(symbol, &mut accumulator, &mut report)?;

        info!(
            symbol = %symbol,
            records = report.records,
            batches = report.batches,
            "ingested {} prices for {} in {} batches",
            report.records,
            symbol,
            report.batches
        );
        Ok(report)
    }

    /// Same as [`PriceIngestor::ingest`] for an already materialized series.
    pub fn ingest_records<I>(
        &mut self,
        symbol: &str,
        records: I,
        mut aligner: Option<&mut SentimentAligner>,
    ) -> Result<IngestReport>
    where
        I: IntoIterator<Item = PriceRecord>,
    {
        let mut accumulator = BatchAccumulator::default();
        let mut report = IngestReport::default();

        for record in records {
            self.accept(
                symbol,
                &mut accumulator,
                record,
                aligner.as_deref_mut(),
                &mut report,
            )?;
        }
        self.flush(symbol, &mut accumulator, &mut report)?;
        Ok(report)
    }

    fn accept(
        &mut self,
        symbol: &str,
        accumulator: &mut BatchAccumulator,
        record: PriceRecord,
        aligner: Option<&mut SentimentAligner>,
        report: &mut IngestReport,
    ) -> Result<()> {
        if accumulator.kind().is_some_and(|kind| kind != record.kind()) {
            self.flush(symbol, accumulator, report)?;
        }

        match record {
            PriceRecord::Bar(bar) => accumulator.push_bar(bar_to_engine(&bar)),
            PriceRecord::Tick(mut quote) => {
                if let Some(aligner) = aligner {
                    aligner.assign(&mut quote);
                }
                accumulator.push_tick(quote_to_engine(&quote)?);
            }
        }
        report.records += 1;

        if self.caching && accumulator.len() >= self.batch_size {
            self.flush(symbol, accumulator, report)?;
        }
        Ok(())
    }

    fn flush(
        &mut self,
        symbol: &str,
        accumulator: &mut BatchAccumulator,
        report: &mut IngestReport,
    ) -> Result<()> {
        let Some(batch) = accumulator.take() else {
            return Ok(());
        };
        if batch.is_empty() {
            return Ok(());
        }

        let size = batch.len();
        let kind = match batch {
            PriceBatch::Bars(_) => PriceKind::Bar,
            PriceBatch::Ticks(_) => PriceKind::Tick,
        };
        self.engine.append_prices(symbol, batch)?;

        report.batches += 1;
        report.largest_batch = report.largest_batch.max(size);
        if let Some(ref metrics) = self.metrics {
            metrics
                .price_records_ingested
                .with_label_values(&[symbol, kind.as_str()])
                .inc_by(size as u64);
            metrics
                .price_batches_flushed
                .with_label_values(&[symbol])
                .inc();
        }
        debug!(symbol = %symbol, size = size, kind = %kind, "flushed batch of {} {} prices", size, kind);
        Ok(())
    }
}
