//! In-process compute engine keeping one append-only series per symbol.

use std::collections::HashMap;

use tracing::debug;

use super::stats::{self, SeriesPoint};
use super::{ComputeEngine, Lookback, PriceField};
use crate::error::{PipelineError, Result};
use crate::models::normalized::{EngineBar, EngineTick, PriceBatch};
use crate::models::price::PriceKind;

#[derive(Debug, Clone)]
enum Series {
    Bars(Vec<EngineBar>),
    Ticks(Vec<EngineTick>),
}

impl Series {
    fn len(&self) -> usize {
        match self {
            Series::Bars(bars) => bars.len(),
            Series::Ticks(ticks) => ticks.len(),
        }
    }

    fn kind(&self) -> PriceKind {
        match self {
            Series::Bars(_) => PriceKind::Bar,
            Series::Ticks(_) => PriceKind::Tick,
        }
    }
}

#[derive(Debug, Default)]
pub struct SeriesEngine {
    series: HashMap<String, Series>,
    appends: usize,
}

impl SeriesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn kind(&self, symbol: &str) -> Option<PriceKind> {
        self.series.get(symbol).map(Series::kind)
    }

    /// Number of append calls received so far, across all symbols
    pub fn append_count(&self) -> usize {
        self.appends
    }

    pub fn bars(&self, symbol: &str) -> Option<&[EngineBar]> {
        match self.series.get(symbol) {
            Some(Series::Bars(bars)) => Some(bars),
            _ => None,
        }
    }

    pub fn ticks(&self, symbol: &str) -> Option<&[EngineTick]> {
        match self.series.get(symbol) {
            Some(Series::Ticks(ticks)) => Some(ticks),
            _ => None,
        }
    }

    /// Copy of everything loaded for `symbol`, as a single batch
    pub fn price_batch(&self, symbol: &str) -> Option<PriceBatch> {
        self.series.get(symbol).map(|series| match series {
            Series::Bars(bars) => PriceBatch::Bars(bars.clone()),
            Series::Ticks(ticks) => PriceBatch::Ticks(ticks.clone()),
        })
    }

    fn window_values(
        &self,
        symbol: &str,
        field: PriceField,
        index_from: usize,
        index_to: usize,
        lookback: Lookback,
    ) -> Result<Vec<f64>> {
        let series = self
            .series
            .get(symbol)
            .ok_or_else(|| PipelineError::engine(format!("no prices loaded for '{}'", symbol)))?;

        let len = series.len();
        if index_from > index_to || index_to >= len {
            return Err(PipelineError::engine(format!(
                "index range [{}, {}] out of bounds for '{}' ({} prices)",
                index_from, index_to, symbol, len
            )));
        }

        let values = match series {
            Series::Bars(bars) => stats::window_values(&bars[index_from..=index_to], field, lookback),
            Series::Ticks(ticks) => {
                stats::window_values(&ticks[index_from..=index_to], field, lookback)
            }
        };
        if values.is_empty() {
            return Err(PipelineError::engine(format!(
                "empty lookback {:?} for '{}'",
                lookback, symbol
            )));
        }
        Ok(values)
    }
}

fn extend_checked<P: SeriesPoint>(symbol: &str, existing: &mut Vec<P>, batch: Vec<P>) -> Result<()> {
    let mut last = existing.last().map(|p| p.time_stamp());
    for point in &batch {
        if let Some(previous) = last {
            if point.time_stamp() <= previous {
                return Err(PipelineError::engine(format!(
                    "out-of-order price for '{}': {} after {}",
                    symbol,
                    point.time_stamp(),
                    previous
                )));
            }
        }
        last = Some(point.time_stamp());
    }
    existing.extend(batch);
    Ok(())
}

impl ComputeEngine for SeriesEngine {
    fn append_prices(&mut self, symbol: &str, batch: PriceBatch) -> Result<()> {
        let count = batch.len();
        match self.series.get_mut(symbol) {
            Some(existing) => match (existing, batch) {
                (Series::Bars(existing), PriceBatch::Bars(bars)) => {
                    extend_checked(symbol, existing, bars)?
                }
                (Series::Ticks(existing), PriceBatch::Ticks(ticks)) => {
                    extend_checked(symbol, existing, ticks)?
                }
                (existing, _) => {
                    return Err(PipelineError::engine(format!(
                        "'{}' already holds a {} series",
                        symbol,
                        existing.kind()
                    )))
                }
            },
            None => {
                let series = match batch {
                    PriceBatch::Bars(bars) => {
                        let mut series = Vec::with_capacity(bars.len());
                        extend_checked(symbol, &mut series, bars)?;
                        Series::Bars(series)
                    }
                    PriceBatch::Ticks(ticks) => {
                        let mut series = Vec::with_capacity(ticks.len());
                        extend_checked(symbol, &mut series, ticks)?;
                        Series::Ticks(series)
                    }
                };
                self.series.insert(symbol.to_string(), series);
            }
        }

        self.appends += 1;
        debug!(symbol = %symbol, count = count, "appended {} prices for {}", count, symbol);
        Ok(())
    }

    fn series_len(&self, symbol: &str) -> usize {
        self.series.get(symbol).map(Series::len).unwrap_or(0)
    }

    fn rolling_mean(
        &self,
        symbol: &str,
        field: PriceField,
        index_from: usize,
        index_to: usize,
        lookback: Lookback,
    ) -> Result<f64> {
        let values = self.window_values(symbol, field, index_from, index_to, lookback)?;
        stats::mean(&values).ok_or_else(|| PipelineError::engine("mean of an empty window"))
    }

    fn rolling_std_dev(
        &self,
        symbol: &str,
        field: PriceField,
        index_from: usize,
        index_to: usize,
        lookback: Lookback,
        mean: f64,
    ) -> Result<f64> {
        let values = self.window_values(symbol, field, index_from, index_to, lookback)?;
        stats::std_dev(&values, mean)
            .ok_or_else(|| PipelineError::engine("standard deviation of an empty window"))
    }
}
