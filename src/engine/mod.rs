//! Compute engine boundary.
//!
//! The engine is a stateful, symbol-indexed series store that also answers
//! rolling statistics queries. [`SeriesEngine`] is the in-process
//! implementation; a remote engine only has to implement [`ComputeEngine`].

pub mod scorer;
pub mod series;
pub mod stats;

pub use scorer::{
    BacktestConditions, BacktestMetrics, SignalCheck, SignalScorer, StrategyRule, StrategyRules,
};
pub use series::SeriesEngine;

use crate::error::Result;
use crate::models::normalized::PriceBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ask,
    Bid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ohlc {
    Open,
    High,
    Low,
    Close,
}

/// Which value of a record a statistic reads. Bars ignore the side,
/// ticks ignore the OHLC component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceField {
    pub side: Side,
    pub ohlc: Ohlc,
}

impl PriceField {
    pub const fn new(side: Side, ohlc: Ohlc) -> Self {
        Self { side, ohlc }
    }

    pub const BID_CLOSE: PriceField = PriceField::new(Side::Bid, Ohlc::Close);
}

/// Trailing slice of an index range that a statistic covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookback {
    /// Last `n` samples of the range
    Samples(usize),
    /// Samples no more than this many minutes older than the range end
    Minutes(f64),
}

pub trait ComputeEngine {
    /// Append a batch to the symbol's series. Appends are additive and in order.
    fn append_prices(&mut self, symbol: &str, batch: PriceBatch) -> Result<()>;

    fn series_len(&self, symbol: &str) -> usize;

    /// Mean of `field` over the `lookback` tail of the inclusive index range.
    fn rolling_mean(
        &self,
        symbol: &str,
        field: PriceField,
        index_from: usize,
        index_to: usize,
        lookback: Lookback,
    ) -> Result<f64>;

    /// Population standard deviation around `mean`, same window as
    /// [`ComputeEngine::rolling_mean`].
    fn rolling_std_dev(
        &self,
        symbol: &str,
        field: PriceField,
        index_from: usize,
        index_to: usize,
        lookback: Lookback,
        mean: f64,
    ) -> Result<f64>;
}
