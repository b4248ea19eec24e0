//! Volatility band crossing generator
//!
//! Upper Band = mean + K * sd
//! Lower Band = mean - K * sd
//!
//! A close below the lower band emits a sell targeting the upper band, a
//! close above the upper band emits a buy targeting the lower band. The
//! stop loss sits half a band width (sd * K / 2) away from the close.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::BandConfig;
use crate::engine::{ComputeEngine, Lookback, PriceField};
use crate::error::{PipelineError, Result};
use crate::metrics::Metrics;
use crate::models::price::PriceBar;
use crate::models::signal::{SignalAction, StoredSignal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub action: SignalAction,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Classify one close against the bands around `mean`.
pub fn evaluate_crossing(close: f64, mean: f64, std_dev: f64, factor: f64) -> Option<Crossing> {
    let upper = mean + factor * std_dev;
    let lower = mean - factor * std_dev;
    let offset = std_dev * factor / 2.0;

    if close < lower {
        Some(Crossing {
            action: SignalAction::Sell,
            stop_loss: close - offset,
            take_profit: upper,
        })
    } else if close > upper {
        Some(Crossing {
            action: SignalAction::Buy,
            stop_loss: close + offset,
            take_profit: lower,
        })
    } else {
        None
    }
}

pub struct BandCrossingGenerator {
    config: BandConfig,
    metrics: Option<Arc<Metrics>>,
}

impl BandCrossingGenerator {
    pub fn new(config: BandConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    /// Scan `bars` for band crossings.
    ///
    /// `bars` must already be appended to `engine` for `symbol`, with
    /// `bars[0]` at engine index `base_index`. Statistics for bar `i` cover
    /// the `window` samples ending at engine index `base_index + i`.
    pub fn generate<E: ComputeEngine + ?Sized>(
        &self,
        engine: &E,
        symbol: &str,
        base_index: usize,
        bars: &[PriceBar],
    ) -> Result<Vec<StoredSignal>> {
        let window = self.config.window;
        if window == 0 {
            return Err(PipelineError::invalid_input("band window must be > 0"));
        }
        let loaded = engine.series_len(symbol);
        if base_index + bars.len() > loaded {
            return Err(PipelineError::invalid_input(format!(
                "{} bars at index {} exceed the {} prices loaded for '{}'",
                bars.len(),
                base_index,
                loaded,
                symbol
            )));
        }

        let mut signals = Vec::new();
        for (i, bar) in bars.iter().enumerate().skip(self.config.start_index()) {
            let index_to = base_index + i;
            let index_from = (index_to + 1).saturating_sub(window);
            let lookback = Lookback::Samples(window);

            let mean = engine.rolling_mean(symbol, PriceField::BID_CLOSE, index_from, index_to, lookback)?;
            let std_dev = engine.rolling_std_dev(
                symbol,
                PriceField::BID_CLOSE,
                index_from,
                index_to,
                lookback,
                mean,
            )?;

            let Some(crossing) = evaluate_crossing(bar.close, mean, std_dev, self.config.std_dev_factor)
            else {
                continue;
            };
            if !(crossing.stop_loss.is_finite() && crossing.take_profit.is_finite()) {
                warn!(
                    symbol = %symbol,
                    close = bar.close,
                    mean = mean,
                    std_dev = std_dev,
                    "skipping crossing at {} with non-finite targets",
                    bar.timestamp
                );
                continue;
            }

            debug!(
                symbol = %symbol,
                action = %crossing.action,
                close = bar.close,
                mean = mean,
                std_dev = std_dev,
                "band crossing at {}",
                bar.timestamp
            );
            if let Some(ref metrics) = self.metrics {
                metrics
                    .signals_generated
                    .with_label_values(&[symbol, crossing.action.as_str()])
                    .inc();
            }
            signals.push(StoredSignal::new(
                symbol,
                crossing.action,
                crossing.stop_loss,
                &[crossing.take_profit],
                self.config.source.clone(),
                bar.timestamp,
            ));
        }

        info!(
            symbol = %symbol,
            bars = bars.len(),
            signals = signals.len(),
            "generated {} {} signals from {} bars",
            signals.len(),
            self.config.source,
            bars.len()
        );
        Ok(signals)
    }
}
