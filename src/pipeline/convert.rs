//! Storage record <-> engine record conversion.
//!
//! The forward direction assumes validated input. Its only failure is a
//! quote whose sentiment was never resolved. The reverse direction only
//! fails for timestamps chrono cannot represent.

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result};
use crate::models::normalized::{EngineBar, EngineSignal, EngineTick};
use crate::models::price::{PriceBar, Quote};
use crate::models::signal::StoredSignal;

pub fn to_millis(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

pub fn from_millis(time_stamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(time_stamp).ok_or_else(|| {
        PipelineError::invalid_input(format!("timestamp {} ms is out of range", time_stamp))
    })
}

pub fn bar_to_engine(bar: &PriceBar) -> EngineBar {
    EngineBar {
        time_stamp: to_millis(&bar.timestamp),
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
    }
}

pub fn bars_to_engine(bars: &[PriceBar]) -> Vec<EngineBar> {
    bars.iter().map(bar_to_engine).collect()
}

pub fn bar_from_engine(bar: &EngineBar) -> Result<PriceBar> {
    Ok(PriceBar {
        timestamp: from_millis(bar.time_stamp)?,
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
    })
}

/// Sentiment is required on the engine side; align the quote first.
pub fn quote_to_engine(quote: &Quote) -> Result<EngineTick> {
    let sentiment = quote.sentiment.ok_or_else(|| {
        PipelineError::invalid_input(format!("quote at {} has no sentiment", quote.timestamp))
    })?;
    Ok(EngineTick {
        time_stamp: to_millis(&quote.timestamp),
        bid: quote.bid,
        ask: quote.ask,
        sentiment,
    })
}

pub fn quotes_to_engine(quotes: &[Quote]) -> Result<Vec<EngineTick>> {
    quotes.iter().map(quote_to_engine).collect()
}

pub fn quote_from_engine(tick: &EngineTick) -> Result<Quote> {
    Ok(Quote {
        timestamp: from_millis(tick.time_stamp)?,
        bid: tick.bid,
        ask: tick.ask,
        sentiment: Some(tick.sentiment),
    })
}

/// `SL`/`TP`/`date` become `stop_loss`/`take_profit`/`time_stamp`.
/// Non-numeric targets are skipped; run the validator first to drop such
/// signals entirely.
pub fn signal_to_engine(signal: &StoredSignal) -> EngineSignal {
    EngineSignal {
        symbol: signal.symbol.clone(),
        action: signal.action,
        stop_loss: signal.stop_loss,
        take_profit: signal
            .take_profit
            .iter()
            .filter_map(|target| target.as_f64())
            .collect(),
        time_stamp: to_millis(&signal.date),
        source: signal.source.clone(),
    }
}

pub fn signals_to_engine(signals: &[StoredSignal]) -> Vec<EngineSignal> {
    signals.iter().map(signal_to_engine).collect()
}

pub fn signal_from_engine(signal: &EngineSignal) -> Result<StoredSignal> {
    Ok(StoredSignal::new(
        signal.symbol.clone(),
        signal.action,
        signal.stop_loss,
        &signal.take_profit,
        signal.source.clone(),
        from_millis(signal.time_stamp)?,
    ))
}
