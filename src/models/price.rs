use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentiment assigned to quotes that precede every known sample
pub const DEFAULT_SENTIMENT: f64 = 50.0;

/// Shape of a price series. Decided once per source, never inferred from records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceKind {
    Bar,
    Tick,
}

impl PriceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceKind::Bar => "bar",
            PriceKind::Tick => "tick",
        }
    }
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bar" | "ohlc" => Ok(PriceKind::Bar),
            "tick" | "quote" => Ok(PriceKind::Tick),
            other => Err(format!("unknown price kind '{}'", other)),
        }
    }
}

/// One-minute OHLC bar as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }
}

/// Bid/ask tick. `sentiment` is filled in by the aligner right before ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl Quote {
    pub fn new(timestamp: DateTime<Utc>, bid: f64, ask: f64) -> Self {
        Self {
            timestamp,
            bid,
            ask,
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PriceRecord {
    Bar(PriceBar),
    Tick(Quote),
}

impl PriceRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PriceRecord::Bar(bar) => bar.timestamp,
            PriceRecord::Tick(quote) => quote.timestamp,
        }
    }

    pub fn kind(&self) -> PriceKind {
        match self {
            PriceRecord::Bar(_) => PriceKind::Bar,
            PriceRecord::Tick(_) => PriceKind::Tick,
        }
    }
}

impl From<PriceBar> for PriceRecord {
    fn from(bar: PriceBar) -> Self {
        PriceRecord::Bar(bar)
    }
}

impl From<Quote> for PriceRecord {
    fn from(quote: Quote) -> Self {
        PriceRecord::Tick(quote)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSample {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub sentiment: f64,
}

impl SentimentSample {
    pub fn new(timestamp: DateTime<Utc>, sentiment: f64) -> Self {
        Self {
            timestamp,
            sentiment,
        }
    }
}
