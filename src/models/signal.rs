use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "buy",
            SignalAction::Sell => "sell",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(SignalAction::Buy),
            "sell" => Ok(SignalAction::Sell),
            other => Err(format!("unknown signal action '{}'", other)),
        }
    }
}

/// Signal in its storage shape.
///
/// `TP` is kept as raw JSON because upstream producers occasionally write
/// placeholders (null, strings) into the target list; see
/// [`crate::pipeline::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignal {
    pub symbol: String,
    pub action: SignalAction,
    #[serde(rename = "SL")]
    pub stop_loss: f64,
    #[serde(rename = "TP")]
    pub take_profit: Vec<Value>,
    pub source: String,
    pub date: DateTime<Utc>,
}

impl StoredSignal {
    pub fn new(
        symbol: impl Into<String>,
        action: SignalAction,
        stop_loss: f64,
        take_profit: &[f64],
        source: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            stop_loss,
            take_profit: take_profit.iter().map(|tp| Value::from(*tp)).collect(),
            source: source.into(),
            date,
        }
    }
}

/// Inclusive, day-padded fetch window for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolWindow {
    pub symbol: String,
    pub day_from: DateTime<Utc>,
    pub day_to: DateTime<Utc>,
}
