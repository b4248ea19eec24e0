//! Records in the shape the compute engine consumes. Timestamps are
//! milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

use super::signal::SignalAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineBar {
    pub time_stamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTick {
    pub time_stamp: i64,
    pub bid: f64,
    pub ask: f64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSignal {
    pub symbol: String,
    pub action: SignalAction,
    pub stop_loss: f64,
    pub take_profit: Vec<f64>,
    pub time_stamp: i64,
    pub source: String,
}

/// One append unit for the engine. Bars and ticks never share a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum PriceBatch {
    Bars(Vec<EngineBar>),
    Ticks(Vec<EngineTick>),
}

impl PriceBatch {
    pub fn len(&self) -> usize {
        match self {
            PriceBatch::Bars(bars) => bars.len(),
            PriceBatch::Ticks(ticks) => ticks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
