//! Scoring boundary: the backtest engine that turns prepared signals into
//! performance metrics. No implementation ships with this crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::normalized::EngineSignal;

/// Account constraints for a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConditions {
    pub max_margin: f64,
    pub commission: f64,
    pub lot_size: f64,
    pub contract_sizes: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRule {
    pub name: String,
    #[serde(default)]
    pub parameters: HashMap<String, f64>,
}

impl StrategyRule {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Entry, exit and filter rules applied to the signals of one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRules {
    pub entry: StrategyRule,
    pub exit: StrategyRule,
    pub filter: StrategyRule,
}

/// Aggregate performance of one signal source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub profit: f64,
    pub num_trades: usize,
    pub hit_rate: f64,
    pub sortino_ratio: f64,
    pub profit_per_day: f64,
}

/// State of a single signal stepped through filter, entry and exit checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCheck {
    pub signal: EngineSignal,
    pub inited: bool,
    pub opened: bool,
    pub closed: bool,
    pub price_open: Option<f64>,
    pub price_close: Option<f64>,
    #[serde(default)]
    pub strategy_attributes: HashMap<String, f64>,
}

impl SignalCheck {
    pub fn new(signal: EngineSignal) -> Self {
        Self {
            signal,
            inited: false,
            opened: false,
            closed: false,
            price_open: None,
            price_close: None,
            strategy_attributes: HashMap::new(),
        }
    }
}

pub trait SignalScorer {
    /// Score `signals` per source; `strategy_rules` is keyed by source label.
    fn backtest_signals(
        &self,
        conditions: &BacktestConditions,
        strategy_rules: &HashMap<String, StrategyRules>,
        signals: Vec<EngineSignal>,
    ) -> Result<HashMap<String, BacktestMetrics>>;

    fn check_filter(&self, rules: &StrategyRules, signal: EngineSignal) -> Result<SignalCheck>;

    fn check_entry(&self, rules: &StrategyRules, check: SignalCheck) -> Result<SignalCheck>;

    fn check_exit(&self, rules: &StrategyRules, check: SignalCheck) -> Result<SignalCheck>;
}
