//! Shared fixtures for the pipeline integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use backtestlab::config::PipelineConfig;
use backtestlab::db::{MemoryStore, PriceStore, SentimentStore, SignalStore};
use backtestlab::engine::{
    BacktestConditions, BacktestMetrics, SignalCheck, SignalScorer, StrategyRule, StrategyRules,
};
use backtestlab::jobs::{BacktestConfig, RunContext};
use backtestlab::metrics::Metrics;
use backtestlab::models::normalized::EngineSignal;
use backtestlab::models::price::{PriceBar, PriceRecord, Quote, SentimentSample};
use backtestlab::models::signal::{SignalAction, StoredSignal};
use backtestlab::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

pub fn day(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn minute(m: i64) -> DateTime<Utc> {
    day(1, 0) + Duration::minutes(m)
}

/// Hourly bars from `first_day` 00:00 through `last_day` 23:00
pub fn hourly_bars(first_day: u32, last_day: u32) -> Vec<PriceRecord> {
    let start = day(first_day, 0);
    let hours = i64::from(last_day - first_day + 1) * 24;
    (0..hours)
        .map(|h| {
            let close = 100.0 + (h % 5) as f64;
            PriceBar::new(start + Duration::hours(h), close, close + 1.0, close - 1.0, close).into()
        })
        .collect()
}

/// Hourly quotes over the same span as [`hourly_bars`]
pub fn hourly_quotes(first_day: u32, last_day: u32) -> Vec<PriceRecord> {
    let start = day(first_day, 0);
    let hours = i64::from(last_day - first_day + 1) * 24;
    (0..hours)
        .map(|h| Quote::new(start + Duration::hours(h), 1.08, 1.0802).into())
        .collect()
}

/// One-minute bars with the given closes, starting at [`minute`]`(0)`
pub fn minute_bars(closes: &[f64]) -> Vec<PriceRecord> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| PriceBar::new(minute(i as i64), *close, *close, *close, *close).into())
        .collect()
}

pub fn signal(symbol: &str, date: DateTime<Utc>, source: &str) -> StoredSignal {
    StoredSignal::new(symbol, SignalAction::Buy, 99.0, &[105.0], source, date)
}

pub fn malformed_signal(symbol: &str, date: DateTime<Utc>) -> StoredSignal {
    let mut signal = signal(symbol, date, "Manual");
    signal.take_profit.push(Value::Null);
    signal
}

pub async fn seed_prices(store: &MemoryStore, symbol: &str, records: &[PriceRecord]) {
    store.insert_prices(symbol, records).await.unwrap();
}

pub async fn seed_sentiments(store: &MemoryStore, symbol: &str, samples: &[SentimentSample]) {
    store.insert_sentiments(symbol, samples).await.unwrap();
}

pub async fn seed_signals(store: &MemoryStore, signals: &[StoredSignal]) {
    store.insert_signals(signals).await.unwrap();
}

pub fn context(store: Arc<MemoryStore>, config: PipelineConfig) -> (RunContext, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new().unwrap());
    (RunContext::new(store, config, Some(metrics.clone())), metrics)
}

pub fn backtest_config() -> BacktestConfig {
    let rules = StrategyRules {
        entry: StrategyRule::named("market"),
        exit: StrategyRule::named("take_profit").with_parameter("trail", 0.5),
        filter: StrategyRule::named("none"),
    };
    BacktestConfig {
        conditions: BacktestConditions {
            max_margin: 1000.0,
            commission: 3.5,
            lot_size: 0.1,
            contract_sizes: HashMap::from([("EURUSD".to_string(), 100_000)]),
        },
        strategy_rules: HashMap::from([("Bollinger".to_string(), rules)]),
    }
}

/// Scorer that records what it receives and reports one trade per signal
#[derive(Default)]
pub struct RecordingScorer {
    pub received: Mutex<Vec<EngineSignal>>,
}

impl SignalScorer for RecordingScorer {
    fn backtest_signals(
        &self,
        _conditions: &BacktestConditions,
        strategy_rules: &HashMap<String, StrategyRules>,
        signals: Vec<EngineSignal>,
    ) -> Result<HashMap<String, BacktestMetrics>> {
        let mut results = HashMap::new();
        for source in strategy_rules.keys() {
            let trades = signals.iter().filter(|s| &s.source == source).count();
            results.insert(
                source.clone(),
                BacktestMetrics {
                    profit: trades as f64 * 10.0,
                    num_trades: trades,
                    hit_rate: 1.0,
                    sortino_ratio: 0.0,
                    profit_per_day: 0.0,
                },
            );
        }
        self.received.lock().unwrap().extend(signals);
        Ok(results)
    }

    fn check_filter(&self, rules: &StrategyRules, signal: EngineSignal) -> Result<SignalCheck> {
        let mut check = SignalCheck::new(signal);
        check.inited = rules.filter.name != "reject";
        Ok(check)
    }

    fn check_entry(&self, _rules: &StrategyRules, mut check: SignalCheck) -> Result<SignalCheck> {
        check.opened = true;
        check.price_open = Some(check.signal.stop_loss + 1.0);
        Ok(check)
    }

    fn check_exit(&self, _rules: &StrategyRules, mut check: SignalCheck) -> Result<SignalCheck> {
        check.closed = true;
        check.price_close = check.signal.take_profit.first().copied();
        Ok(check)
    }
}
