//! Signal evaluation run.
//!
//! Loads every stored signal, drops the malformed ones, groups the rest by
//! symbol and streams each symbol's prices for the padded date window into
//! the compute engine. Tick series get their sentiment aligned on the way
//! in, starting from the last sample before the window; a tick symbol with
//! no sentiment at all is rejected. The converted signals are then handed
//! to the scorer, or serialized together with the loaded prices as an
//! [`EvaluationRequest`] when the scorer lives in another process.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::{price_stream, PriceQuery};
use crate::engine::{
    BacktestConditions, BacktestMetrics, ComputeEngine, SeriesEngine, SignalCheck, SignalScorer,
    StrategyRules,
};
use crate::error::{PipelineError, Result};
use crate::jobs::context::RunContext;
use crate::models::normalized::{EngineSignal, PriceBatch};
use crate::models::price::PriceKind;
use crate::models::signal::{StoredSignal, SymbolWindow};
use crate::pipeline::convert::{signal_to_engine, signals_to_engine};
use crate::pipeline::grouping::SymbolGroup;
use crate::pipeline::validate::has_numeric_targets;
use crate::pipeline::{
    filter_valid_signals, group_by_symbol, symbol_window, IngestReport, PriceIngestor,
    SentimentAligner,
};

/// Account conditions plus strategy rules keyed by signal source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub conditions: BacktestConditions,
    #[serde(default)]
    pub strategy_rules: HashMap<String, StrategyRules>,
}

impl BacktestConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

/// Everything the scorer needs, in its wire shape. `prices` holds each
/// prepared symbol's series exactly as it was appended to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub conditions: BacktestConditions,
    pub strategy_rules: HashMap<String, StrategyRules>,
    #[serde(default)]
    pub prices: BTreeMap<String, PriceBatch>,
    pub signals: Vec<EngineSignal>,
}

/// Outcome of preparing one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPreparation {
    pub window: SymbolWindow,
    pub signals: usize,
    pub aligned: bool,
    pub ingest: IngestReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEvaluation {
    /// Validated signals, ascending by date
    pub signals: Vec<EngineSignal>,
    pub symbols: Vec<SymbolPreparation>,
    /// Signals dropped for non-numeric take-profit targets
    pub dropped: usize,
}

impl PreparedEvaluation {
    /// Build the scorer request from the prices `engine` was loaded with
    /// during [`EvaluationJob::prepare`].
    pub fn into_request(self, config: BacktestConfig, engine: &SeriesEngine) -> EvaluationRequest {
        let prices = self
            .symbols
            .iter()
            .filter_map(|prepared| {
                let symbol = &prepared.window.symbol;
                engine
                    .price_batch(symbol)
                    .map(|batch| (symbol.clone(), batch))
            })
            .collect();

        EvaluationRequest {
            conditions: config.conditions,
            strategy_rules: config.strategy_rules,
            prices,
            signals: self.signals,
        }
    }
}

pub struct EvaluationJob<'c> {
    ctx: &'c RunContext,
}

impl<'c> EvaluationJob<'c> {
    pub fn new(ctx: &'c RunContext) -> Self {
        Self { ctx }
    }

    /// Load, validate and group the stored signals and ingest the prices
    /// each symbol needs. The engine is left loaded for scoring.
    pub async fn prepare<E: ComputeEngine + ?Sized>(
        &self,
        engine: &mut E,
    ) -> Result<PreparedEvaluation> {
        let stored = self.ctx.store.find_all_signals().await?;
        let total = stored.len();

        let valid = filter_valid_signals(stored);
        let dropped = total - valid.len();
        if let Some(ref metrics) = self.ctx.metrics {
            metrics.signals_filtered.inc_by(dropped as u64);
        }

        let signals = signals_to_engine(&valid);
        let groups = group_by_symbol(valid);
        info!(
            signals = signals.len(),
            dropped = dropped,
            symbols = groups.len(),
            "Preparing {} signals across {} symbols",
            signals.len(),
            groups.len()
        );

        let mut symbols = Vec::with_capacity(groups.len());
        for group in &groups {
            symbols.push(self.prepare_symbol(&mut *engine, group).await?);
        }

        Ok(PreparedEvaluation {
            signals,
            symbols,
            dropped,
        })
    }

    async fn prepare_symbol<E: ComputeEngine + ?Sized>(
        &self,
        engine: &mut E,
        group: &SymbolGroup,
    ) -> Result<SymbolPreparation> {
        let config = &self.ctx.config;
        let symbol = group.symbol.as_str();
        let window = symbol_window(symbol, &group.signals)?;

        let mut aligner = match config.price_kind {
            PriceKind::Bar => None,
            PriceKind::Tick => Some(self.load_aligner(symbol, &window).await?),
        };
        let aligned = aligner.is_some();

        let records = price_stream(
            self.ctx.store.as_ref(),
            symbol,
            config.price_kind,
            PriceQuery::between(window.day_from, window.day_to),
            config.page_size,
        );
        let ingest = PriceIngestor::new(&mut *engine)
            .with_batch_size(config.batch_size)
            .with_caching(config.caching)
            .with_metrics(self.ctx.metrics.clone())
            .ingest(symbol, records, aligner.as_mut())
            .await?;

        if ingest.records == 0 {
            warn!(
                symbol = %symbol,
                "No {} prices between {} and {}",
                config.price_kind,
                window.day_from,
                window.day_to
            );
        }

        Ok(SymbolPreparation {
            window,
            signals: group.signals.len(),
            aligned,
            ingest,
        })
    }

    /// Sentiment covering the window: the last sample before `day_from`
    /// followed by every sample inside the window. A tick symbol without
    /// any of them cannot be aligned.
    async fn load_aligner(&self, symbol: &str, window: &SymbolWindow) -> Result<SentimentAligner> {
        let store = &self.ctx.store;
        let mut samples = Vec::new();
        if let Some(earlier) = store
            .find_latest_sentiment_before(symbol, window.day_from)
            .await?
        {
            samples.push(earlier);
        }
        samples.extend(
            store
                .find_sentiments(symbol, window.day_from, window.day_to)
                .await?,
        );

        if samples.is_empty() {
            return Err(PipelineError::invalid_input(format!(
                "no sentiment samples for '{}' before {}",
                symbol, window.day_to
            )));
        }
        debug!(symbol = %symbol, samples = samples.len(), "loaded sentiment series");
        SentimentAligner::new(samples)
    }

    /// Prepare, then score every validated signal per source.
    pub async fn run<E, S>(
        &self,
        engine: &mut E,
        scorer: &S,
        config: &BacktestConfig,
    ) -> Result<HashMap<String, BacktestMetrics>>
    where
        E: ComputeEngine + ?Sized,
        S: SignalScorer + ?Sized,
    {
        let prepared = self.prepare(engine).await?;
        if prepared.signals.is_empty() {
            warn!("No valid signals stored, nothing to score");
            return Ok(HashMap::new());
        }

        let results =
            scorer.backtest_signals(&config.conditions, &config.strategy_rules, prepared.signals)?;

        for (source, metrics) in &results {
            info!(
                source = %source,
                profit = metrics.profit,
                trades = metrics.num_trades,
                hit_rate = metrics.hit_rate,
                sortino = metrics.sortino_ratio,
                "Backtest of {}: {} trades, profit {:.2}",
                source,
                metrics.num_trades,
                metrics.profit
            );
        }
        Ok(results)
    }
}

/// Step a single stored signal through filter, entry and exit checks. The
/// sequence stops at the first check the signal does not pass.
pub fn check_signal<S: SignalScorer + ?Sized>(
    scorer: &S,
    rules: &StrategyRules,
    signal: &StoredSignal,
) -> Result<SignalCheck> {
    if !has_numeric_targets(signal) {
        return Err(PipelineError::invalid_input(format!(
            "signal for '{}' at {} has non-numeric take-profit targets",
            signal.symbol, signal.date
        )));
    }

    let check = scorer.check_filter(rules, signal_to_engine(signal))?;
    if !check.inited {
        return Ok(check);
    }
    let check = scorer.check_entry(rules, check)?;
    if !check.opened {
        return Ok(check);
    }
    scorer.check_exit(rules, check)
}
