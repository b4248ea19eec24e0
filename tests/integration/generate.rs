//! Integration tests for the signal generation run

#[path = "test_utils.rs"]
mod test_utils;

use std::sync::Arc;

use backtestlab::config::{BandConfig, PipelineConfig};
use backtestlab::db::{MemoryStore, SignalStore};
use backtestlab::engine::{ComputeEngine, SeriesEngine};
use backtestlab::jobs::GenerationJob;
use backtestlab::models::signal::SignalAction;

use test_utils::{context, minute, minute_bars, seed_prices};

fn spike_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 19];
    closes.push(130.0);
    closes.extend([100.0; 5]);
    closes
}

fn small_batches() -> PipelineConfig {
    PipelineConfig {
        batch_size: 10,
        page_size: 7,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn spike_produces_a_stored_buy_signal() {
    let store = Arc::new(MemoryStore::new());
    seed_prices(&store, "XAUUSD", &minute_bars(&spike_closes())).await;
    let (ctx, metrics) = context(store.clone(), small_batches());

    let mut engine = SeriesEngine::new();
    let report = GenerationJob::new(&ctx)
        .run(&mut engine, "XAUUSD")
        .await
        .unwrap();

    assert_eq!(report.bars, 25);
    assert_eq!(report.batches, 3);
    assert_eq!(report.signals_generated, 1);
    assert_eq!(report.signals_stored, 1);
    assert_eq!(engine.series_len("XAUUSD"), 25);

    let stored = store.find_signals_by_source("Bollinger").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].symbol, "XAUUSD");
    assert_eq!(stored[0].action, SignalAction::Buy);
    assert_eq!(stored[0].date, minute(19));

    assert_eq!(
        metrics
            .signals_generated
            .with_label_values(&["XAUUSD", "buy"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .price_records_ingested
            .with_label_values(&["XAUUSD", "bar"])
            .get(),
        25
    );
}

#[tokio::test]
async fn wider_bands_suppress_the_signal() {
    let store = Arc::new(MemoryStore::new());
    seed_prices(&store, "XAUUSD", &minute_bars(&spike_closes())).await;
    let config = PipelineConfig {
        band: BandConfig {
            std_dev_factor: 5.0,
            ..BandConfig::default()
        },
        ..small_batches()
    };
    let (ctx, _metrics) = context(store.clone(), config);

    let mut engine = SeriesEngine::new();
    let report = GenerationJob::new(&ctx)
        .run(&mut engine, "XAUUSD")
        .await
        .unwrap();

    assert_eq!(report.signals_generated, 0);
    assert_eq!(store.signal_count().await, 0);
}

#[tokio::test]
async fn symbol_without_bars_generates_nothing() {
    let store = Arc::new(MemoryStore::new());
    let (ctx, _metrics) = context(store.clone(), PipelineConfig::default());

    let mut engine = SeriesEngine::new();
    let report = GenerationJob::new(&ctx)
        .run(&mut engine, "GBPUSD")
        .await
        .unwrap();

    assert_eq!(report.bars, 0);
    assert_eq!(report.signals_generated, 0);
    assert_eq!(engine.series_len("GBPUSD"), 0);
    assert_eq!(store.signal_count().await, 0);
}

#[tokio::test]
async fn series_shorter_than_the_window_generates_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_prices(&store, "XAUUSD", &minute_bars(&[100.0, 150.0, 50.0])).await;
    let (ctx, _metrics) = context(store.clone(), PipelineConfig::default());

    let mut engine = SeriesEngine::new();
    let report = GenerationJob::new(&ctx)
        .run(&mut engine, "XAUUSD")
        .await
        .unwrap();

    assert_eq!(report.bars, 3);
    assert_eq!(report.signals_generated, 0);
}
