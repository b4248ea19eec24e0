//! Unit tests for the in-process series engine

use backtestlab::engine::{ComputeEngine, Lookback, Ohlc, PriceField, SeriesEngine, Side};
use backtestlab::models::normalized::{EngineBar, EngineTick, PriceBatch};
use backtestlab::models::price::PriceKind;
use backtestlab::PipelineError;

const MINUTE: i64 = 60_000;

fn bar(minute: i64, close: f64) -> EngineBar {
    EngineBar {
        time_stamp: minute * MINUTE,
        open: close - 1.0,
        high: close + 2.0,
        low: close - 2.0,
        close,
    }
}

fn tick(minute: i64, bid: f64) -> EngineTick {
    EngineTick {
        time_stamp: minute * MINUTE,
        bid,
        ask: bid + 0.5,
        sentiment: 50.0,
    }
}

fn loaded_bars(closes: &[f64]) -> SeriesEngine {
    let mut engine = SeriesEngine::new();
    let batch = closes
        .iter()
        .enumerate()
        .map(|(i, close)| bar(i as i64, *close))
        .collect();
    engine.append_prices("EURUSD", PriceBatch::Bars(batch)).unwrap();
    engine
}

#[test]
fn appends_extend_the_series() {
    let mut engine = SeriesEngine::new();
    engine
        .append_prices("EURUSD", PriceBatch::Bars(vec![bar(0, 1.0), bar(1, 2.0)]))
        .unwrap();
    engine
        .append_prices("EURUSD", PriceBatch::Bars(vec![bar(2, 3.0)]))
        .unwrap();
    engine
        .append_prices("XAUUSD", PriceBatch::Ticks(vec![tick(0, 2000.0)]))
        .unwrap();

    assert_eq!(engine.series_len("EURUSD"), 3);
    assert_eq!(engine.series_len("XAUUSD"), 1);
    assert_eq!(engine.series_len("GBPUSD"), 0);
    assert_eq!(engine.symbols(), vec!["EURUSD".to_string(), "XAUUSD".to_string()]);
    assert_eq!(engine.kind("XAUUSD"), Some(PriceKind::Tick));
    assert_eq!(engine.append_count(), 3);
}

#[test]
fn mixing_bars_and_ticks_is_rejected() {
    let mut engine = loaded_bars(&[1.0, 2.0]);
    let result = engine.append_prices("EURUSD", PriceBatch::Ticks(vec![tick(5, 1.0)]));
    assert!(matches!(result, Err(PipelineError::Engine(_))));
    assert_eq!(engine.series_len("EURUSD"), 2);
}

#[test]
fn timestamps_must_strictly_increase_across_batches() {
    let mut engine = loaded_bars(&[1.0, 2.0, 3.0]);
    let result = engine.append_prices("EURUSD", PriceBatch::Bars(vec![bar(2, 4.0)]));
    assert!(matches!(result, Err(PipelineError::Engine(_))));
    assert_eq!(engine.series_len("EURUSD"), 3);
}

#[test]
fn sample_lookback_uses_the_tail_of_the_range() {
    let engine = loaded_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let mean = engine
        .rolling_mean("EURUSD", PriceField::BID_CLOSE, 0, 4, Lookback::Samples(2))
        .unwrap();
    assert_eq!(mean, 4.5);

    let mean = engine
        .rolling_mean("EURUSD", PriceField::BID_CLOSE, 1, 3, Lookback::Samples(10))
        .unwrap();
    assert_eq!(mean, 3.0);
}

#[test]
fn std_dev_is_population() {
    let engine = loaded_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    let lookback = Lookback::Samples(8);

    let mean = engine
        .rolling_mean("EURUSD", PriceField::BID_CLOSE, 0, 7, lookback)
        .unwrap();
    let sd = engine
        .rolling_std_dev("EURUSD", PriceField::BID_CLOSE, 0, 7, lookback, mean)
        .unwrap();
    assert_eq!(mean, 5.0);
    assert_eq!(sd, 2.0);
}

#[test]
fn bars_read_the_ohlc_component() {
    let engine = loaded_bars(&[10.0]);
    let high = PriceField::new(Side::Ask, Ohlc::High);
    let open = PriceField::new(Side::Bid, Ohlc::Open);

    assert_eq!(
        engine.rolling_mean("EURUSD", high, 0, 0, Lookback::Samples(1)).unwrap(),
        12.0
    );
    assert_eq!(
        engine.rolling_mean("EURUSD", open, 0, 0, Lookback::Samples(1)).unwrap(),
        9.0
    );
}

#[test]
fn ticks_read_the_side() {
    let mut engine = SeriesEngine::new();
    engine
        .append_prices("XAUUSD", PriceBatch::Ticks(vec![tick(0, 10.0), tick(1, 20.0)]))
        .unwrap();

    let ask = PriceField::new(Side::Ask, Ohlc::Close);
    assert_eq!(
        engine.rolling_mean("XAUUSD", ask, 0, 1, Lookback::Samples(2)).unwrap(),
        15.5
    );
    assert_eq!(
        engine
            .rolling_mean("XAUUSD", PriceField::BID_CLOSE, 0, 1, Lookback::Samples(2))
            .unwrap(),
        15.0
    );
}

#[test]
fn minute_lookback_is_measured_from_the_range_end() {
    let engine = loaded_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let mean = engine
        .rolling_mean("EURUSD", PriceField::BID_CLOSE, 0, 5, Lookback::Minutes(1.0))
        .unwrap();
    assert_eq!(mean, 5.5);
}

#[test]
fn bad_ranges_and_unknown_symbols_are_engine_errors() {
    let engine = loaded_bars(&[1.0, 2.0, 3.0]);
    let samples = Lookback::Samples(2);

    for (from, to) in [(0, 3), (2, 1)] {
        let result = engine.rolling_mean("EURUSD", PriceField::BID_CLOSE, from, to, samples);
        assert!(matches!(result, Err(PipelineError::Engine(_))));
    }
    let result = engine.rolling_mean("GBPUSD", PriceField::BID_CLOSE, 0, 0, samples);
    assert!(matches!(result, Err(PipelineError::Engine(_))));
}
