//! Unit tests for the storage shapes

use backtestlab::models::price::{PriceBar, PriceKind, PriceRecord, Quote};
use backtestlab::models::signal::{SignalAction, StoredSignal};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn stored_signal_uses_storage_field_names() {
    let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let signal = StoredSignal::new("EURUSD", SignalAction::Sell, 1.25, &[1.1], "Bollinger", date);

    let value = serde_json::to_value(&signal).unwrap();
    assert_eq!(value["action"], json!("sell"));
    assert_eq!(value["SL"], json!(1.25));
    assert_eq!(value["TP"], json!([1.1]));
    assert_eq!(value["source"], json!("Bollinger"));
    assert!(value.get("date").is_some());
}

#[test]
fn malformed_targets_deserialize_as_raw_values() {
    let raw = r#"{
        "symbol": "EURUSD",
        "action": "buy",
        "SL": 1.05,
        "TP": [1.1, null, "n/a"],
        "source": "Manual",
        "date": "2024-01-02T03:04:05Z"
    }"#;

    let signal: StoredSignal = serde_json::from_str(raw).unwrap();
    assert_eq!(signal.action, SignalAction::Buy);
    assert_eq!(signal.take_profit.len(), 3);
    assert!(signal.take_profit[1].is_null());
}

#[test]
fn price_records_are_tagged_by_kind() {
    let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bar: PriceRecord = PriceBar::new(date, 1.0, 2.0, 0.5, 1.5).into();
    let tick: PriceRecord = Quote::new(date, 1.0, 1.1).into();

    assert_eq!(serde_json::to_value(&bar).unwrap()["kind"], json!("bar"));
    assert_eq!(serde_json::to_value(&tick).unwrap()["kind"], json!("tick"));
    assert_eq!(bar.kind(), PriceKind::Bar);
    assert_eq!(tick.timestamp(), date);
}

#[test]
fn price_kind_parses_aliases() {
    assert_eq!("OHLC".parse::<PriceKind>().unwrap(), PriceKind::Bar);
    assert_eq!("quote".parse::<PriceKind>().unwrap(), PriceKind::Tick);
    assert!("candle".parse::<PriceKind>().is_err());
}
