//! Unit tests for the in-process store

use backtestlab::db::{MemoryStore, PriceQuery, PriceStore, SentimentStore, SignalStore};
use backtestlab::models::price::{PriceBar, PriceKind, PriceRecord, Quote, SentimentSample};
use backtestlab::models::signal::{SignalAction, StoredSignal};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
}

fn bar(minute: i64) -> PriceRecord {
    PriceBar::new(at(minute), 1.0, 1.0, 1.0, minute as f64).into()
}

fn signal(minute: i64, source: &str) -> StoredSignal {
    StoredSignal::new("EURUSD", SignalAction::Buy, 1.0, &[2.0], source, at(minute))
}

#[tokio::test]
async fn unordered_price_inserts_read_back_ascending() {
    let store = MemoryStore::new();
    let written = store
        .insert_prices("EURUSD", &[bar(3), bar(1), bar(2), bar(0)])
        .await
        .unwrap();
    assert_eq!(written, 4);

    let page = store
        .find_prices_page("EURUSD", PriceKind::Bar, &PriceQuery::all(), 10)
        .await
        .unwrap();
    let stamps: Vec<_> = page.iter().map(PriceRecord::timestamp).collect();
    assert_eq!(stamps, vec![at(0), at(1), at(2), at(3)]);
}

#[tokio::test]
async fn duplicate_prices_are_skipped() {
    let store = MemoryStore::new();
    store.insert_prices("EURUSD", &[bar(0), bar(1)]).await.unwrap();
    let written = store.insert_prices("EURUSD", &[bar(1), bar(2)]).await.unwrap();

    assert_eq!(written, 1);
    assert_eq!(store.price_count("EURUSD", PriceKind::Bar).await, 3);
}

#[tokio::test]
async fn page_respects_range_keyset_and_limit() {
    let store = MemoryStore::new();
    let records: Vec<PriceRecord> = (0..20).map(bar).collect();
    store.insert_prices("EURUSD", &records).await.unwrap();

    let query = PriceQuery::between(at(5), at(15)).after(at(8));
    let page = store
        .find_prices_page("EURUSD", PriceKind::Bar, &query, 3)
        .await
        .unwrap();
    let stamps: Vec<_> = page.iter().map(PriceRecord::timestamp).collect();
    assert_eq!(stamps, vec![at(9), at(10), at(11)]);

    let tail = store
        .find_prices_page("EURUSD", PriceKind::Bar, &query.clone().after(at(13)), 3)
        .await
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].timestamp(), at(14));
}

#[tokio::test]
async fn price_kinds_are_stored_apart() {
    let store = MemoryStore::new();
    store
        .insert_prices(
            "EURUSD",
            &[bar(0), Quote::new(at(0), 1.0, 1.1).into(), Quote::new(at(1), 1.0, 1.1).into()],
        )
        .await
        .unwrap();

    assert_eq!(store.price_count("EURUSD", PriceKind::Bar).await, 1);
    assert_eq!(store.price_count("EURUSD", PriceKind::Tick).await, 2);
    let ticks = store
        .find_prices_page("EURUSD", PriceKind::Tick, &PriceQuery::all(), 10)
        .await
        .unwrap();
    assert!(ticks.iter().all(|r| r.kind() == PriceKind::Tick));
}

#[tokio::test]
async fn sentiment_range_is_half_open() {
    let store = MemoryStore::new();
    let samples: Vec<SentimentSample> = (0..5)
        .map(|m| SentimentSample::new(at(m * 10), m as f64))
        .collect();
    store.insert_sentiments("EURUSD", &samples).await.unwrap();

    let found = store.find_sentiments("EURUSD", at(10), at(30)).await.unwrap();
    assert_eq!(found, samples[1..3].to_vec());
    assert!(store
        .find_sentiments("GBPUSD", at(0), at(50))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn latest_sentiment_before_is_strictly_earlier() {
    let store = MemoryStore::new();
    let samples: Vec<SentimentSample> = (0..3)
        .map(|m| SentimentSample::new(at(m * 10), m as f64))
        .collect();
    store.insert_sentiments("EURUSD", &samples).await.unwrap();

    let latest = store.find_latest_sentiment_before("EURUSD", at(20)).await.unwrap();
    assert_eq!(latest, Some(samples[1].clone()));
    let latest = store.find_latest_sentiment_before("EURUSD", at(25)).await.unwrap();
    assert_eq!(latest, Some(samples[2].clone()));
    assert_eq!(
        store.find_latest_sentiment_before("EURUSD", at(0)).await.unwrap(),
        None
    );
    assert_eq!(
        store.find_latest_sentiment_before("GBPUSD", at(50)).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn signals_read_back_sorted_by_date() {
    let store = MemoryStore::new();
    store
        .insert_signals(&[signal(5, "Bollinger"), signal(1, "Manual"), signal(3, "Bollinger")])
        .await
        .unwrap();
    store.insert_signal(&signal(0, "Manual")).await.unwrap();

    let all = store.find_all_signals().await.unwrap();
    let dates: Vec<_> = all.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![at(0), at(1), at(3), at(5)]);

    let bollinger = store.find_signals_by_source("Bollinger").await.unwrap();
    assert_eq!(bollinger.len(), 2);
    assert_eq!(bollinger[0].date, at(3));

    let between = store.find_signals_between(at(1), at(5)).await.unwrap();
    assert_eq!(between.len(), 2);
    assert_eq!(store.signal_count().await, 4);
}

#[test]
fn fresh_store_is_empty() {
    let store = MemoryStore::new();
    assert_eq!(tokio_test::block_on(store.signal_count()), 0);
    assert_eq!(
        tokio_test::block_on(store.price_count("EURUSD", PriceKind::Tick)),
        0
    );
}
