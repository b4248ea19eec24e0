//! In-process store used by tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{PriceQuery, PriceStore, SentimentStore, SignalStore};
use crate::error::Result;
use crate::models::price::{PriceKind, PriceRecord, SentimentSample};
use crate::models::signal::StoredSignal;

type Series<T> = BTreeMap<DateTime<Utc>, T>;

#[derive(Default)]
pub struct MemoryStore {
    prices: RwLock<HashMap<(String, PriceKind), Series<PriceRecord>>>,
    sentiments: RwLock<HashMap<String, Series<SentimentSample>>>,
    signals: RwLock<Vec<StoredSignal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn price_count(&self, symbol: &str, kind: PriceKind) -> usize {
        let prices = self.prices.read().await;
        prices
            .get(&(symbol.to_string(), kind))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub async fn signal_count(&self) -> usize {
        self.signals.read().await.len()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn find_prices_page(
        &self,
        symbol: &str,
        kind: PriceKind,
        query: &PriceQuery,
        limit: usize,
    ) -> Result<Vec<PriceRecord>> {
        let prices = self.prices.read().await;
        let Some(series) = prices.get(&(symbol.to_string(), kind)) else {
            return Ok(Vec::new());
        };

        Ok(series
            .iter()
            .filter(|(timestamp, _)| query.contains(timestamp))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn insert_prices(&self, symbol: &str, records: &[PriceRecord]) -> Result<usize> {
        let mut prices = self.prices.write().await;
        let mut written = 0;
        for record in records {
            let series = prices
                .entry((symbol.to_string(), record.kind()))
                .or_default();
            if series.contains_key(&record.timestamp()) {
                continue;
            }
            series.insert(record.timestamp(), record.clone());
            written += 1;
        }
        Ok(written)
    }
}

#[async_trait]
impl SentimentStore for MemoryStore {
    async fn find_sentiments(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SentimentSample>> {
        if from >= to {
            return Ok(Vec::new());
        }
        let sentiments = self.sentiments.read().await;
        Ok(sentiments
            .get(symbol)
            .map(|series| series.range(from..to).map(|(_, s)| s.clone()).collect())
            .unwrap_or_default())
    }

    async fn find_latest_sentiment_before(
        &self,
        symbol: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<SentimentSample>> {
        let sentiments = self.sentiments.read().await;
        Ok(sentiments
            .get(symbol)
            .and_then(|series| series.range(..before).next_back())
            .map(|(_, s)| s.clone()))
    }

    async fn insert_sentiments(&self, symbol: &str, samples: &[SentimentSample]) -> Result<usize> {
        let mut sentiments = self.sentiments.write().await;
        let series = sentiments.entry(symbol.to_string()).or_default();
        let mut written = 0;
        for sample in samples {
            if series.contains_key(&sample.timestamp) {
                continue;
            }
            series.insert(sample.timestamp, sample.clone());
            written += 1;
        }
        Ok(written)
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn find_all_signals(&self) -> Result<Vec<StoredSignal>> {
        let mut signals = self.signals.read().await.clone();
        signals.sort_by_key(|signal| signal.date);
        Ok(signals)
    }

    async fn find_signals_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredSignal>> {
        let mut signals: Vec<StoredSignal> = self
            .signals
            .read()
            .await
            .iter()
            .filter(|signal| signal.date >= from && signal.date < to)
            .cloned()
            .collect();
        signals.sort_by_key(|signal| signal.date);
        Ok(signals)
    }

    async fn find_signals_by_source(&self, source: &str) -> Result<Vec<StoredSignal>> {
        let mut signals: Vec<StoredSignal> = self
            .signals
            .read()
            .await
            .iter()
            .filter(|signal| signal.source == source)
            .cloned()
            .collect();
        signals.sort_by_key(|signal| signal.date);
        Ok(signals)
    }

    async fn insert_signal(&self, signal: &StoredSignal) -> Result<()> {
        self.signals.write().await.push(signal.clone());
        Ok(())
    }

    async fn insert_signals(&self, signals: &[StoredSignal]) -> Result<usize> {
        self.signals.write().await.extend_from_slice(signals);
        Ok(signals.len())
    }
}
