//! Persistent store boundary.
//!
//! Price, sentiment and signal series are namespaced independently per
//! symbol. Range queries always return timestamp-ascending results; batch
//! inserts tolerate duplicate keys.

pub mod cursor;
pub mod memory;
pub mod questdb;

pub use cursor::price_stream;
pub use memory::MemoryStore;
pub use questdb::QuestDatabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::price::{PriceKind, PriceRecord, SentimentSample};
use crate::models::signal::StoredSignal;

/// Half-open timestamp range `[from, to)` plus an exclusive keyset
/// position for paging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}

impl PriceQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            after: None,
        }
    }

    pub fn after(mut self, timestamp: DateTime<Utc>) -> Self {
        self.after = Some(timestamp);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| *timestamp >= from)
            && self.to.map_or(true, |to| *timestamp < to)
            && self.after.map_or(true, |after| *timestamp > after)
    }
}

#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Up to `limit` records of `kind` matching `query`, ascending by timestamp.
    async fn find_prices_page(
        &self,
        symbol: &str,
        kind: PriceKind,
        query: &PriceQuery,
        limit: usize,
    ) -> Result<Vec<PriceRecord>>;

    /// Insert records in any order; records whose timestamp already exists
    /// are skipped. Returns the number of records actually written.
    async fn insert_prices(&self, symbol: &str, records: &[PriceRecord]) -> Result<usize>;
}

#[async_trait]
pub trait SentimentStore: Send + Sync {
    /// Samples with `from <= timestamp < to`, ascending
    async fn find_sentiments(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SentimentSample>>;

    /// Most recent sample with `timestamp < before`
    async fn find_latest_sentiment_before(
        &self,
        symbol: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<SentimentSample>>;

    async fn insert_sentiments(&self, symbol: &str, samples: &[SentimentSample]) -> Result<usize>;
}

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Every stored signal, ascending by date
    async fn find_all_signals(&self) -> Result<Vec<StoredSignal>>;

    async fn find_signals_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredSignal>>;

    async fn find_signals_by_source(&self, source: &str) -> Result<Vec<StoredSignal>>;

    async fn insert_signal(&self, signal: &StoredSignal) -> Result<()>;

    /// Unordered, best-effort batch insert. Returns the number written.
    async fn insert_signals(&self, signals: &[StoredSignal]) -> Result<usize>;
}

/// Everything a pipeline run needs from the store
pub trait MarketStore: PriceStore + SentimentStore + SignalStore {}

impl<T: PriceStore + SentimentStore + SignalStore> MarketStore for T {}
