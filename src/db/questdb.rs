//! QuestDB store over the PostgreSQL wire protocol.
//!
//! All series tables are WAL tables deduplicated on `(timestamp, symbol)`,
//! which makes re-inserting an existing record a no-op.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, warn};

use super::{PriceQuery, PriceStore, SentimentStore, SignalStore};
use crate::config;
use crate::error::{PipelineError, Result};
use crate::models::price::{PriceBar, PriceKind, PriceRecord, Quote, SentimentSample};
use crate::models::signal::{SignalAction, StoredSignal};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS price_bars (
        timestamp TIMESTAMP,
        symbol SYMBOL,
        open DOUBLE,
        high DOUBLE,
        low DOUBLE,
        close DOUBLE
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL DEDUP UPSERT KEYS(timestamp, symbol)",
    "CREATE TABLE IF NOT EXISTS price_ticks (
        timestamp TIMESTAMP,
        symbol SYMBOL,
        bid DOUBLE,
        ask DOUBLE
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL DEDUP UPSERT KEYS(timestamp, symbol)",
    "CREATE TABLE IF NOT EXISTS sentiments (
        timestamp TIMESTAMP,
        symbol SYMBOL,
        sentiment DOUBLE
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL DEDUP UPSERT KEYS(timestamp, symbol)",
    "CREATE TABLE IF NOT EXISTS signals (
        timestamp TIMESTAMP,
        symbol SYMBOL,
        action SYMBOL,
        stop_loss DOUBLE,
        take_profit_json STRING,
        source SYMBOL
    ) TIMESTAMP(timestamp) PARTITION BY DAY",
];

const SIGNAL_COLUMNS: &str = "timestamp, symbol, action, stop_loss, take_profit_json, source";

pub struct QuestDatabase {
    client: Client,
}

impl QuestDatabase {
    /// Connect using `QUESTDB_URL`
    pub async fn new() -> Result<Self> {
        Self::connect(&config::get_questdb_url()).await
    }

    /// Connect and create the schema. Connection failures are returned
    /// immediately, there is no retry.
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await.map_err(|e| {
            PipelineError::Store(format!("Failed to connect to QuestDB: {}", e))
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "QuestDB connection error");
            }
        });

        let db = Self { client };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.client.execute(statement, &[]).await.map_err(|e| {
                PipelineError::Store(format!("Failed to create schema: {}", e))
            })?;
        }
        Ok(())
    }

    async fn insert_price(&self, symbol: &str, record: &PriceRecord) -> Result<()> {
        match record {
            PriceRecord::Bar(bar) => {
                self.client
                    .execute(
                        "INSERT INTO price_bars (timestamp, symbol, open, high, low, close)
                         VALUES ($1, $2, $3, $4, $5, $6)",
                        &[
                            &bar.timestamp.naive_utc(),
                            &symbol,
                            &bar.open,
                            &bar.high,
                            &bar.low,
                            &bar.close,
                        ],
                    )
                    .await?;
            }
            PriceRecord::Tick(quote) => {
                self.client
                    .execute(
                        "INSERT INTO price_ticks (timestamp, symbol, bid, ask)
                         VALUES ($1, $2, $3, $4)",
                        &[&quote.timestamp.naive_utc(), &symbol, &quote.bid, &quote.ask],
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn query_signals(
        &self,
        filter: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<StoredSignal>> {
        let sql = format!(
            "SELECT {} FROM signals {} ORDER BY timestamp ASC",
            SIGNAL_COLUMNS, filter
        );
        let rows = self.client.query(&sql, params).await?;
        rows.iter().map(signal_from_row).collect()
    }
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

fn bar_from_row(row: &Row) -> Result<PriceRecord> {
    Ok(PriceRecord::Bar(PriceBar {
        timestamp: utc(row.try_get(0)?),
        open: row.try_get(1)?,
        high: row.try_get(2)?,
        low: row.try_get(3)?,
        close: row.try_get(4)?,
    }))
}

fn quote_from_row(row: &Row) -> Result<PriceRecord> {
    Ok(PriceRecord::Tick(Quote::new(
        utc(row.try_get(0)?),
        row.try_get(1)?,
        row.try_get(2)?,
    )))
}

fn signal_from_row(row: &Row) -> Result<StoredSignal> {
    let action: String = row.try_get(2)?;
    let take_profit_json: String = row.try_get(4)?;

    Ok(StoredSignal {
        date: utc(row.try_get(0)?),
        symbol: row.try_get(1)?,
        action: action.parse::<SignalAction>().map_err(PipelineError::Store)?,
        stop_loss: row.try_get(3)?,
        take_profit: serde_json::from_str(&take_profit_json)?,
        source: row.try_get(5)?,
    })
}

#[async_trait]
impl PriceStore for QuestDatabase {
    async fn find_prices_page(
        &self,
        symbol: &str,
        kind: PriceKind,
        query: &PriceQuery,
        limit: usize,
    ) -> Result<Vec<PriceRecord>> {
        let (columns, table) = match kind {
            PriceKind::Bar => ("timestamp, open, high, low, close", "price_bars"),
            PriceKind::Tick => ("timestamp, bid, ask", "price_ticks"),
        };

        let from = query.from.map(|t| t.naive_utc());
        let to = query.to.map(|t| t.naive_utc());
        let after = query.after.map(|t| t.naive_utc());

        let mut sql = format!("SELECT {} FROM {} WHERE symbol = $1", columns, table);
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&symbol];
        for (bound, operator) in [(&from, ">="), (&to, "<"), (&after, ">")] {
            if let Some(value) = bound {
                params.push(value);
                sql.push_str(&format!(" AND timestamp {} ${}", operator, params.len()));
            }
        }
        sql.push_str(&format!(" ORDER BY timestamp ASC LIMIT {}", limit));

        let rows = self.client.query(&sql, &params).await?;
        debug!(symbol = %symbol, kind = %kind, rows = rows.len(), "fetched price page");

        rows.iter()
            .map(|row| match kind {
                PriceKind::Bar => bar_from_row(row),
                PriceKind::Tick => quote_from_row(row),
            })
            .collect()
    }

    async fn insert_prices(&self, symbol: &str, records: &[PriceRecord]) -> Result<usize> {
        let mut written = 0;
        for record in records {
            match self.insert_price(symbol, record).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Failed to store price in batch");
                }
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl SentimentStore for QuestDatabase {
    async fn find_sentiments(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SentimentSample>> {
        let rows = self
            .client
            .query(
                "SELECT timestamp, sentiment FROM sentiments
                 WHERE symbol = $1 AND timestamp >= $2 AND timestamp < $3
                 ORDER BY timestamp ASC",
                &[&symbol, &from.naive_utc(), &to.naive_utc()],
            )
            .await?;

        rows.iter()
            .map(|row| Ok(SentimentSample::new(utc(row.try_get(0)?), row.try_get(1)?)))
            .collect()
    }

    async fn find_latest_sentiment_before(
        &self,
        symbol: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<SentimentSample>> {
        let row = self
            .client
            .query_opt(
                "SELECT timestamp, sentiment FROM sentiments
                 WHERE symbol = $1 AND timestamp < $2
                 ORDER BY timestamp DESC LIMIT 1",
                &[&symbol, &before.naive_utc()],
            )
            .await?;

        row.map(|row| -> Result<SentimentSample> {
            Ok(SentimentSample::new(utc(row.try_get(0)?), row.try_get(1)?))
        })
        .transpose()
    }

    async fn insert_sentiments(&self, symbol: &str, samples: &[SentimentSample]) -> Result<usize> {
        let mut written = 0;
        for sample in samples {
            let result = self
                .client
                .execute(
                    "INSERT INTO sentiments (timestamp, symbol, sentiment) VALUES ($1, $2, $3)",
                    &[&sample.timestamp.naive_utc(), &symbol, &sample.sentiment],
                )
                .await;
            match result {
                Ok(_) => written += 1,
                Err(e) => warn!(symbol = %symbol, error = %e, "Failed to store sentiment in batch"),
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl SignalStore for QuestDatabase {
    async fn find_all_signals(&self) -> Result<Vec<StoredSignal>> {
        self.query_signals("", &[]).await
    }

    async fn find_signals_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredSignal>> {
        self.query_signals(
            "WHERE timestamp >= $1 AND timestamp < $2",
            &[&from.naive_utc(), &to.naive_utc()],
        )
        .await
    }

    async fn find_signals_by_source(&self, source: &str) -> Result<Vec<StoredSignal>> {
        self.query_signals("WHERE source = $1", &[&source]).await
    }

    async fn insert_signal(&self, signal: &StoredSignal) -> Result<()> {
        let take_profit_json = serde_json::to_string(&signal.take_profit)?;
        self.client
            .execute(
                "INSERT INTO signals (timestamp, symbol, action, stop_loss, take_profit_json, source)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &signal.date.naive_utc(),
                    &signal.symbol,
                    &signal.action.as_str(),
                    &signal.stop_loss,
                    &take_profit_json,
                    &signal.source,
                ],
            )
            .await?;
        Ok(())
    }

    async fn insert_signals(&self, signals: &[StoredSignal]) -> Result<usize> {
        let mut written = 0;
        for signal in signals {
            match self.insert_signal(signal).await {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    symbol = %signal.symbol,
                    source = %signal.source,
                    error = %e,
                    "Failed to store signal in batch"
                ),
            }
        }
        Ok(written)
    }
}
