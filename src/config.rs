//! Environment-driven configuration.
//!
//! Values are read from the process environment (optionally populated from a
//! `.env` file by the binaries) with typed defaults.

use std::env;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::models::price::PriceKind;

pub const DEFAULT_BATCH_SIZE: usize = 100_000;
pub const DEFAULT_PAGE_SIZE: usize = 10_000;
pub const DEFAULT_BAND_WINDOW: usize = 20;
pub const DEFAULT_BAND_STD_DEV_FACTOR: f64 = 2.0;
pub const DEFAULT_SIGNAL_SOURCE: &str = "Bollinger";

/// Deployment environment name (`APP_ENV`), `sandbox` when unset.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_questdb_url() -> String {
    env::var("QUESTDB_URL").unwrap_or_else(|_| {
        "host=localhost port=8812 user=admin password=quest dbname=qdb".to_string()
    })
}

/// Band-crossing generator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BandConfig {
    /// Lookback window in samples
    pub window: usize,
    pub std_dev_factor: f64,
    /// First index to evaluate; `None` starts at `window - 1`
    pub skip: Option<usize>,
    pub source: String,
}

impl BandConfig {
    pub fn start_index(&self) -> usize {
        self.skip.unwrap_or_else(|| self.window.saturating_sub(1))
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_BAND_WINDOW,
            std_dev_factor: DEFAULT_BAND_STD_DEV_FACTOR,
            skip: None,
            source: DEFAULT_SIGNAL_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub batch_size: usize,
    /// When false, every record of a symbol is forwarded in a single append
    pub caching: bool,
    pub page_size: usize,
    pub price_kind: PriceKind,
    pub band: BandConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            caching: true,
            page_size: DEFAULT_PAGE_SIZE,
            price_kind: PriceKind::Bar,
            band: BandConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let band = BandConfig {
            window: parse_var("BAND_WINDOW")?.unwrap_or(defaults.band.window),
            std_dev_factor: parse_var("BAND_STD_DEV_FACTOR")?
                .unwrap_or(defaults.band.std_dev_factor),
            skip: parse_var("BAND_SKIP")?,
            source: env::var("SIGNAL_SOURCE").unwrap_or(defaults.band.source),
        };

        let config = Self {
            batch_size: parse_var("INGEST_BATCH_SIZE")?.unwrap_or(defaults.batch_size),
            caching: parse_var("INGEST_CACHING")?.unwrap_or(defaults.caching),
            page_size: parse_var("STORE_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            price_kind: parse_var("PRICE_KIND")?.unwrap_or(defaults.price_kind),
            band,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config("INGEST_BATCH_SIZE must be > 0".into()));
        }
        if self.page_size == 0 {
            return Err(PipelineError::Config("STORE_PAGE_SIZE must be > 0".into()));
        }
        if self.band.window == 0 {
            return Err(PipelineError::Config("BAND_WINDOW must be > 0".into()));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PipelineError::Config(format!("{}='{}': {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
