//! Data preparation and signal generation for an external backtesting engine.
//!
//! Prices, quotes, sentiment samples and trading signals are read from the
//! store, aligned and normalized, then streamed into a [`engine::ComputeEngine`]
//! in bounded batches. The band-crossing generator turns engine-provided
//! rolling statistics back into signals.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod signals;

pub use error::{PipelineError, Result};
