//! Preparation pipeline: conversion, validation, grouping, windowing,
//! sentiment alignment and batched ingestion.

pub mod convert;
pub mod grouping;
pub mod ingest;
pub mod sentiment;
pub mod validate;
pub mod window;

pub use grouping::group_by_symbol;
pub use ingest::{IngestReport, PriceIngestor};
pub use sentiment::SentimentAligner;
pub use validate::filter_valid_signals;
pub use window::symbol_window;
