//! Run context for dependency injection

use crate::config::PipelineConfig;
use crate::db::MarketStore;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Context shared by the pipeline runs
///
/// Contains:
/// - Store (prices, sentiments and signals)
/// - Pipeline configuration (batching, paging, band parameters)
/// - Metrics (optional, for tracking ingestion and generation)
///
/// The compute engine is not part of the context: runs borrow it mutably
/// for the duration of a single ingestion pass.
pub struct RunContext {
    pub store: Arc<dyn MarketStore>,
    pub config: PipelineConfig,
    pub metrics: Option<Arc<Metrics>>,
}

impl RunContext {
    pub fn new(
        store: Arc<dyn MarketStore>,
        config: PipelineConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            store,
            config,
            metrics,
        }
    }
}
