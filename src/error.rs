//! Error type shared by the pipeline, the stores and the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A caller violated a precondition (empty group, empty sentiment series, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
