//! Pipeline runs: signal generation and signal evaluation

pub mod context;
pub mod evaluate;
pub mod generate;

pub use context::RunContext;
pub use evaluate::{
    check_signal, BacktestConfig, EvaluationJob, EvaluationRequest, PreparedEvaluation,
    SymbolPreparation,
};
pub use generate::{GenerationJob, GenerationReport};
