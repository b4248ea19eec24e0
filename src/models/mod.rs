//! Shared data models: storage records and their normalized engine shapes.

pub mod normalized;
pub mod price;
pub mod signal;

pub use normalized::{EngineBar, EngineSignal, EngineTick, PriceBatch};
pub use price::{PriceBar, PriceKind, PriceRecord, Quote, SentimentSample, DEFAULT_SENTIMENT};
pub use signal::{SignalAction, StoredSignal, SymbolWindow};
