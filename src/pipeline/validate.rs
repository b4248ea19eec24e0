//! Take-profit sanity filter applied before signals reach the engine.
//!
//! Signals with a non-numeric target are dropped, not repaired and not
//! reported.

use tracing::debug;

use crate::models::signal::StoredSignal;

pub fn has_numeric_targets(signal: &StoredSignal) -> bool {
    signal.take_profit.iter().all(|target| target.is_number())
}

/// Order-preserving subsequence of `signals` whose targets are all numbers.
pub fn filter_valid_signals(signals: Vec<StoredSignal>) -> Vec<StoredSignal> {
    let total = signals.len();
    let valid: Vec<StoredSignal> = signals.into_iter().filter(has_numeric_targets).collect();

    if valid.len() < total {
        debug!(
            dropped = total - valid.len(),
            kept = valid.len(),
            "dropped {} signals with non-numeric take-profit targets",
            total - valid.len()
        );
    }
    valid
}
