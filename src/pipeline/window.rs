use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::error::{PipelineError, Result};
use crate::models::signal::{StoredSignal, SymbolWindow};

/// Midnight (UTC) of the day containing `timestamp`
pub fn truncate_to_day(timestamp: &DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Fetch window for a chronologically sorted, non-empty signal group.
///
/// `day_from` is the first signal's day minus one day, `day_to` the last
/// signal's day plus one day.
pub fn symbol_window(symbol: &str, signals: &[StoredSignal]) -> Result<SymbolWindow> {
    let (first, last) = match (signals.first(), signals.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(PipelineError::invalid_input(format!(
                "cannot derive a date range for '{}' from an empty signal group",
                symbol
            )))
        }
    };

    Ok(SymbolWindow {
        symbol: symbol.to_string(),
        day_from: truncate_to_day(&first.date) - Duration::days(1),
        day_to: truncate_to_day(&last.date) + Duration::days(1),
    })
}
