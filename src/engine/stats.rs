//! Statistics over the trailing part of a price slice.

use super::{Lookback, Ohlc, PriceField, Side};
use crate::models::normalized::{EngineBar, EngineTick};

const MS_PER_MINUTE: i64 = 60 * 1000;

pub trait SeriesPoint {
    fn time_stamp(&self) -> i64;
    fn value(&self, field: PriceField) -> f64;
}

impl SeriesPoint for EngineBar {
    fn time_stamp(&self) -> i64 {
        self.time_stamp
    }

    fn value(&self, field: PriceField) -> f64 {
        match field.ohlc {
            Ohlc::Open => self.open,
            Ohlc::High => self.high,
            Ohlc::Low => self.low,
            Ohlc::Close => self.close,
        }
    }
}

impl SeriesPoint for EngineTick {
    fn time_stamp(&self) -> i64 {
        self.time_stamp
    }

    fn value(&self, field: PriceField) -> f64 {
        match field.side {
            Side::Ask => self.ask,
            Side::Bid => self.bid,
        }
    }
}

/// Values of `field` inside the lookback, newest first.
pub fn window_values<P: SeriesPoint>(points: &[P], field: PriceField, lookback: Lookback) -> Vec<f64> {
    let Some(last) = points.last() else {
        return Vec::new();
    };

    match lookback {
        Lookback::Samples(n) => points
            .iter()
            .rev()
            .take(n)
            .map(|p| p.value(field))
            .collect(),
        Lookback::Minutes(minutes) => {
            let end = last.time_stamp();
            points
                .iter()
                .rev()
                .take_while(|p| ((end - p.time_stamp()) / MS_PER_MINUTE) as f64 <= minutes)
                .map(|p| p.value(field))
                .collect()
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation around a precomputed mean
pub fn std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}
