//! Carry-forward merge of a sparse sentiment series onto quotes.
//!
//! Both series must be ascending. The cursor into the sentiment series only
//! moves forward, so aligning `n` quotes against `m` samples costs
//! `O(n + m)` no matter how the quotes are split into batches.
//!
//! The cursor never advances past the second-to-last sample: for `m >= 2`
//! the value of `S[m - 2]` is carried forward to every remaining quote and
//! the final sample is never consumed.

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result};
use crate::models::price::{Quote, SentimentSample, DEFAULT_SENTIMENT};

#[derive(Debug, Clone)]
pub struct SentimentAligner {
    samples: Vec<SentimentSample>,
    cursor: usize,
}

impl SentimentAligner {
    /// Fails with `InvalidInput` when `samples` is empty.
    pub fn new(samples: Vec<SentimentSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(PipelineError::invalid_input(
                "sentiment alignment needs at least one sample",
            ));
        }
        Ok(Self { samples, cursor: 0 })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Sentiment for a price at `timestamp`. Calls must come in ascending
    /// timestamp order.
    pub fn sentiment_at(&mut self, timestamp: &DateTime<Utc>) -> f64 {
        let m = self.samples.len();
        while self.cursor + 2 < m && self.samples[self.cursor + 1].timestamp <= *timestamp {
            self.cursor += 1;
        }

        let current = &self.samples[self.cursor];
        if current.timestamp <= *timestamp {
            current.sentiment
        } else {
            DEFAULT_SENTIMENT
        }
    }

    pub fn assign(&mut self, quote: &mut Quote) {
        quote.sentiment = Some(self.sentiment_at(&quote.timestamp));
    }

    pub fn assign_all(&mut self, quotes: &mut [Quote]) {
        for quote in quotes.iter_mut() {
            self.assign(quote);
        }
    }
}

/// One-shot alignment of a whole quote series.
pub fn align_sentiments(quotes: &mut [Quote], samples: Vec<SentimentSample>) -> Result<()> {
    let mut aligner = SentimentAligner::new(samples)?;
    aligner.assign_all(quotes);
    Ok(())
}
