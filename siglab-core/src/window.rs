//! TimeSeriesWindow — bounded, strictly-ordered per-symbol bar buffer.
//!
//! One ingestion writer appends; many tick workers and feature extractors
//! read concurrently. Reads return owned snapshots (copy-on-read), so no
//! reader ever observes a half-applied append or eviction.

use crate::domain::Bar;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use thiserror::Error;

/// Rejection reasons for `append`. A rejected bar is dropped; the window
/// content is unchanged and never corrupted. Retry/correction is the
/// ingestion collaborator's job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidBar {
    #[error("bar for {symbol} at {timestamp} violates OHLC ordering")]
    IncoherentOhlc {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("bar for {symbol} at {timestamp} is not after last stored timestamp {last}")]
    NonMonotonicTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Per-symbol ring buffer of bars, bounded by capacity, strictly ordered
/// by timestamp. No indicator computation happens here — bars arrive
/// pre-enriched.
pub struct TimeSeriesWindow {
    capacity: usize,
    series: RwLock<HashMap<String, VecDeque<Bar>>>,
}

impl TimeSeriesWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            capacity,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a bar for its symbol.
    ///
    /// Rejects bars that violate OHLC coherence or arrive at or before the
    /// last stored timestamp for the symbol. On success, evicts the oldest
    /// bar if capacity would be exceeded.
    pub fn append(&self, bar: Bar) -> Result<(), InvalidBar> {
        if !bar.is_coherent() {
            return Err(InvalidBar::IncoherentOhlc {
                symbol: bar.symbol.clone(),
                timestamp: bar.timestamp,
            });
        }

        let mut series = self.series.write().expect("window lock poisoned");
        let buffer = series.entry(bar.symbol.clone()).or_default();

        if let Some(last) = buffer.back() {
            if bar.timestamp <= last.timestamp {
                return Err(InvalidBar::NonMonotonicTimestamp {
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                    last: last.timestamp,
                });
            }
        }

        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(bar);
        Ok(())
    }

    /// Most recent bar for `symbol`, if any.
    pub fn latest(&self, symbol: &str) -> Option<Bar> {
        let series = self.series.read().expect("window lock poisoned");
        series.get(symbol).and_then(|buf| buf.back().cloned())
    }

    /// Ordered bars for `symbol` with `from <= timestamp <= to`.
    /// Returns an owned snapshot safe to hold while writes continue.
    pub fn slice(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Bar> {
        let series = self.series.read().expect("window lock poisoned");
        match series.get(symbol) {
            Some(buf) => buf
                .iter()
                .filter(|bar| bar.timestamp >= from && bar.timestamp <= to)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of bars currently stored for `symbol`.
    pub fn len(&self, symbol: &str) -> usize {
        let series = self.series.read().expect("window lock poisoned");
        series.get(symbol).map_or(0, |buf| buf.len())
    }

    pub fn is_empty(&self, symbol: &str) -> bool {
        self.len(symbol) == 0
    }

    /// Symbols with at least one stored bar.
    pub fn symbols(&self) -> Vec<String> {
        let series = self.series.read().expect("window lock poisoned");
        series
            .iter()
            .filter(|(_, buf)| !buf.is_empty())
            .map(|(sym, _)| sym.clone())
            .collect()
    }
}
