//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of pre-computed indicators attached to a bar.
///
/// Indicator computation lives in the ingestion collaborator; bars arrive
/// already enriched. The window and the lifecycle treat these values as
/// opaque data — only feature extraction reads them, and only through the
/// leakage guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub stochastic_k: f64,
    pub stochastic_d: f64,
    pub realized_volatility: f64,
}

impl IndicatorSnapshot {
    /// A neutral snapshot (RSI/stochastics at midpoint, bands collapsed).
    /// Used by ingestion when an indicator has not warmed up yet.
    pub fn neutral(price: f64) -> Self {
        Self {
            rsi: 50.0,
            macd_line: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            bollinger_upper: price,
            bollinger_middle: price,
            bollinger_lower: price,
            stochastic_k: 50.0,
            stochastic_d: 50.0,
            realized_volatility: 0.0,
        }
    }
}

/// OHLCV bar for a single symbol at a fixed time resolution, with
/// order-flow counters and an indicator snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub indicators: IndicatorSnapshot,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn has_nan(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// OHLC coherence check: high >= max(open, close), low <= min(open, close),
    /// positive prices, no NaN.
    pub fn is_coherent(&self) -> bool {
        if self.has_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}
