//! TradeSignal — the input tuple produced by the upstream signal generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A candidate trade emitted by the signal producer.
///
/// `display_confidence` is exactly what the producer reported; the internal
/// confidence used for decisions is derived from it by [`boost_confidence`]
/// and stored alongside it on the trade record. Both are named fields —
/// nothing diverges silently between what is shown and what is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub direction: Direction,
    /// Producer-reported confidence, 0..100.
    pub display_confidence: f64,
    /// Producer-estimated probability of a profitable outcome, 0..100.
    pub profit_likelihood: f64,
    pub entry_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradeSignal {
    /// Basic range validation for the producer contract.
    pub fn is_valid(&self) -> bool {
        self.entry_price > 0.0
            && (0.0..=100.0).contains(&self.display_confidence)
            && (0.0..=100.0).contains(&self.profit_likelihood)
            && !self.symbol.is_empty()
    }
}

/// Derive internal confidence from the displayed confidence and the
/// profit likelihood.
///
/// The boost is monotone and bounded: it only raises confidence, and only
/// when the producer's profit likelihood is better than a coin flip.
/// Result is clamped to 0..100.
pub fn boost_confidence(display_confidence: f64, profit_likelihood: f64) -> f64 {
    let edge = (profit_likelihood - 50.0).max(0.0);
    (display_confidence + 0.15 * edge).clamp(0.0, 100.0)
}
