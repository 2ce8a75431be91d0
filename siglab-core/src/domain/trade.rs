//! Trade — one simulated position, from signal acceptance to resolution.

use super::ids::TradeId;
use super::signal::{boost_confidence, Direction, TradeSignal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a simulated trade.
///
/// `Active` is the only non-terminal state. Transitions are one-way:
/// `Active` moves to exactly one terminal state and never again. The enum
/// is closed and matched exhaustively in the scorer and the supervisor, so
/// a new terminal state cannot be silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Active,
    /// Take-profit price touched.
    TpHit,
    /// Stop-loss price touched.
    SlHit,
    /// Holding horizon elapsed with meaningful profit most of the way.
    PulloutProfit,
    /// Holding horizon elapsed without meaningful profit.
    NoProfit,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Active)
    }
}

/// One simulated position with its accumulated live metrics.
///
/// Owned exclusively by the supervisor while `status == Active`; once
/// terminal it is handed to reporting/persistence and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub symbol: String,
    pub direction: Direction,

    // ── Entry ──
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,

    // ── Signal provenance ──
    pub display_confidence: f64,
    pub internal_confidence: f64,
    pub profit_likelihood: f64,

    // ── Live metrics ──
    pub status: TradeStatus,
    pub current_price: f64,
    /// Best signed pnl percent reached so far (MFE).
    pub max_favorable_excursion: f64,
    /// Worst signed pnl percent reached so far (MAE).
    pub max_adverse_excursion: f64,
    /// Seconds spent with pnl above the neutral epsilon.
    pub profitable_seconds: i64,
    /// Seconds spent with pnl below the negative neutral epsilon.
    pub loss_seconds: i64,

    // ── Resolution ──
    pub exit_price: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
    /// |exit - entry| / entry, as a percentage. Set at resolution.
    pub actual_movement_pct: f64,
    /// True when the resolved move was too small to teach anything.
    /// The trade is still recorded and scored, but kept out of the
    /// downstream learning aggregate.
    pub excluded_from_learning: bool,
}

impl Trade {
    /// Open a trade from an accepted signal. TP/SL are placed at fixed
    /// percentage distances from entry, direction-aware.
    pub fn open(signal: &TradeSignal, take_profit_pct: f64, stop_loss_pct: f64) -> Self {
        let entry = signal.entry_price;
        let (tp, sl) = match signal.direction {
            Direction::Long => (
                entry * (1.0 + take_profit_pct / 100.0),
                entry * (1.0 - stop_loss_pct / 100.0),
            ),
            Direction::Short => (
                entry * (1.0 - take_profit_pct / 100.0),
                entry * (1.0 + stop_loss_pct / 100.0),
            ),
        };

        Self {
            id: TradeId::derive(&signal.symbol, signal.timestamp, entry),
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price: entry,
            entry_time: signal.timestamp,
            take_profit_price: tp,
            stop_loss_price: sl,
            display_confidence: signal.display_confidence,
            internal_confidence: boost_confidence(
                signal.display_confidence,
                signal.profit_likelihood,
            ),
            profit_likelihood: signal.profit_likelihood,
            status: TradeStatus::Active,
            current_price: entry,
            max_favorable_excursion: 0.0,
            max_adverse_excursion: 0.0,
            profitable_seconds: 0,
            loss_seconds: 0,
            exit_price: None,
            exit_time: None,
            actual_movement_pct: 0.0,
            excluded_from_learning: false,
        }
    }

    /// Signed pnl percent at `price`, sign-adjusted for direction.
    pub fn pnl_percent(&self, price: f64) -> f64 {
        let raw = (price - self.entry_price) / self.entry_price * 100.0;
        match self.direction {
            Direction::Long => raw,
            Direction::Short => -raw,
        }
    }

    /// Whole seconds elapsed since entry at `now` (never negative).
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entry_time).num_seconds().max(0)
    }

    /// Fraction of elapsed time spent profitable, 0 when nothing elapsed.
    pub fn profitable_ratio(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = self.elapsed_seconds(now);
        if elapsed == 0 {
            return 0.0;
        }
        self.profitable_seconds as f64 / elapsed as f64
    }
}
