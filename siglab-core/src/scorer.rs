//! OutcomeScorer — pure mapping from a resolved trade to a bounded score.
//!
//! Branch contracts:
//! - TP_HIT scores exactly 100, SL_HIT exactly 0.
//! - Time-expiry resolutions use the weighted tanh/exponential-bonus
//!   formula and land in [0, 100].
//!
//! The function is idempotent: scoring the same terminal trade twice
//! yields the same score. There is exactly one weight set
//! ([`ScoreWeights`](crate::config::ScoreWeights)) in the codebase.

use crate::config::ScoreWeights;
use crate::domain::{Trade, TradeId, TradeStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("trade {0} is still active and cannot be scored")]
    TradeStillActive(TradeId),
}

/// Which branch produced the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMethod {
    TakeProfit,
    StopLoss,
    TimeExpiry,
}

/// Per-component contribution to a time-expiry score. All zeros for the
/// TP/SL branches except the profit component of a take-profit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub profit_component: f64,
    pub time_component: f64,
    pub favorable_component: f64,
    pub drawdown_penalty: f64,
}

impl ScoreBreakdown {
    fn zero() -> Self {
        Self {
            profit_component: 0.0,
            time_component: 0.0,
            favorable_component: 0.0,
            drawdown_penalty: 0.0,
        }
    }
}

/// Immutable score record, 1:1 with a terminal trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub trade_id: TradeId,
    pub value: f64,
    pub breakdown: ScoreBreakdown,
    pub method: CalculationMethod,
}

/// Score a resolved trade.
///
/// Errors when the trade is still ACTIVE — an active trade has no final
/// metrics and scoring it would be a caller bug, not a recoverable state.
pub fn score(trade: &Trade, weights: &ScoreWeights) -> Result<Score, ScoreError> {
    let method = match trade.status {
        TradeStatus::Active => return Err(ScoreError::TradeStillActive(trade.id.clone())),
        TradeStatus::TpHit => CalculationMethod::TakeProfit,
        TradeStatus::SlHit => CalculationMethod::StopLoss,
        TradeStatus::PulloutProfit | TradeStatus::NoProfit => CalculationMethod::TimeExpiry,
    };

    let (value, breakdown) = match method {
        CalculationMethod::TakeProfit => (
            100.0,
            ScoreBreakdown {
                profit_component: 100.0,
                ..ScoreBreakdown::zero()
            },
        ),
        CalculationMethod::StopLoss => (0.0, ScoreBreakdown::zero()),
        CalculationMethod::TimeExpiry => time_expiry_score(trade, weights),
    };

    Ok(Score {
        trade_id: trade.id.clone(),
        value,
        breakdown,
        method,
    })
}

fn time_expiry_score(trade: &Trade, weights: &ScoreWeights) -> (f64, ScoreBreakdown) {
    let exit_price = trade.exit_price.unwrap_or(trade.current_price);
    let final_pnl = trade.pnl_percent(exit_price);

    let elapsed = trade
        .exit_time
        .map(|t| trade.elapsed_seconds(t))
        .unwrap_or(0);
    let ratio = if elapsed > 0 {
        trade.profitable_seconds as f64 / elapsed as f64
    } else {
        0.0
    };

    let profit_component = weights.profit_weight * final_pnl.tanh();

    let mut time_component = weights.time_weight * ratio;
    if ratio > 0.5 {
        let bonus = ((ratio - 0.5) * weights.ratio_bonus_k)
            .exp()
            .min(weights.ratio_bonus_cap);
        time_component *= bonus;
    }
    if ratio >= 0.9 {
        time_component += weights.high_ratio_bonus;
    }

    let favorable_component = weights.favorable_weight * trade.max_favorable_excursion.tanh();
    let drawdown_penalty = weights.drawdown_weight * trade.max_adverse_excursion.tanh().abs();

    let raw = profit_component + time_component + favorable_component - drawdown_penalty;
    let value = raw.clamp(0.0, 100.0);

    (
        value,
        ScoreBreakdown {
            profit_component,
            time_component,
            favorable_component,
            drawdown_penalty,
        },
    )
}
