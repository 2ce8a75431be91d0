//! Serializable simulation configuration.
//!
//! Every tunable constant lives here, enumerated once and passed by
//! reference to the components that need it. Loadable from TOML; the
//! `Default` impl carries the production constants.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Weights and bonus constants for the time-expiry scoring branch.
///
/// This is the single source of truth for the scoring formula — there is
/// deliberately no second weight set anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// W1 — weight on tanh(final net profit percent).
    pub profit_weight: f64,
    /// W2 — weight on the profitable time ratio.
    pub time_weight: f64,
    /// W3 — weight on tanh(max favorable excursion).
    pub favorable_weight: f64,
    /// W4 — weight on |tanh(max adverse excursion)|, subtracted.
    pub drawdown_weight: f64,
    /// Exponent factor for the multiplicative bonus above ratio 0.5.
    pub ratio_bonus_k: f64,
    /// Cap on the multiplicative ratio bonus.
    pub ratio_bonus_cap: f64,
    /// Additive bonus when the profitable ratio reaches 0.9.
    pub high_ratio_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profit_weight: 40.0,
            time_weight: 30.0,
            favorable_weight: 20.0,
            drawdown_weight: 10.0,
            ratio_bonus_k: 2.0,
            ratio_bonus_cap: 1.6,
            high_ratio_bonus: 5.0,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Max bars retained per symbol in the time-series window.
    pub window_capacity: usize,

    // ── Trade placement ──
    /// Take-profit distance from entry, percent.
    pub take_profit_pct: f64,
    /// Stop-loss distance from entry, percent.
    pub stop_loss_pct: f64,

    // ── Lifecycle ──
    /// |pnl%| at or below this counts as a neutral tick.
    pub neutral_epsilon_pct: f64,
    /// Maximum holding duration before forced time-expiry resolution.
    pub max_holding_secs: i64,
    /// Minimum pnl% for a time-expiry resolution to count as pullout profit.
    pub minimal_profit_pct: f64,
    /// Minimum profitable time ratio for pullout profit.
    pub pullout_profitable_ratio: f64,
    /// Resolved moves below this percent are excluded from learning.
    pub min_movement_pct: f64,

    // ── Leakage guard ──
    /// Minimum separation between last feature point and target, seconds.
    pub min_temporal_gap_secs: i64,

    // ── Aggregate tracker ──
    /// Decay applied once per fold call.
    pub decay: f64,
    /// Seed for the decayed score sum.
    pub seed_score_sum: f64,
    /// Seed for the decayed score count.
    pub seed_score_count: f64,

    // ── Scoring ──
    pub weights: ScoreWeights,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            window_capacity: 600,
            take_profit_pct: 2.0,
            stop_loss_pct: 1.0,
            neutral_epsilon_pct: 0.02,
            max_holding_secs: 20 * 60,
            minimal_profit_pct: 0.1,
            pullout_profitable_ratio: 0.2,
            min_movement_pct: 0.1,
            min_temporal_gap_secs: 60,
            decay: 0.98,
            seed_score_sum: 0.0,
            seed_score_count: 0.0,
            weights: ScoreWeights::default(),
        }
    }
}

impl SimConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// The configured leakage gap as a `Duration`, for passing straight
    /// into `leakage::audit_sample` / `leakage::check_sample`.
    pub fn min_temporal_gap(&self) -> Duration {
        Duration::seconds(self.min_temporal_gap_secs)
    }

    /// Reject values that would break component invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid("window_capacity must be > 0".into()));
        }
        if self.take_profit_pct <= 0.0 || self.stop_loss_pct <= 0.0 {
            return Err(ConfigError::Invalid(
                "take_profit_pct and stop_loss_pct must be positive".into(),
            ));
        }
        if self.neutral_epsilon_pct < 0.0 {
            return Err(ConfigError::Invalid(
                "neutral_epsilon_pct must be >= 0".into(),
            ));
        }
        if self.max_holding_secs <= 0 {
            return Err(ConfigError::Invalid("max_holding_secs must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.pullout_profitable_ratio) {
            return Err(ConfigError::Invalid(
                "pullout_profitable_ratio must be in 0..=1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(ConfigError::Invalid("decay must be in 0..1".into()));
        }
        if self.seed_score_count < 0.0 || self.seed_score_sum < 0.0 {
            return Err(ConfigError::Invalid("tracker seeds must be >= 0".into()));
        }
        if self.min_temporal_gap_secs < 0 {
            return Err(ConfigError::Invalid(
                "min_temporal_gap_secs must be >= 0".into(),
            ));
        }
        let w = &self.weights;
        if w.profit_weight < 0.0
            || w.time_weight < 0.0
            || w.favorable_weight < 0.0
            || w.drawdown_weight < 0.0
        {
            return Err(ConfigError::Invalid("score weights must be >= 0".into()));
        }
        if w.ratio_bonus_cap < 1.0 {
            return Err(ConfigError::Invalid("ratio_bonus_cap must be >= 1".into()));
        }
        Ok(())
    }
}
