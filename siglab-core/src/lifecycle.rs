//! TradeLifecycle — state machine for one simulated position.
//!
//! ACTIVE → exactly one of {TP_HIT, SL_HIT, PULLOUT_PROFIT, NO_PROFIT}.
//! No other transitions exist. Resolution is driven by the logical clock,
//! not by bar arrival: a trade that stops receiving bars still resolves
//! once its holding horizon elapses.

use crate::config::SimConfig;
use crate::domain::{Bar, Direction, Trade, TradeStatus};
use chrono::{DateTime, Utc};

/// Lifecycle thresholds, copied out of `SimConfig` at construction so a
/// lifecycle never observes a config change mid-flight.
#[derive(Debug, Clone, Copy)]
struct LifecycleParams {
    neutral_epsilon_pct: f64,
    max_holding_secs: i64,
    minimal_profit_pct: f64,
    pullout_profitable_ratio: f64,
    min_movement_pct: f64,
}

impl From<&SimConfig> for LifecycleParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            neutral_epsilon_pct: config.neutral_epsilon_pct,
            max_holding_secs: config.max_holding_secs,
            minimal_profit_pct: config.minimal_profit_pct,
            pullout_profitable_ratio: config.pullout_profitable_ratio,
            min_movement_pct: config.min_movement_pct,
        }
    }
}

/// Drives one trade from entry to resolution, one tick at a time.
#[derive(Debug, Clone)]
pub struct TradeLifecycle {
    trade: Trade,
    params: LifecycleParams,
    /// End of the last interval that was classified into the time buckets.
    last_tick: DateTime<Utc>,
}

impl TradeLifecycle {
    pub fn new(trade: Trade, config: &SimConfig) -> Self {
        let last_tick = trade.entry_time;
        Self {
            trade,
            params: config.into(),
            last_tick,
        }
    }

    pub fn trade(&self) -> &Trade {
        &self.trade
    }

    pub fn is_terminal(&self) -> bool {
        self.trade.status.is_terminal()
    }

    /// Surrender the trade record (normally after resolution).
    pub fn into_trade(self) -> Trade {
        self.trade
    }

    /// Process one scheduler tick.
    ///
    /// `bar` is the latest bar for the trade's symbol, or `None` when no
    /// price data is available this tick. A missing bar skips all metric
    /// updates (the interval is attributed to neither time bucket) but the
    /// holding horizon is still enforced from the clock.
    ///
    /// Returns the terminal status when this tick resolved the trade.
    pub fn on_tick(&mut self, bar: Option<&Bar>, now: DateTime<Utc>) -> Option<TradeStatus> {
        if self.trade.status.is_terminal() {
            return None;
        }

        let bar = match bar {
            Some(bar) => bar,
            None => {
                // Skipped interval: no mutation, no classification.
                self.last_tick = now.max(self.last_tick);
                return self.check_horizon(now);
            }
        };

        let tick_secs = (now - self.last_tick).num_seconds().max(0);
        self.last_tick = now.max(self.last_tick);

        let pnl = self.trade.pnl_percent(bar.close);
        self.trade.current_price = bar.close;
        self.trade.max_favorable_excursion = self.trade.max_favorable_excursion.max(pnl);
        self.trade.max_adverse_excursion = self.trade.max_adverse_excursion.min(pnl);

        if pnl > self.params.neutral_epsilon_pct {
            self.trade.profitable_seconds += tick_secs;
        } else if pnl < -self.params.neutral_epsilon_pct {
            self.trade.loss_seconds += tick_secs;
        }
        // neutral: neither bucket advances

        // Exit checks, in contract order: TP, then SL, then horizon.
        if self.touched_take_profit(bar) {
            return Some(self.resolve(TradeStatus::TpHit, self.trade.take_profit_price, now));
        }
        if self.touched_stop_loss(bar) {
            return Some(self.resolve(TradeStatus::SlHit, self.trade.stop_loss_price, now));
        }
        self.check_horizon(now)
    }

    /// Intrabar, direction-aware take-profit touch.
    fn touched_take_profit(&self, bar: &Bar) -> bool {
        match self.trade.direction {
            Direction::Long => bar.high >= self.trade.take_profit_price,
            Direction::Short => bar.low <= self.trade.take_profit_price,
        }
    }

    /// Intrabar, direction-aware stop-loss touch.
    fn touched_stop_loss(&self, bar: &Bar) -> bool {
        match self.trade.direction {
            Direction::Long => bar.low <= self.trade.stop_loss_price,
            Direction::Short => bar.high >= self.trade.stop_loss_price,
        }
    }

    /// Time-expiry branch: once the holding horizon has elapsed, split
    /// into pullout-profit vs no-profit at the last observed price.
    fn check_horizon(&mut self, now: DateTime<Utc>) -> Option<TradeStatus> {
        let elapsed = self.trade.elapsed_seconds(now);
        if elapsed < self.params.max_holding_secs {
            return None;
        }

        let exit_price = self.trade.current_price;
        let pnl = self.trade.pnl_percent(exit_price);
        let ratio = self.trade.profitable_ratio(now);

        let status = if pnl > self.params.minimal_profit_pct
            && ratio >= self.params.pullout_profitable_ratio
        {
            TradeStatus::PulloutProfit
        } else {
            TradeStatus::NoProfit
        };
        Some(self.resolve(status, exit_price, now))
    }

    fn resolve(&mut self, status: TradeStatus, exit_price: f64, now: DateTime<Utc>) -> TradeStatus {
        debug_assert!(status.is_terminal());
        self.trade.status = status;
        self.trade.exit_price = Some(exit_price);
        self.trade.exit_time = Some(now);
        self.trade.current_price = exit_price;

        let movement =
            (exit_price - self.trade.entry_price).abs() / self.trade.entry_price * 100.0;
        self.trade.actual_movement_pct = movement;
        if movement < self.params.min_movement_pct {
            self.trade.excluded_from_learning = true;
        }
        status
    }
}
