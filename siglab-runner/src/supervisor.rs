//! TradeSupervisor — orchestrates concurrent trade lifecycles.
//!
//! Owns the symbol → lifecycle map and is the only writer of trade state,
//! which enforces the core invariant: at most one ACTIVE trade per symbol.
//! Each tick fans out across active lifecycles in parallel (every
//! lifecycle is touched by exactly one worker per tick), then resolutions
//! are scored and folded into the tracker as a single batch.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use siglab_core::scorer::{score, Score};
use siglab_core::{
    AggregateSuccessTracker, SimConfig, TimeSeriesWindow, TrackerSnapshot, Trade, TradeId,
    TradeLifecycle, TradeSignal,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rejection reasons for `accept_signal`. A rejected signal is a no-op:
/// the producer may resubmit once the blocking condition clears.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalRejected {
    #[error("an active trade already exists for {symbol}")]
    DuplicateActiveTrade { symbol: String },

    #[error("signal for {symbol} failed validation: {reason}")]
    InvalidSignal { symbol: String, reason: String },
}

/// A terminal trade paired with its immutable score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrade {
    pub trade: Trade,
    pub score: Score,
}

pub struct TradeSupervisor {
    window: Arc<TimeSeriesWindow>,
    config: SimConfig,
    active: HashMap<String, TradeLifecycle>,
    resolved: Vec<ResolvedTrade>,
    tracker: AggregateSuccessTracker,
}

impl TradeSupervisor {
    pub fn new(window: Arc<TimeSeriesWindow>, config: SimConfig) -> Self {
        let tracker = AggregateSuccessTracker::new(
            config.decay,
            config.seed_score_sum,
            config.seed_score_count,
        );
        Self {
            window,
            config,
            active: HashMap::new(),
            resolved: Vec::new(),
            tracker,
        }
    }

    /// Accept a candidate signal into a new lifecycle, unless one is
    /// already active for the symbol.
    pub fn accept_signal(&mut self, signal: &TradeSignal) -> Result<TradeId, SignalRejected> {
        if !signal.is_valid() {
            return Err(SignalRejected::InvalidSignal {
                symbol: signal.symbol.clone(),
                reason: "entry price must be positive and confidences in 0..100".into(),
            });
        }
        if self.active.contains_key(&signal.symbol) {
            return Err(SignalRejected::DuplicateActiveTrade {
                symbol: signal.symbol.clone(),
            });
        }

        let trade = Trade::open(
            signal,
            self.config.take_profit_pct,
            self.config.stop_loss_pct,
        );
        let id = trade.id.clone();
        info!(
            symbol = %trade.symbol,
            direction = %trade.direction,
            entry = trade.entry_price,
            tp = trade.take_profit_price,
            sl = trade.stop_loss_price,
            trade_id = %id,
            "accepted signal"
        );
        self.active
            .insert(signal.symbol.clone(), TradeLifecycle::new(trade, &self.config));
        Ok(id)
    }

    /// Drive every active lifecycle one tick forward.
    ///
    /// Lifecycles with no current bar are skipped (warned, not fatal) but
    /// still resolve from the clock at their horizon. Resolutions from
    /// this tick are scored and folded as one batch; the tracker is
    /// folded exactly once per tick so the decay cadence stays regular.
    /// The tracker is the downstream learning aggregate, so trades marked
    /// `excluded_from_learning` are scored and retained in history but
    /// never contribute to the fold.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let window = &self.window;
        let resolved_symbols: Vec<String> = self
            .active
            .par_iter_mut()
            .filter_map(|(symbol, lifecycle)| {
                let bar = window.latest(symbol);
                if bar.is_none() {
                    warn!(symbol = %symbol, "no price data this tick, skipping update");
                }
                lifecycle
                    .on_tick(bar.as_ref(), now)
                    .map(|_| symbol.clone())
            })
            .collect();

        let mut fold_batch = Vec::with_capacity(resolved_symbols.len());
        for symbol in resolved_symbols {
            let lifecycle = self
                .active
                .remove(&symbol)
                .expect("resolved symbol came from the active map");
            let trade = lifecycle.into_trade();
            let trade_score = score(&trade, &self.config.weights)
                .expect("lifecycle only resolves into terminal states");

            info!(
                symbol = %trade.symbol,
                trade_id = %trade.id,
                status = ?trade.status,
                value = trade_score.value,
                excluded = trade.excluded_from_learning,
                "trade resolved"
            );

            if trade.excluded_from_learning {
                debug!(trade_id = %trade.id, "movement below threshold, kept out of learning fold");
            } else {
                fold_batch.push(trade_score.value);
            }
            self.resolved.push(ResolvedTrade { trade, score: trade_score });
        }

        self.tracker.fold(&fold_batch);
    }

    /// Number of currently active lifecycles.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether a symbol currently has an active trade.
    pub fn has_active(&self, symbol: &str) -> bool {
        self.active.contains_key(symbol)
    }

    /// Live trade records, one per active lifecycle.
    pub fn active_trades(&self) -> Vec<&Trade> {
        self.active.values().map(|lc| lc.trade()).collect()
    }

    /// All resolved trades with scores, oldest first.
    pub fn resolved_trades(&self) -> &[ResolvedTrade] {
        &self.resolved
    }

    pub fn tracker_snapshot(&self) -> TrackerSnapshot {
        self.tracker.snapshot()
    }

    /// Decay-weighted average score across resolved trades.
    pub fn success_average(&self) -> f64 {
        self.tracker.current_average()
    }

    pub fn window(&self) -> &Arc<TimeSeriesWindow> {
        &self.window
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use siglab_core::domain::{Bar, Direction, IndicatorSnapshot};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn signal(symbol: &str) -> TradeSignal {
        TradeSignal {
            symbol: symbol.into(),
            direction: Direction::Long,
            display_confidence: 70.0,
            profit_likelihood: 60.0,
            entry_price: 100.0,
            timestamp: base(),
        }
    }

    fn bar(symbol: &str, minute: i64, close: f64) -> Bar {
        Bar {
            symbol: symbol.into(),
            timestamp: base() + Duration::minutes(minute),
            open: close,
            high: close + 0.1,
            low: close - 0.1,
            close,
            volume: 1_000.0,
            trade_count: 100,
            buy_volume: 600.0,
            sell_volume: 400.0,
            indicators: IndicatorSnapshot::neutral(close),
        }
    }

    fn supervisor() -> TradeSupervisor {
        let window = Arc::new(TimeSeriesWindow::new(600));
        TradeSupervisor::new(window, SimConfig::default())
    }

    #[test]
    fn duplicate_signal_is_rejected() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();
        let err = sup.accept_signal(&signal("BTCUSDT")).unwrap_err();
        assert!(matches!(err, SignalRejected::DuplicateActiveTrade { .. }));
        assert_eq!(sup.active_count(), 1);
    }

    #[test]
    fn invalid_signal_is_rejected() {
        let mut sup = supervisor();
        let mut bad = signal("BTCUSDT");
        bad.entry_price = -1.0;
        let err = sup.accept_signal(&bad).unwrap_err();
        assert!(matches!(err, SignalRejected::InvalidSignal { .. }));
        assert_eq!(sup.active_count(), 0);
    }

    #[test]
    fn different_symbols_run_concurrently() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();
        sup.accept_signal(&signal("ETHUSDT")).unwrap();
        assert_eq!(sup.active_count(), 2);
    }

    #[test]
    fn tick_without_bars_keeps_trade_active() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();
        sup.tick(base() + Duration::minutes(1));
        assert!(sup.has_active("BTCUSDT"));
        assert!(sup.resolved_trades().is_empty());
    }

    #[test]
    fn resolution_moves_trade_out_and_folds_score() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();

        // bar touching TP (102 for a long from 100 at default 2%)
        let mut b = bar("BTCUSDT", 1, 101.9);
        b.high = 102.0;
        sup.window().append(b).unwrap();
        sup.tick(base() + Duration::minutes(1));

        assert!(!sup.has_active("BTCUSDT"));
        assert_eq!(sup.resolved_trades().len(), 1);
        let resolved = &sup.resolved_trades()[0];
        assert_eq!(resolved.score.value, 100.0);
        assert!((sup.success_average() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn symbol_frees_up_after_resolution() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();

        let mut b = bar("BTCUSDT", 1, 101.9);
        b.high = 102.0;
        sup.window().append(b).unwrap();
        sup.tick(base() + Duration::minutes(1));

        // a fresh signal for the same symbol is accepted again
        let mut next = signal("BTCUSDT");
        next.timestamp = base() + Duration::minutes(2);
        assert!(sup.accept_signal(&next).is_ok());
    }

    #[test]
    fn excluded_trades_do_not_feed_the_tracker() {
        let mut sup = supervisor();
        sup.accept_signal(&signal("BTCUSDT")).unwrap();

        // flat price to horizon: NO_PROFIT with ~zero movement → excluded
        for minute in 1..=20 {
            sup.window().append(bar("BTCUSDT", minute, 100.0)).unwrap();
            sup.tick(base() + Duration::minutes(minute));
        }

        assert_eq!(sup.resolved_trades().len(), 1);
        assert!(sup.resolved_trades()[0].trade.excluded_from_learning);
        // tracker saw only empty folds → average stays 0
        assert_eq!(sup.success_average(), 0.0);
    }
}
