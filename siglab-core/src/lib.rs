//! SigLab Core — domain types, time-series window, trade lifecycle, scoring.
//!
//! This crate contains the heart of the signal grader:
//! - Domain types (bars, signals, trades, deterministic ids)
//! - Bounded, strictly-ordered per-symbol time-series window
//! - Temporal leakage guard for feature/sample construction
//! - Trade lifecycle state machine (ACTIVE → one terminal state)
//! - Branch-aware outcome scorer with a single weight set
//! - Decayed aggregate success tracker
//!
//! No I/O and no logging live here; orchestration is `siglab-runner`'s job.

pub mod config;
pub mod domain;
pub mod leakage;
pub mod lifecycle;
pub mod scorer;
pub mod tracker;
pub mod window;

pub use config::{ConfigError, ScoreWeights, SimConfig};
pub use domain::{Bar, Direction, IndicatorSnapshot, Trade, TradeId, TradeSignal, TradeStatus};
pub use leakage::{AuditReport, BoundaryCheck, LeakageViolation};
pub use lifecycle::TradeLifecycle;
pub use scorer::{CalculationMethod, Score, ScoreBreakdown, ScoreError};
pub use tracker::{AggregateSuccessTracker, TrackerSnapshot};
pub use window::{InvalidBar, TimeSeriesWindow};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the supervisor's worker
    /// threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::TradeSignal>();
        require_sync::<domain::TradeSignal>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::TradeStatus>();
        require_sync::<domain::TradeStatus>();
        require_send::<domain::TradeId>();
        require_sync::<domain::TradeId>();

        // Engine pieces
        require_send::<window::TimeSeriesWindow>();
        require_sync::<window::TimeSeriesWindow>();
        require_send::<lifecycle::TradeLifecycle>();
        require_sync::<lifecycle::TradeLifecycle>();
        require_send::<tracker::AggregateSuccessTracker>();
        require_sync::<tracker::AggregateSuccessTracker>();

        // Results and config
        require_send::<scorer::Score>();
        require_sync::<scorer::Score>();
        require_send::<config::SimConfig>();
        require_sync::<config::SimConfig>();
    }
}
