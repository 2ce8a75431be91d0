//! SigLab Runner — orchestration on top of `siglab-core`.
//!
//! This crate builds on the core engine to provide:
//! - `TradeSupervisor`: concurrent lifecycle orchestration with the
//!   one-active-trade-per-symbol invariant
//! - A tick scheduler with pluggable clocks (real and simulated)
//! - The read-only query surface for UI/reporting collaborators
//! - Resolved-trade CSV/JSON artifacts

pub mod report;
pub mod scheduler;
pub mod supervisor;

pub use report::{
    active_trades, resolved_page, write_resolved_csv, write_resolved_json, ActiveTradeView,
    ResolvedPage,
};
pub use scheduler::{Clock, SimulatedClock, SystemClock, TickDriver};
pub use supervisor::{ResolvedTrade, SignalRejected, TradeSupervisor};
