//! Domain types: bars, signals, trades, identifiers.

pub mod bar;
pub mod ids;
pub mod signal;
pub mod trade;

pub use bar::{Bar, IndicatorSnapshot};
pub use ids::TradeId;
pub use signal::{boost_confidence, Direction, TradeSignal};
pub use trade::{Trade, TradeStatus};
