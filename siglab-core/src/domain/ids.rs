use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic trade identifier.
///
/// Derived from (symbol, entry timestamp, entry price) so that replaying
/// the same signal stream yields the same ids across runs and platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl TradeId {
    /// Generate the id from the trade's identifying tuple.
    ///
    /// Uses BLAKE3 over a canonical JSON form for a stable,
    /// collision-resistant hash across builds/platforms.
    pub fn derive(symbol: &str, entry_time: DateTime<Utc>, entry_price: f64) -> Self {
        use serde_json::json;

        let canonical = json!({
            "symbol": symbol,
            "entry_time": entry_time.timestamp_millis(),
            "entry_price": format!("{entry_price:.8}"),
        });

        let hash = blake3::hash(canonical.to_string().as_bytes());
        // 16 hex chars is plenty for uniqueness at this volume.
        Self(hash.to_hex()[..16].to_string())
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
