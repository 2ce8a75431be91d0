//! TemporalLeakageGuard — pure validation against look-ahead contamination.
//!
//! Invariant: no feature value used for a prediction at time T may depend
//! on data from T or later. Equal timestamps are a violation, not an edge
//! case that passes. Violations are surfaced as structured reasons and
//! never silently corrected.

use crate::domain::Bar;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Hard-stop error for feature/sample construction call sites. A sample
/// that fails the guard must never be used for training or inference.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("temporal leakage: {violations:?}")]
pub struct LeakageViolation {
    pub violations: Vec<String>,
}

/// Result of a single boundary check.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCheck {
    pub ok: bool,
    /// Present exactly when `ok` is false.
    pub reason: Option<String>,
}

impl BoundaryCheck {
    fn pass() -> Self {
        Self { ok: true, reason: None }
    }

    fn fail(reason: String) -> Self {
        Self { ok: false, reason: Some(reason) }
    }
}

/// Outcome of a full sample audit.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub passed: bool,
    pub violations: Vec<String>,
}

/// Check that the feature window ends strictly before the target starts.
///
/// Fails when `feature_end >= target_start` — strict inequality required.
pub fn validate_boundary(
    feature_end: DateTime<Utc>,
    target_start: DateTime<Utc>,
) -> BoundaryCheck {
    if feature_end >= target_start {
        BoundaryCheck::fail(format!(
            "feature window ends at {feature_end} which is not strictly before target start {target_start}"
        ))
    } else {
        BoundaryCheck::pass()
    }
}

/// Keep only bars with `timestamp <= as_of`. Bars from the future are
/// dropped, never adjusted.
pub fn filter_historical(bars: &[Bar], as_of: DateTime<Utc>) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| bar.timestamp <= as_of)
        .cloned()
        .collect()
}

/// Audit one training/inference sample.
///
/// Checks, in order:
/// 1. Every input point lies at or before `base_ts` (the simulated
///    decision time).
/// 2. The boundary between the last input point and `target_ts` holds
///    strictly.
/// 3. The last input point and `target_ts` are separated by at least
///    `min_gap`.
///
/// Inputs must be in timestamp order; out-of-order inputs are reported as
/// violations too, since they indicate the sample was assembled wrong.
pub fn audit_sample(
    inputs: &[Bar],
    target_ts: DateTime<Utc>,
    base_ts: DateTime<Utc>,
    min_gap: Duration,
) -> AuditReport {
    let mut violations = Vec::new();

    if inputs.is_empty() {
        violations.push("sample has no input points".to_string());
        return AuditReport { passed: false, violations };
    }

    for pair in inputs.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            violations.push(format!(
                "input sequence not strictly ordered: {} followed by {}",
                pair[0].timestamp, pair[1].timestamp
            ));
        }
    }

    for bar in inputs {
        if bar.timestamp > base_ts {
            violations.push(format!(
                "input at {} is after decision time {base_ts}",
                bar.timestamp
            ));
        }
    }

    let last_input = inputs[inputs.len() - 1].timestamp;
    let boundary = validate_boundary(last_input, target_ts);
    if let Some(reason) = boundary.reason {
        violations.push(reason);
    }

    if target_ts - last_input < min_gap {
        violations.push(format!(
            "gap between last input ({last_input}) and target ({target_ts}) is below the minimum of {}s",
            min_gap.num_seconds()
        ));
    }

    AuditReport { passed: violations.is_empty(), violations }
}

/// `audit_sample` as a hard stop: Ok only when the audit passes.
pub fn check_sample(
    inputs: &[Bar],
    target_ts: DateTime<Utc>,
    base_ts: DateTime<Utc>,
    min_gap: Duration,
) -> Result<(), LeakageViolation> {
    let report = audit_sample(inputs, target_ts, base_ts, min_gap);
    if report.passed {
        Ok(())
    } else {
        Err(LeakageViolation { violations: report.violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndicatorSnapshot;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, minute, 0).unwrap()
    }

    fn bar_at(minute: u32) -> Bar {
        Bar {
            symbol: "BTCUSDT".into(),
            timestamp: ts(minute),
            open: 99.5,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1_000.0,
            trade_count: 100,
            buy_volume: 600.0,
            sell_volume: 400.0,
            indicators: IndicatorSnapshot::neutral(100.0),
        }
    }

    #[test]
    fn boundary_passes_when_strictly_before() {
        assert!(validate_boundary(ts(0), ts(1)).ok);
    }

    #[test]
    fn boundary_fails_on_equal_timestamps() {
        let check = validate_boundary(ts(5), ts(5));
        assert!(!check.ok);
        assert!(check.reason.unwrap().contains("not strictly before"));
    }

    #[test]
    fn boundary_fails_when_feature_after_target() {
        assert!(!validate_boundary(ts(6), ts(5)).ok);
    }

    #[test]
    fn filter_drops_future_bars() {
        let bars = vec![bar_at(0), bar_at(1), bar_at(2), bar_at(3)];
        let kept = filter_historical(&bars, ts(1));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|b| b.timestamp <= ts(1)));
    }

    #[test]
    fn filter_keeps_bar_exactly_at_as_of() {
        let bars = vec![bar_at(0), bar_at(1)];
        let kept = filter_historical(&bars, ts(1));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn audit_passes_clean_sample() {
        let inputs = vec![bar_at(0), bar_at(1), bar_at(2)];
        let report = audit_sample(&inputs, ts(5), ts(2), Duration::minutes(1));
        assert!(report.passed, "{:?}", report.violations);
    }

    #[test]
    fn audit_flags_input_after_decision_time() {
        let inputs = vec![bar_at(0), bar_at(3)];
        let report = audit_sample(&inputs, ts(10), ts(2), Duration::minutes(1));
        assert!(!report.passed);
        assert!(report.violations[0].contains("after decision time"));
    }

    #[test]
    fn audit_flags_insufficient_gap() {
        let inputs = vec![bar_at(0), bar_at(1)];
        // target only 30s after last input, 1 minute required
        let target = ts(1) + Duration::seconds(30);
        let report = audit_sample(&inputs, target, ts(1), Duration::minutes(1));
        assert!(!report.passed);
        assert!(report
            .violations
            .iter()
            .any(|v| v.contains("below the minimum")));
    }

    #[test]
    fn audit_flags_unordered_inputs() {
        let inputs = vec![bar_at(2), bar_at(1)];
        let report = audit_sample(&inputs, ts(10), ts(5), Duration::minutes(1));
        assert!(!report.passed);
        assert!(report
            .violations
            .iter()
            .any(|v| v.contains("not strictly ordered")));
    }

    #[test]
    fn audit_flags_empty_sample() {
        let report = audit_sample(&[], ts(10), ts(5), Duration::minutes(1));
        assert!(!report.passed);
    }

    #[test]
    fn check_sample_is_a_hard_stop() {
        let inputs = vec![bar_at(0), bar_at(5)];
        // equal boundary: last input at minute 5, target at minute 5
        let err = check_sample(&inputs, ts(5), ts(5), Duration::zero()).unwrap_err();
        assert!(!err.violations.is_empty());

        let ok = check_sample(&inputs, ts(7), ts(5), Duration::minutes(1));
        assert!(ok.is_ok());
    }
}
