//! AggregateSuccessTracker — decayed rolling average of resolved-trade scores.
//!
//! An explicit instance owned by the supervisor and passed by reference —
//! no process-wide mutable state. Decay is applied once per `fold` call,
//! not per elapsed time unit, so callers must fold at a regular cadence
//! (the supervisor folds once per tick) for the decay to represent a
//! consistent half-life.

use serde::{Deserialize, Serialize};

/// Read-only view of the tracker for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub decayed_score_sum: f64,
    pub decayed_count: f64,
    pub current_average: f64,
}

#[derive(Debug, Clone)]
pub struct AggregateSuccessTracker {
    decayed_score_sum: f64,
    decayed_count: f64,
    decay: f64,
}

impl AggregateSuccessTracker {
    pub fn new(decay: f64, seed_score_sum: f64, seed_score_count: f64) -> Self {
        assert!((0.0..1.0).contains(&decay), "decay must be in 0..1");
        Self {
            decayed_score_sum: seed_score_sum,
            decayed_count: seed_score_count,
            decay,
        }
    }

    /// Fold a batch of new scores: decay both accumulators once, then add.
    /// An empty batch still decays — a quiet interval ages the history.
    pub fn fold(&mut self, new_scores: &[f64]) {
        self.decayed_score_sum =
            self.decayed_score_sum * self.decay + new_scores.iter().sum::<f64>();
        self.decayed_count = self.decayed_count * self.decay + new_scores.len() as f64;
    }

    /// Decay-weighted average score; 0 when nothing has been folded.
    pub fn current_average(&self) -> f64 {
        if self.decayed_count == 0.0 {
            return 0.0;
        }
        self.decayed_score_sum / self.decayed_count
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            decayed_score_sum: self.decayed_score_sum,
            decayed_count: self.decayed_count,
            current_average: self.current_average(),
        }
    }
}
