//! Tick scheduling — a single periodic driver over a pluggable clock.
//!
//! One logical clock drives every lifecycle update. Production uses
//! `SystemClock`; tests use `SimulatedClock` to replay tick sequences
//! deterministically. Stopping the driver halts future ticks but lets the
//! in-flight tick finish (stop joins the driver thread), so a batch of
//! trades is never left half-updated.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

use crate::supervisor::TradeSupervisor;

/// Source of logical time for the tick loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Step-controlled clock for deterministic replay in tests.
#[derive(Debug)]
pub struct SimulatedClock {
    now: Mutex<DateTime<Utc>>,
}

impl SimulatedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now = to;
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Background thread invoking `TradeSupervisor::tick` at a fixed interval.
pub struct TickDriver {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Spawn the driver. The supervisor mutex is held only for the
    /// duration of each tick, so readers of the query surface are not
    /// starved between ticks.
    pub fn start(
        supervisor: Arc<Mutex<TradeSupervisor>>,
        clock: Arc<dyn Clock>,
        interval: std::time::Duration,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, "tick driver started");
            while !flag.load(Ordering::Relaxed) {
                let now = clock.now();
                {
                    let mut sup = supervisor.lock().expect("supervisor lock poisoned");
                    sup.tick(now);
                    debug!(active = sup.active_count(), "tick complete");
                }
                thread::sleep(interval);
            }
            info!("tick driver stopped");
        });

        Self { shutdown, handle: Some(handle) }
    }

    /// Signal shutdown and wait for the in-flight tick to complete.
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
