//! Supervisor integration: the full loop from signal acceptance through
//! ticks to scored resolution, driven by a simulated clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use siglab_core::domain::{Bar, Direction, IndicatorSnapshot, TradeSignal};
use siglab_core::{SimConfig, TimeSeriesWindow, TradeStatus};
use siglab_runner::{
    active_trades, resolved_page, write_resolved_csv, SignalRejected, SimulatedClock,
    TickDriver, TradeSupervisor,
};
use siglab_runner::scheduler::Clock;
use std::sync::{Arc, Mutex};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn signal(symbol: &str, at: DateTime<Utc>) -> TradeSignal {
    TradeSignal {
        symbol: symbol.into(),
        direction: Direction::Long,
        display_confidence: 70.0,
        profit_likelihood: 60.0,
        entry_price: 100.0,
        timestamp: at,
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

fn new_supervisor() -> TradeSupervisor {
    TradeSupervisor::new(Arc::new(TimeSeriesWindow::new(600)), SimConfig::default())
}

/// Scenario D: two signals for the same symbol before the first resolves.
#[test]
fn scenario_d_duplicate_signal_rejected() {
    let mut sup = new_supervisor();
    sup.accept_signal(&signal("BTCUSDT", base())).unwrap();

    let err = sup
        .accept_signal(&signal("BTCUSDT", base() + Duration::seconds(5)))
        .unwrap_err();
    assert_eq!(
        err,
        SignalRejected::DuplicateActiveTrade { symbol: "BTCUSDT".into() }
    );
    assert_eq!(sup.active_count(), 1);
}

/// At most one active trade per symbol holds across interleaved
/// accepts, resolutions, and re-accepts on several symbols.
#[test]
fn one_active_per_symbol_across_resolutions() {
    let mut sup = new_supervisor();
    let symbols = ["BTCUSDT", "ETHUSDT", "SOLUSDT"];
    for sym in symbols {
        sup.accept_signal(&signal(sym, base())).unwrap();
    }
    assert_eq!(sup.active_count(), 3);

    // resolve BTCUSDT via TP; leave the others running flat
    let mut b = bar("BTCUSDT", 1, 101.9);
    b.high = 102.0;
    sup.window().append(b).unwrap();
    for sym in ["ETHUSDT", "SOLUSDT"] {
        sup.window().append(bar(sym, 1, 100.0)).unwrap();
    }
    sup.tick(base() + Duration::minutes(1));

    assert!(!sup.has_active("BTCUSDT"));
    assert_eq!(sup.active_count(), 2);

    // BTCUSDT is free again, the busy symbols still reject
    sup.accept_signal(&signal("BTCUSDT", base() + Duration::minutes(2)))
        .unwrap();
    assert!(sup
        .accept_signal(&signal("ETHUSDT", base() + Duration::minutes(2)))
        .is_err());
    assert_eq!(sup.active_count(), 3);
}

/// Repeated missing bars skip updates, but the clock still resolves the
/// trade once the holding horizon elapses.
#[test]
fn missing_bars_resolve_via_time_expiry() {
    let mut sup = new_supervisor();
    sup.accept_signal(&signal("BTCUSDT", base())).unwrap();

    // no bar is ever appended for this symbol
    for minute in 1..20 {
        sup.tick(base() + Duration::minutes(minute));
        assert!(sup.has_active("BTCUSDT"), "resolved early at {minute}");
    }
    sup.tick(base() + Duration::minutes(20));

    assert!(!sup.has_active("BTCUSDT"));
    let resolved = sup.resolved_trades();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].trade.status, TradeStatus::NoProfit);
    assert!(resolved[0].trade.excluded_from_learning);
}

/// Deterministic replay: the same signal + bar + tick sequence through a
/// simulated clock produces identical resolved output.
#[test]
fn simulated_clock_replay_is_deterministic() {
    let run = || {
        let mut sup = new_supervisor();
        let clock = SimulatedClock::new(base());
        sup.accept_signal(&signal("BTCUSDT", base())).unwrap();

        for minute in 1..=20 {
            clock.advance(Duration::minutes(1));
            let close = 100.0 + ((minute * 7) % 5) as f64 * 0.05;
            sup.window().append(bar("BTCUSDT", minute, close)).unwrap();
            sup.tick(clock.now());
        }
        sup.resolved_trades().to_vec()
    };

    let first = run();
    let second = run();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[test]
fn query_surface_reports_live_metrics_and_pages() {
    let mut sup = new_supervisor();
    sup.accept_signal(&signal("BTCUSDT", base())).unwrap();
    sup.accept_signal(&signal("ETHUSDT", base())).unwrap();

    sup.window().append(bar("BTCUSDT", 1, 100.5)).unwrap();
    sup.window().append(bar("ETHUSDT", 1, 99.6)).unwrap();
    sup.tick(base() + Duration::minutes(1));

    let views = active_trades(&sup);
    assert_eq!(views.len(), 2);
    // sorted by symbol
    assert_eq!(views[0].symbol, "BTCUSDT");
    assert!((views[0].pnl_percent - 0.5).abs() < 1e-9);
    assert!((views[1].pnl_percent + 0.4).abs() < 1e-9);
    assert!(views[0].internal_confidence > views[0].display_confidence);

    // resolve both through the horizon, then page the history
    for minute in 2..=20 {
        sup.window().append(bar("BTCUSDT", minute, 100.5)).unwrap();
        sup.window().append(bar("ETHUSDT", minute, 99.6)).unwrap();
        sup.tick(base() + Duration::minutes(minute));
    }
    assert_eq!(sup.active_count(), 0);

    let page = resolved_page(&sup, 0, 1);
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    let page2 = resolved_page(&sup, 1, 1);
    assert_eq!(page2.items.len(), 1);
    assert_ne!(page.items[0].trade.symbol, page2.items[0].trade.symbol);
    // past the end: empty, not an error
    assert!(resolved_page(&sup, 2, 1).items.is_empty());
}

#[test]
fn csv_export_writes_one_row_per_resolved_trade() {
    let mut sup = new_supervisor();
    sup.accept_signal(&signal("BTCUSDT", base())).unwrap();
    let mut b = bar("BTCUSDT", 1, 101.9);
    b.high = 102.0;
    sup.window().append(b).unwrap();
    sup.tick(base() + Duration::minutes(1));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resolved.csv");
    write_resolved_csv(&path, sup.resolved_trades()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("trade_id"));
    assert!(header.contains("score"));
    let row = lines.next().unwrap();
    assert!(row.contains("BTCUSDT"));
    assert!(row.contains("TP_HIT"));
    assert!(lines.next().is_none());
}

/// The driver thread stops cleanly and the in-flight tick completes.
#[test]
fn tick_driver_starts_and_stops_cleanly() {
    let sup = Arc::new(Mutex::new(new_supervisor()));
    {
        let mut sup = sup.lock().unwrap();
        sup.accept_signal(&signal("BTCUSDT", base())).unwrap();
    }

    let clock = Arc::new(SimulatedClock::new(base()));
    let driver = TickDriver::start(
        Arc::clone(&sup),
        clock.clone(),
        std::time::Duration::from_millis(5),
    );

    // let a few ticks run, then stop
    std::thread::sleep(std::time::Duration::from_millis(30));
    driver.stop();

    // supervisor is immediately usable after shutdown — no poisoned lock
    let sup = sup.lock().unwrap();
    assert_eq!(sup.active_count(), 1);
}
