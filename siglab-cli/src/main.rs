//! SigLab CLI — run the grading simulator against synthetic market data.
//!
//! Commands:
//! - `simulate` — drive a full session over seeded random-walk bars and
//!   periodic synthetic signals, then print a grading summary
//! - `default-config` — print the built-in configuration as TOML

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siglab_core::domain::{Bar, Direction, IndicatorSnapshot, TradeSignal};
use siglab_core::{SimConfig, TimeSeriesWindow, TradeStatus};
use siglab_runner::scheduler::Clock;
use siglab_runner::{
    write_resolved_csv, write_resolved_json, SignalRejected, SimulatedClock, TradeSupervisor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "siglab", about = "SigLab CLI — trading-signal grading simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated grading session over synthetic random-walk data.
    Simulate {
        /// Symbols to simulate.
        #[arg(long, num_args = 1.., default_values_t = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()])]
        symbols: Vec<String>,

        /// Session length in minutes.
        #[arg(long, default_value_t = 180)]
        minutes: i64,

        /// Emit one synthetic signal per free symbol every N minutes.
        #[arg(long, default_value_t = 10)]
        signal_every: i64,

        /// RNG seed for the synthetic price walk.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Path to a TOML config file. Defaults to built-in constants.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for exports.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Write resolved trades as CSV.
        #[arg(long, default_value_t = false)]
        csv: bool,

        /// Write resolved trades as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the built-in configuration as TOML.
    DefaultConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            symbols,
            minutes,
            signal_every,
            seed,
            config,
            output_dir,
            csv,
            json,
        } => run_simulate(
            symbols, minutes, signal_every, seed, config, output_dir, csv, json,
        ),
        Commands::DefaultConfig => {
            let toml = toml::to_string_pretty(&SimConfig::default())?;
            print!("{toml}");
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    symbols: Vec<String>,
    minutes: i64,
    signal_every: i64,
    seed: u64,
    config_path: Option<PathBuf>,
    output_dir: PathBuf,
    csv: bool,
    json: bool,
) -> Result<()> {
    anyhow::ensure!(minutes > 0, "--minutes must be positive");
    anyhow::ensure!(signal_every > 0, "--signal-every must be positive");

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimConfig::from_toml(&content)?
        }
        None => SimConfig::default(),
    };

    tracing::info!(
        symbols = symbols.len(),
        minutes,
        seed,
        "starting simulated grading session"
    );

    let window = Arc::new(TimeSeriesWindow::new(config.window_capacity));
    let mut supervisor = TradeSupervisor::new(Arc::clone(&window), config);

    // Fixed epoch so a seed fully determines the session.
    let clock = SimulatedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    let mut walks: Vec<PriceWalk> = symbols
        .iter()
        .enumerate()
        .map(|(i, sym)| PriceWalk::new(sym.clone(), seed.wrapping_add(i as u64)))
        .collect();

    let mut signals_emitted = 0usize;
    let mut signals_rejected = 0usize;

    for minute in 1..=minutes {
        clock.advance(Duration::minutes(1));
        let now = clock.now();

        for walk in &mut walks {
            let bar = walk.next_bar(now);
            supervisor.window().append(bar)?;
        }

        if minute % signal_every == 0 {
            for walk in &mut walks {
                let signal = walk.next_signal(now);
                signals_emitted += 1;
                match supervisor.accept_signal(&signal) {
                    Ok(_) => {}
                    Err(SignalRejected::DuplicateActiveTrade { .. }) => {
                        signals_rejected += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        supervisor.tick(now);
    }

    print_summary(&supervisor, minutes, signals_emitted, signals_rejected);

    if csv || json {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;
        if csv {
            let path = output_dir.join("resolved.csv");
            write_resolved_csv(&path, supervisor.resolved_trades())?;
            println!("CSV written to: {}", path.display());
        }
        if json {
            let path = output_dir.join("resolved.json");
            write_resolved_json(&path, supervisor.resolved_trades())?;
            println!("JSON written to: {}", path.display());
        }
    }

    Ok(())
}

/// Seeded geometric random walk producing one-minute bars and periodic
/// synthetic signals for a single symbol.
struct PriceWalk {
    symbol: String,
    price: f64,
    rng: StdRng,
}

impl PriceWalk {
    fn new(symbol: String, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let price = rng.gen_range(50.0..500.0);
        Self { symbol, price, rng }
    }

    fn next_bar(&mut self, now: chrono::DateTime<Utc>) -> Bar {
        let open = self.price;
        // ~0.1% per-minute vol with a slight upward drift
        let ret = 0.00002 + 0.001 * self.rng.gen_range(-1.0..1.0);
        let close = (open * (1.0 + ret)).max(0.01);
        let wick = open.max(close) * 0.0005 * self.rng.gen_range(0.0..1.0);
        let volume = self.rng.gen_range(100.0..10_000.0);
        let buy_fraction = self.rng.gen_range(0.3..0.7);
        self.price = close;

        Bar {
            symbol: self.symbol.clone(),
            timestamp: now,
            open,
            high: open.max(close) + wick,
            low: (open.min(close) - wick).max(0.01),
            close,
            volume,
            trade_count: self.rng.gen_range(10..1_000),
            buy_volume: volume * buy_fraction,
            sell_volume: volume * (1.0 - buy_fraction),
            indicators: IndicatorSnapshot::neutral(close),
        }
    }

    fn next_signal(&mut self, now: chrono::DateTime<Utc>) -> TradeSignal {
        let direction = if self.rng.gen_bool(0.5) {
            Direction::Long
        } else {
            Direction::Short
        };
        TradeSignal {
            symbol: self.symbol.clone(),
            direction,
            display_confidence: self.rng.gen_range(55.0..90.0),
            profit_likelihood: self.rng.gen_range(40.0..80.0),
            entry_price: self.price,
            timestamp: now,
        }
    }
}

fn print_summary(
    supervisor: &TradeSupervisor,
    minutes: i64,
    signals_emitted: usize,
    signals_rejected: usize,
) {
    let resolved = supervisor.resolved_trades();
    let count_status =
        |s: TradeStatus| resolved.iter().filter(|r| r.trade.status == s).count();
    let excluded = resolved
        .iter()
        .filter(|r| r.trade.excluded_from_learning)
        .count();
    let mean_score = if resolved.is_empty() {
        0.0
    } else {
        resolved.iter().map(|r| r.score.value).sum::<f64>() / resolved.len() as f64
    };
    let snapshot = supervisor.tracker_snapshot();

    println!();
    println!("=== Simulation Result ===");
    println!("Duration:         {minutes} min");
    println!("Signals emitted:  {signals_emitted}");
    println!("Signals rejected: {signals_rejected} (duplicate active)");
    println!("Still active:     {}", supervisor.active_count());
    println!("Resolved:         {}", resolved.len());
    println!();
    println!("--- Outcomes ---");
    println!("TP hit:           {}", count_status(TradeStatus::TpHit));
    println!("SL hit:           {}", count_status(TradeStatus::SlHit));
    println!(
        "Pullout profit:   {}",
        count_status(TradeStatus::PulloutProfit)
    );
    println!("No profit:        {}", count_status(TradeStatus::NoProfit));
    println!("Excluded:         {excluded} (movement below threshold)");
    println!();
    println!("--- Grading ---");
    println!("Mean score:       {mean_score:.1}");
    println!(
        "Tracked average:  {:.1} (decayed count {:.2})",
        snapshot.current_average, snapshot.decayed_count
    );
    println!();
}
