//! Read-only query surface and resolved-trade export.
//!
//! Views are plain serializable snapshots: the UI/reporting collaborator
//! gets copies, never references into supervisor-owned state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siglab_core::scorer::CalculationMethod;
use siglab_core::{Direction, Trade, TradeStatus};
use std::path::Path;

use crate::supervisor::{ResolvedTrade, TradeSupervisor};

/// Live view of one active trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTradeView {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub current_price: f64,
    pub pnl_percent: f64,
    pub max_favorable_excursion: f64,
    pub max_adverse_excursion: f64,
    pub profitable_seconds: i64,
    pub loss_seconds: i64,
    pub display_confidence: f64,
    pub internal_confidence: f64,
}

impl ActiveTradeView {
    fn from_trade(trade: &Trade) -> Self {
        Self {
            id: trade.id.to_string(),
            symbol: trade.symbol.clone(),
            direction: trade.direction,
            entry_price: trade.entry_price,
            entry_time: trade.entry_time,
            current_price: trade.current_price,
            pnl_percent: trade.pnl_percent(trade.current_price),
            max_favorable_excursion: trade.max_favorable_excursion,
            max_adverse_excursion: trade.max_adverse_excursion,
            profitable_seconds: trade.profitable_seconds,
            loss_seconds: trade.loss_seconds,
            display_confidence: trade.display_confidence,
            internal_confidence: trade.internal_confidence,
        }
    }
}

/// One page of resolved trades, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPage {
    pub items: Vec<ResolvedTrade>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

/// Current active trades with live metrics.
pub fn active_trades(supervisor: &TradeSupervisor) -> Vec<ActiveTradeView> {
    let mut views: Vec<_> = supervisor
        .active_trades()
        .into_iter()
        .map(ActiveTradeView::from_trade)
        .collect();
    views.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    views
}

/// Paginated resolved history, newest first. Pages are zero-indexed;
/// a page past the end is empty, not an error.
pub fn resolved_page(
    supervisor: &TradeSupervisor,
    page: usize,
    page_size: usize,
) -> ResolvedPage {
    let all = supervisor.resolved_trades();
    let total = all.len();
    let items = all
        .iter()
        .rev()
        .skip(page * page_size)
        .take(page_size)
        .cloned()
        .collect();
    ResolvedPage { items, page, page_size, total }
}

/// Flat row shape for the CSV artifact.
#[derive(Debug, Serialize)]
struct ResolvedCsvRow<'a> {
    trade_id: String,
    symbol: &'a str,
    direction: Direction,
    status: TradeStatus,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
    entry_price: f64,
    exit_price: Option<f64>,
    mfe: f64,
    mae: f64,
    profitable_seconds: i64,
    loss_seconds: i64,
    actual_movement_pct: f64,
    excluded_from_learning: bool,
    score: f64,
    method: CalculationMethod,
    profit_component: f64,
    time_component: f64,
    favorable_component: f64,
    drawdown_penalty: f64,
}

/// Write the resolved-trade tape with scores as CSV.
pub fn write_resolved_csv(path: &Path, resolved: &[ResolvedTrade]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create resolved trades CSV {}", path.display()))?;

    for record in resolved {
        let trade = &record.trade;
        writer.serialize(ResolvedCsvRow {
            trade_id: trade.id.to_string(),
            symbol: &trade.symbol,
            direction: trade.direction,
            status: trade.status,
            entry_time: trade.entry_time,
            exit_time: trade.exit_time,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            mfe: trade.max_favorable_excursion,
            mae: trade.max_adverse_excursion,
            profitable_seconds: trade.profitable_seconds,
            loss_seconds: trade.loss_seconds,
            actual_movement_pct: trade.actual_movement_pct,
            excluded_from_learning: trade.excluded_from_learning,
            score: record.score.value,
            method: record.score.method,
            profit_component: record.score.breakdown.profit_component,
            time_component: record.score.breakdown.time_component,
            favorable_component: record.score.breakdown.favorable_component,
            drawdown_penalty: record.score.breakdown.drawdown_penalty,
        })?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush resolved trades CSV {}", path.display()))?;
    Ok(())
}

/// Write the resolved-trade tape as pretty JSON.
pub fn write_resolved_json(path: &Path, resolved: &[ResolvedTrade]) -> Result<()> {
    let json =
        serde_json::to_string_pretty(resolved).context("failed to serialize resolved trades")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write resolved trades JSON {}", path.display()))?;
    Ok(())
}
