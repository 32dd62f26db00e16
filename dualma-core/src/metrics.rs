//! Run summary: pure functions over the equity curve, trades and orders.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Nothing here depends on the engine.

use crate::domain::{Order, OrderStatus, TradeRecord};
use serde::{Deserialize, Serialize};

/// Aggregate statistics of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub starting_cash: f64,
    pub ending_value: f64,
    pub total_return: f64,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub total_commission: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub orders_submitted: usize,
    pub orders_filled: usize,
    pub orders_rejected: usize,
    pub bars_processed: usize,
    pub warmup_bars: usize,
    pub config_hash: Option<String>,
}

impl Summary {
    /// Compute the summary from finalized run data.
    ///
    /// `orders` holds finalized orders only; `unfilled` counts an order still
    /// pending after the last bar as submitted.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        starting_cash: f64,
        ending_value: f64,
        equity_curve: &[f64],
        trades: &[TradeRecord],
        orders: &[Order],
        unfilled: bool,
        total_commission: f64,
        warmup_bars: usize,
    ) -> Self {
        let (filled, rejected) = order_counts(orders);
        Self {
            starting_cash,
            ending_value,
            total_return: total_return(starting_cash, ending_value),
            max_drawdown: max_drawdown_from(starting_cash, equity_curve),
            total_commission,
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            orders_submitted: orders.len() + usize::from(unfilled),
            orders_filled: filled,
            orders_rejected: rejected,
            bars_processed: equity_curve.len(),
            warmup_bars,
            config_hash: None,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    max_drawdown_from(first, equity_curve)
}

/// Maximum drawdown with `initial` as the starting peak.
fn max_drawdown_from(initial: f64, equity_curve: &[f64]) -> f64 {
    let mut peak = initial;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Net P&L of closed trades, split by sign.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PnlSplit {
    winners: usize,
    won: f64,
    /// Positive magnitude of the losing trades' net P&L.
    lost: f64,
}

impl PnlSplit {
    fn of(trades: &[TradeRecord]) -> Self {
        trades.iter().fold(Self::default(), |mut split, trade| {
            if trade.is_winner() {
                split.winners += 1;
                split.won += trade.net_pnl;
            } else if trade.net_pnl < 0.0 {
                split.lost -= trade.net_pnl;
            }
            split
        })
    }
}

/// Profit factor reported when no trade lost money.
const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Share of closed trades whose net P&L is positive; 0.0 with no trades.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    match trades.len() {
        0 => 0.0,
        n => PnlSplit::of(trades).winners as f64 / n as f64,
    }
}

/// Net winnings over net losses, capped at [`PROFIT_FACTOR_CAP`].
///
/// A run with winners and no losers reports the cap; a run with neither
/// reports 0.0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let PnlSplit { won, lost, .. } = PnlSplit::of(trades);
    if lost > 0.0 {
        (won / lost).min(PROFIT_FACTOR_CAP)
    } else if won > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    }
}

/// (filled, rejected) counts of finalized orders.
pub fn order_counts(orders: &[Order]) -> (usize, usize) {
    orders.iter().fold((0, 0), |(f, r), o| match o.status {
        OrderStatus::Filled => (f + 1, r),
        OrderStatus::Rejected(_) => (f, r + 1),
        OrderStatus::Pending => (f, r),
    })
}
