//! TradeRecord: a completed round trip, entry to full exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub size: u64,

    // ── PnL ──
    /// Price move times size, before commission.
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,

    pub bars_held: usize,
}

impl TradeRecord {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.size as f64)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            entry_bar: 41,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            entry_price: 10.0,
            exit_bar: 60,
            exit_date: NaiveDate::from_ymd_opt(2024, 3, 28).unwrap(),
            exit_price: 11.0,
            size: 1000,
            gross_pnl: 1000.0,
            commission: 6.3,
            net_pnl: 993.7,
            bars_held: 19,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        assert!((trade.return_pct() - 993.7 / 10_000.0).abs() < 1e-12);
    }

    #[test]
    fn winner_and_loser() {
        let mut trade = sample_trade();
        assert!(trade.is_winner());
        trade.net_pnl = -1.0;
        assert!(!trade.is_winner());
    }
}
