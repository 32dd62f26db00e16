//! Per-bar records and the result of a complete run.

use crate::broker::BrokerEvent;
use crate::domain::{Fill, Order, Position, TradeRecord};
use crate::metrics::Summary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account state after a bar has been fully processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub cash: f64,
    pub position_size: i64,
    /// `cash + position_size * close`.
    pub equity: f64,
    /// Orders still pending at the bar boundary (0 or 1).
    pub pending_orders: usize,
}

/// A broker event stamped with the bar that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub event: BrokerEvent,
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub strategy: String,
    /// Finalized orders in the order they completed.
    pub orders: Vec<Order>,
    /// An order still pending after the last bar (next-bar-open timing only).
    pub unfilled_order: Option<Order>,
    pub fills: Vec<Fill>,
    /// Completed round-trip trades.
    pub trades: Vec<TradeRecord>,
    /// Every broker event, in emission order.
    pub events: Vec<EventRecord>,
    /// One point per processed bar.
    pub equity_curve: Vec<EquityPoint>,
    pub final_cash: f64,
    pub final_position: Position,
    /// Cash plus the position marked at the last close.
    pub ending_value: f64,
    pub summary: Summary,
}

impl RunResult {
    /// Number of orders the strategy submitted, including one left unfilled.
    pub fn orders_submitted(&self) -> usize {
        self.orders.len() + usize::from(self.unfilled_order.is_some())
    }
}
