//! Broker: cash, the open position, and the single pending-order slot.
//!
//! The broker owns every piece of mutable account state. Orders move through
//! `Pending → Filled | Rejected`; at most one order can be pending at a time.
//!
//! Executing the pending order returns typed [`BrokerEvent`]s instead of
//! invoking callbacks, so the bar loop decides who is told about a fill, a
//! rejection or a closed round trip.
//!
//! Commission is `price * size * commission_rate`, charged on notional value
//! for both buys and sells. No rounding is applied anywhere.

use crate::config::{BrokerConfig, ConfigError};
use crate::domain::{
    Fill, Order, OrderId, OrderSide, OrderStatus, Position, RejectReason, TradeRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("order {0} is still pending; a second order cannot be submitted")]
    OrderAlreadyPending(OrderId),
}

/// Outcome of executing an order, reported synchronously to the bar loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrokerEvent {
    OrderFilled(Fill),
    OrderRejected {
        order_id: OrderId,
        side: OrderSide,
        size: u64,
        reason: RejectReason,
    },
    /// A sell brought the position back to flat.
    TradeClosed(TradeRecord),
}

/// Bookkeeping for the round trip currently open.
#[derive(Debug, Clone)]
struct OpenTrade {
    entry_bar: usize,
    entry_date: NaiveDate,
    entry_price: f64,
    size: u64,
    commission: f64,
    realized_gross: f64,
}

#[derive(Debug, Clone)]
pub struct Broker {
    cash: f64,
    commission_rate: f64,
    position: Position,
    pending: Option<Order>,
    /// Finalized orders, in the order they reached a terminal state.
    orders: Vec<Order>,
    next_order_id: u64,
    open_trade: Option<OpenTrade>,
    total_commission: f64,
}

impl Broker {
    pub fn new(starting_cash: f64, commission_rate: f64) -> Self {
        Self {
            cash: starting_cash,
            commission_rate,
            position: Position::default(),
            pending: None,
            orders: Vec::new(),
            next_order_id: 1,
            open_trade: None,
            total_commission: 0.0,
        }
    }

    pub fn from_config(config: &BrokerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.starting_cash, config.commission_rate))
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn pending(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of pending orders (0 or 1).
    pub fn pending_count(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    /// Finalized (filled or rejected) orders.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    /// Portfolio value: cash plus the position marked at `mark_price`.
    pub fn value(&self, mark_price: f64) -> f64 {
        self.cash + self.position.market_value(mark_price)
    }

    // ── Order submission ───────────────────────────────────────────────

    pub fn submit_buy(&mut self, size: u64, bar_index: usize) -> Result<OrderId, BrokerError> {
        self.submit(OrderSide::Buy, size, bar_index)
    }

    /// Submit a sell. Size is not checked against the position here; an
    /// oversized sell is rejected at execution.
    pub fn submit_sell(&mut self, size: u64, bar_index: usize) -> Result<OrderId, BrokerError> {
        self.submit(OrderSide::Sell, size, bar_index)
    }

    fn submit(
        &mut self,
        side: OrderSide,
        size: u64,
        bar_index: usize,
    ) -> Result<OrderId, BrokerError> {
        if let Some(pending) = &self.pending {
            return Err(BrokerError::OrderAlreadyPending(pending.id));
        }
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        self.pending = Some(Order::new(id, side, size, bar_index));
        Ok(id)
    }

    // ── Execution ──────────────────────────────────────────────────────

    /// Execute the pending order, if any, at `price`.
    ///
    /// The pending slot is always cleared: the order ends either Filled or
    /// Rejected and moves to the order history.
    pub fn execute_pending(
        &mut self,
        price: f64,
        bar_index: usize,
        date: NaiveDate,
    ) -> Vec<BrokerEvent> {
        let Some(mut order) = self.pending.take() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        match self.check_fill(&order, price) {
            Err(reason) => {
                order.status = OrderStatus::Rejected(reason);
                events.push(BrokerEvent::OrderRejected {
                    order_id: order.id,
                    side: order.side,
                    size: order.size,
                    reason,
                });
            }
            Ok((commission, shares)) => {
                let fill = Fill {
                    order_id: order.id,
                    bar_index,
                    date,
                    side: order.side,
                    price,
                    size: order.size,
                    value: price * order.size as f64,
                    commission,
                };
                order.status = OrderStatus::Filled;
                let closed = self.apply_fill(&fill, shares);
                events.push(BrokerEvent::OrderFilled(fill));
                if let Some(trade) = closed {
                    events.push(BrokerEvent::TradeClosed(trade));
                }
            }
        }

        order.closed_bar = Some(bar_index);
        self.orders.push(order);
        events
    }

    /// Returns the commission the fill would cost and the signed share count,
    /// or why it cannot happen.
    fn check_fill(&self, order: &Order, price: f64) -> Result<(f64, i64), RejectReason> {
        if order.size == 0 {
            return Err(RejectReason::ZeroSize);
        }
        let shares = i64::try_from(order.size).map_err(|_| RejectReason::SizeTooLarge)?;
        let value = price * order.size as f64;
        let commission = value * self.commission_rate;
        match order.side {
            OrderSide::Buy if self.position.size.checked_add(shares).is_none() => {
                Err(RejectReason::SizeTooLarge)
            }
            OrderSide::Buy if value + commission > self.cash => Err(RejectReason::InsufficientCash),
            OrderSide::Sell if shares > self.position.size => {
                Err(RejectReason::InsufficientPosition)
            }
            _ => Ok((commission, shares)),
        }
    }

    /// Update cash, position and trade bookkeeping together.
    /// Returns the closed trade when a sell leaves the position flat.
    /// `shares` is `fill.size` as validated by `check_fill`.
    fn apply_fill(&mut self, fill: &Fill, shares: i64) -> Option<TradeRecord> {
        self.total_commission += fill.commission;

        match fill.side {
            OrderSide::Buy => {
                self.cash -= fill.value + fill.commission;
                self.position.add(shares, fill.price);
                let trade = self.open_trade.get_or_insert(OpenTrade {
                    entry_bar: fill.bar_index,
                    entry_date: fill.date,
                    entry_price: fill.price,
                    size: 0,
                    commission: 0.0,
                    realized_gross: 0.0,
                });
                trade.entry_price = self.position.avg_price;
                trade.size += fill.size;
                trade.commission += fill.commission;
                None
            }
            OrderSide::Sell => {
                let entry_price = self.position.avg_price;
                self.cash += fill.value - fill.commission;
                self.position.reduce(shares);

                let trade = self.open_trade.as_mut()?;
                trade.realized_gross += (fill.price - entry_price) * fill.size as f64;
                trade.commission += fill.commission;

                if !self.position.is_flat() {
                    return None;
                }
                let trade = self.open_trade.take()?;
                Some(TradeRecord {
                    entry_bar: trade.entry_bar,
                    entry_date: trade.entry_date,
                    entry_price: trade.entry_price,
                    exit_bar: fill.bar_index,
                    exit_date: fill.date,
                    exit_price: fill.price,
                    size: trade.size,
                    gross_pnl: trade.realized_gross,
                    commission: trade.commission,
                    net_pnl: trade.realized_gross - trade.commission,
                    bars_held: fill.bar_index - trade.entry_bar,
                })
            }
        }
    }
}
