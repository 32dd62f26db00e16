//! Orders and their lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential order identifier, unique within one broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Why the broker refused to fill an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Buy cost plus commission exceeds available cash.
    InsufficientCash,
    /// Sell size exceeds the open position.
    InsufficientPosition,
    /// Order size is zero.
    ZeroSize,
    /// Order size does not fit a signed share count.
    SizeTooLarge,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientCash => write!(f, "insufficient cash"),
            RejectReason::InsufficientPosition => write!(f, "insufficient position"),
            RejectReason::ZeroSize => write!(f, "zero size"),
            RejectReason::SizeTooLarge => write!(f, "size too large"),
        }
    }
}

/// Order lifecycle: `Pending → Filled | Rejected`. Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Rejected(RejectReason),
}

/// A one-shot market order for a whole number of shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub size: u64,
    pub status: OrderStatus,
    /// Bar index at which the order was submitted.
    pub created_bar: usize,
    /// Bar index at which the order reached a terminal state.
    pub closed_bar: Option<usize>,
}

impl Order {
    pub fn new(id: OrderId, side: OrderSide, size: u64, created_bar: usize) -> Self {
        Self {
            id,
            side,
            size,
            status: OrderStatus::Pending,
            created_bar,
            closed_bar: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_is_pending() {
        let order = Order::new(OrderId(1), OrderSide::Buy, 100, 3);
        assert!(order.is_pending());
        assert_eq!(order.closed_bar, None);
    }

    #[test]
    fn terminal_states_are_not_pending() {
        let mut order = Order::new(OrderId(1), OrderSide::Sell, 100, 3);
        order.status = OrderStatus::Filled;
        assert!(!order.is_pending());

        order.status = OrderStatus::Rejected(RejectReason::InsufficientPosition);
        assert!(!order.is_pending());
    }

    #[test]
    fn display_formats() {
        assert_eq!(OrderId(7).to_string(), "#7");
        assert_eq!(OrderSide::Sell.to_string(), "SELL");
        assert_eq!(RejectReason::ZeroSize.to_string(), "zero size");
        assert_eq!(RejectReason::SizeTooLarge.to_string(), "size too large");
    }
}
