use crate::domain::order::{OrderId, OrderSide};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Execution record for a filled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub price: f64,
    pub size: u64,
    /// Notional value, `price * size`.
    pub value: f64,
    pub commission: f64,
}
