use serde::{Deserialize, Serialize};

/// The single open holding of a strategy. `size == 0` means flat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: i64,
    pub avg_price: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.avg_price)
    }

    /// Add shares at `price`, averaging the entry price.
    pub(crate) fn add(&mut self, size: i64, price: f64) {
        let new_size = self.size + size;
        if new_size == 0 {
            *self = Position::default();
            return;
        }
        self.avg_price =
            (self.avg_price * self.size as f64 + price * size as f64) / new_size as f64;
        self.size = new_size;
    }

    /// Remove shares. The average entry price is kept until the position is flat.
    pub(crate) fn reduce(&mut self, size: i64) {
        self.size -= size;
        if self.size == 0 {
            self.avg_price = 0.0;
        }
    }
}
