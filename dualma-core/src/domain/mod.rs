//! Domain types: bars, orders, fills, positions, closed trades.

pub mod bar;
pub mod fill;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use fill::Fill;
pub use order::{Order, OrderId, OrderSide, OrderStatus, RejectReason};
pub use position::Position;
pub use trade::TradeRecord;
