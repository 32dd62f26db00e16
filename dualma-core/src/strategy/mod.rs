//! Strategy trait and the per-bar context it reads.
//!
//! A strategy sees the market and its own account only through a read-only
//! [`BarContext`] and answers with at most one [`OrderRequest`] per bar. It
//! never touches the broker directly; the bar loop submits the request and
//! reports the outcome back through [`Strategy::on_event`].

pub mod dual_ma;

pub use dual_ma::DualMaStrategy;

use crate::broker::BrokerEvent;
use crate::domain::{Bar, OrderSide, Position};
use crate::indicators::IndicatorError;
use crate::series::SeriesBuffer;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("indicator failure: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Read-only view of one bar and the account state at decision time.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar_index: usize,
    pub bar: &'a Bar,
    /// Close prices up to and including this bar.
    pub closes: &'a SeriesBuffer,
    pub cash: f64,
    pub position: &'a Position,
    /// An order submitted earlier has not been executed yet.
    pub has_pending_order: bool,
}

/// An order the strategy wants submitted this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub size: u64,
}

impl OrderRequest {
    pub fn buy(size: u64) -> Self {
        Self {
            side: OrderSide::Buy,
            size,
        }
    }

    pub fn sell(size: u64) -> Self {
        Self {
            side: OrderSide::Sell,
            size,
        }
    }
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Label used in the end-of-run summary line.
    fn label(&self) -> String {
        self.name().to_string()
    }

    /// Bars processed before the strategy can produce its first request.
    fn warmup_bars(&self) -> usize;

    /// Per-bar decision. Called exactly once per bar, after the new close has
    /// been appended to `ctx.closes`.
    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Result<Option<OrderRequest>, StrategyError>;

    /// Notification of a broker outcome for one of this strategy's orders.
    fn on_event(&mut self, _event: &BrokerEvent) {}
}
