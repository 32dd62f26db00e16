//! Backtesting engine: the bar-by-bar event loop and its result types.
//!
//! Per bar, in order:
//!
//! 1. Open: with next-bar-open timing, execute the order left pending by the
//!    previous bar at this bar's open
//! 2. Decision: append the close, let the strategy update its indicators and
//!    request at most one order
//! 3. Close: with same-bar-close timing, execute the new order at this close
//! 4. Post-bar: mark to market and record the equity point
//!
//! Broker events are dispatched to the strategy and every observer as soon as
//! they are produced.

pub mod loop_runner;
pub mod observer;
pub mod state;

pub use loop_runner::{run_backtest, Backtest, EngineError, RunOptions};
pub use observer::{EventObserver, TradeLogger};
pub use state::{EquityPoint, EventRecord, RunResult};
