//! Observers of broker events.
//!
//! Observers are attached to a [`Backtest`](super::Backtest) and notified
//! synchronously, in registration order, after the strategy itself.

use super::state::EventRecord;
use crate::broker::BrokerEvent;
use crate::domain::Bar;
use crate::strategy::OrderRequest;
use tracing::{info, warn};

pub trait EventObserver: Send {
    /// The strategy requested an order on `bar`.
    fn on_order_created(&mut self, _bar: &Bar, _request: &OrderRequest) {}

    /// The broker produced an event.
    fn on_event(&mut self, record: &EventRecord);
}

/// Writes one log line per order creation, execution, rejection and closed
/// trade, formatted as `date, message`.
#[derive(Debug, Default, Clone)]
pub struct TradeLogger {
    lines: Vec<String>,
    keep_lines: bool,
}

impl TradeLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also keep every line in memory (see [`TradeLogger::lines`]).
    pub fn recording() -> Self {
        Self {
            lines: Vec::new(),
            keep_lines: true,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn emit(&mut self, line: String) {
        info!(target: "dualma::trades", "{line}");
        if self.keep_lines {
            self.lines.push(line);
        }
    }
}

impl EventObserver for TradeLogger {
    fn on_order_created(&mut self, bar: &Bar, request: &OrderRequest) {
        self.emit(format!("{}, {} CREATE, {:.2}", bar.date, request.side, bar.close));
    }

    fn on_event(&mut self, record: &EventRecord) {
        let date = record.date;
        match &record.event {
            BrokerEvent::OrderFilled(fill) => {
                self.emit(format!(
                    "{date}, {} EXECUTED, Price: {:.2}, Cost: {:.2}, Comm {:.2}",
                    fill.side, fill.price, fill.value, fill.commission
                ));
            }
            BrokerEvent::OrderRejected {
                order_id,
                side,
                size,
                reason,
            } => {
                warn!(target: "dualma::trades", %order_id, %side, size, %reason, "order rejected");
                let line = format!("{date}, Order Rejected: {side} {size} ({reason})");
                if self.keep_lines {
                    self.lines.push(line);
                }
            }
            BrokerEvent::TradeClosed(trade) => {
                self.emit(format!(
                    "{date}, OPERATION PROFIT, GROSS {:.2}, NET {:.2}",
                    trade.gross_pnl, trade.net_pnl
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fill, OrderId, OrderSide, RejectReason, TradeRecord};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 4).unwrap()
    }

    #[test]
    fn formats_fill_line() {
        let mut logger = TradeLogger::recording();
        logger.on_event(&EventRecord {
            bar_index: 41,
            date: date(),
            event: BrokerEvent::OrderFilled(Fill {
                order_id: OrderId(1),
                bar_index: 41,
                date: date(),
                side: OrderSide::Buy,
                price: 12.5,
                size: 100,
                value: 1250.0,
                commission: 0.375,
            }),
        });
        assert_eq!(
            logger.lines(),
            &["2019-03-04, BUY EXECUTED, Price: 12.50, Cost: 1250.00, Comm 0.38".to_string()]
        );
    }

    #[test]
    fn formats_create_rejection_and_profit_lines() {
        let mut logger = TradeLogger::recording();
        let bar = Bar::new(date(), 10.0, 10.0, 10.0, 10.0, 1.0);
        logger.on_order_created(&bar, &OrderRequest::sell(5));
        logger.on_event(&EventRecord {
            bar_index: 1,
            date: date(),
            event: BrokerEvent::OrderRejected {
                order_id: OrderId(2),
                side: OrderSide::Sell,
                size: 5,
                reason: RejectReason::InsufficientPosition,
            },
        });
        logger.on_event(&EventRecord {
            bar_index: 2,
            date: date(),
            event: BrokerEvent::TradeClosed(TradeRecord {
                entry_bar: 0,
                entry_date: date(),
                entry_price: 10.0,
                exit_bar: 2,
                exit_date: date(),
                exit_price: 11.0,
                size: 5,
                gross_pnl: 5.0,
                commission: 0.5,
                net_pnl: 4.5,
                bars_held: 2,
            }),
        });
        assert_eq!(logger.lines()[0], "2019-03-04, SELL CREATE, 10.00");
        assert_eq!(
            logger.lines()[1],
            "2019-03-04, Order Rejected: SELL 5 (insufficient position)"
        );
        assert_eq!(
            logger.lines()[2],
            "2019-03-04, OPERATION PROFIT, GROSS 5.00, NET 4.50"
        );
    }

    #[test]
    fn default_logger_keeps_nothing() {
        let mut logger = TradeLogger::new();
        let bar = Bar::new(date(), 10.0, 10.0, 10.0, 10.0, 1.0);
        logger.on_order_created(&bar, &OrderRequest::buy(5));
        assert!(logger.lines().is_empty());
    }
}
