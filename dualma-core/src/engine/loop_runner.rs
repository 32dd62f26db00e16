//! Bar-by-bar event loop: the heart of the backtesting engine.
//!
//! A [`Backtest`] is built from its three collaborators, a data source, a
//! strategy and a broker, and consumes them in [`Backtest::run`]. All run
//! state is owned by that one value, so independent runs never share a
//! broker, an indicator or a close series.

use crate::broker::{Broker, BrokerError, BrokerEvent};
use crate::config::{BacktestConfig, ConfigError, FillTiming};
use crate::data::{DataError, DataSource};
use crate::domain::{Bar, OrderSide};
use crate::metrics::Summary;
use crate::series::SeriesBuffer;
use crate::strategy::{BarContext, DualMaStrategy, OrderRequest, Strategy, StrategyError};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::observer::{EventObserver, TradeLogger};
use super::state::{EquityPoint, EventRecord, RunResult};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("data feed: {0}")]
    Data(#[from] DataError),

    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),

    /// The strategy submitted while an order was pending. The strategy is
    /// expected to check the pending flag itself, so this aborts the run.
    #[error("broker invariant violated: {0}")]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Engine-level settings of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub fill_timing: FillTiming,
}

pub struct Backtest<D: DataSource, S: Strategy> {
    source: D,
    strategy: S,
    broker: Broker,
    options: RunOptions,
    observers: Vec<Box<dyn EventObserver>>,
    config_hash: Option<String>,
}

impl<D: DataSource, S: Strategy> Backtest<D, S> {
    pub fn new(source: D, strategy: S, broker: Broker, options: RunOptions) -> Self {
        Self {
            source,
            strategy,
            broker,
            options,
            observers: Vec::new(),
            config_hash: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Tag the result with the hash of the config that built this run.
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Drive every bar of the source through the strategy and broker.
    pub fn run(mut self) -> Result<RunResult, EngineError> {
        let capacity = self.source.size_hint().unwrap_or(0);
        let starting_cash = self.broker.cash();
        let mut closes = SeriesBuffer::with_capacity(capacity);
        let mut equity_curve = Vec::with_capacity(capacity);
        let mut events: Vec<EventRecord> = Vec::new();
        let mut last: Option<(NaiveDate, f64)> = None;
        let mut bar_index = 0usize;

        while let Some(next) = self.source.next_bar() {
            let bar = next?;
            if bar.is_void() {
                return Err(DataError::VoidBar { date: bar.date }.into());
            }
            if let Some((previous, _)) = last {
                if bar.date < previous {
                    return Err(DataError::OutOfOrder {
                        date: bar.date,
                        previous,
                    }
                    .into());
                }
            }

            // ─── Phase 1: Open ───
            if self.options.fill_timing == FillTiming::NextBarOpen {
                let fresh = self.broker.execute_pending(bar.open, bar_index, bar.date);
                self.dispatch(fresh, bar_index, bar.date, &mut events);
            }

            // ─── Phase 2: Decision ───
            closes.append(bar.close);
            let request = {
                let ctx = BarContext {
                    bar_index,
                    bar: &bar,
                    closes: &closes,
                    cash: self.broker.cash(),
                    position: self.broker.position(),
                    has_pending_order: self.broker.has_pending(),
                };
                self.strategy.on_bar(&ctx)?
            };
            if let Some(request) = request {
                self.submit(&request, bar_index, &bar)?;
            }

            // ─── Phase 3: Close ───
            if self.options.fill_timing == FillTiming::SameBarClose {
                let fresh = self.broker.execute_pending(bar.close, bar_index, bar.date);
                self.dispatch(fresh, bar_index, bar.date, &mut events);
            }

            // ─── Phase 4: Post-bar ───
            let equity = self.broker.value(bar.close);
            debug_assert!(
                (equity - (self.broker.cash() + self.broker.position().size as f64 * bar.close))
                    .abs()
                    < 1e-6,
                "equity accounting violated at bar {bar_index}"
            );
            equity_curve.push(EquityPoint {
                bar_index,
                date: bar.date,
                close: bar.close,
                cash: self.broker.cash(),
                position_size: self.broker.position().size,
                equity,
                pending_orders: self.broker.pending_count(),
            });

            last = Some((bar.date, bar.close));
            bar_index += 1;
        }

        let unfilled_order = self.broker.pending().cloned();
        if let Some(order) = &unfilled_order {
            warn!(order_id = %order.id, side = %order.side, size = order.size, "order still pending after last bar; not executed");
        }

        let ending_value = match last {
            Some((_, close)) => self.broker.value(close),
            None => self.broker.cash(),
        };

        let fills: Vec<_> = events
            .iter()
            .filter_map(|r| match &r.event {
                BrokerEvent::OrderFilled(fill) => Some(fill.clone()),
                _ => None,
            })
            .collect();
        let trades: Vec<_> = events
            .iter()
            .filter_map(|r| match &r.event {
                BrokerEvent::TradeClosed(trade) => Some(trade.clone()),
                _ => None,
            })
            .collect();
        let orders = self.broker.orders().to_vec();
        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();

        let mut summary = Summary::compute(
            starting_cash,
            ending_value,
            &equity_values,
            &trades,
            &orders,
            unfilled_order.is_some(),
            self.broker.total_commission(),
            self.strategy.warmup_bars(),
        );
        summary.config_hash = self.config_hash;

        // `<date>, (MA Period S-M-L) Ending Value <value>`. The label carries
        // all three periods; a two-period `MA Period S-M` tag is not used.
        let label = self.strategy.label();
        match last {
            Some((date, _)) => info!("{date}, ({label}) Ending Value {ending_value:.2}"),
            None => info!("({label}) Ending Value {ending_value:.2}"),
        }

        Ok(RunResult {
            strategy: self.strategy.name().to_string(),
            orders,
            unfilled_order,
            fills,
            trades,
            events,
            equity_curve,
            final_cash: self.broker.cash(),
            final_position: *self.broker.position(),
            ending_value,
            summary,
        })
    }

    fn submit(
        &mut self,
        request: &OrderRequest,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<(), EngineError> {
        let order_id = match request.side {
            OrderSide::Buy => self.broker.submit_buy(request.size, bar_index)?,
            OrderSide::Sell => self.broker.submit_sell(request.size, bar_index)?,
        };
        debug!(%order_id, side = %request.side, size = request.size, bar = bar_index, "order submitted");
        for observer in &mut self.observers {
            observer.on_order_created(bar, request);
        }
        Ok(())
    }

    /// Hand each event to the strategy, then to observers, then to the log.
    fn dispatch(
        &mut self,
        fresh: Vec<BrokerEvent>,
        bar_index: usize,
        date: NaiveDate,
        log: &mut Vec<EventRecord>,
    ) {
        for event in fresh {
            self.strategy.on_event(&event);
            let record = EventRecord {
                bar_index,
                date,
                event,
            };
            for observer in &mut self.observers {
                observer.on_event(&record);
            }
            log.push(record);
        }
    }
}

/// Run the moving-average crossover strategy described by `config` over
/// `source`.
///
/// Builds a fresh broker and strategy from the config and attaches a
/// [`TradeLogger`] when `config.verbose` is set.
pub fn run_backtest<D: DataSource>(
    source: D,
    config: &BacktestConfig,
) -> Result<RunResult, EngineError> {
    config.validate()?;
    let strategy = DualMaStrategy::new(config.strategy.clone())?;
    let broker = Broker::from_config(&config.broker)?;
    let options = RunOptions {
        fill_timing: config.fill_timing,
    };

    let mut backtest =
        Backtest::new(source, strategy, broker, options).with_config_hash(config.config_hash());
    if config.verbose {
        backtest = backtest.with_observer(Box::new(TradeLogger::new()));
    }
    backtest.run()
}
