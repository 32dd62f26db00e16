//! Triple simple-moving-average crossover.
//!
//! Three SMAs over the close: short (S), medium (M) and long (L).
//!
//! - Flat and `M > L`: buy `floor(invest_fraction * cash / close)` shares.
//! - Long and `S < M`: sell the whole position.
//!
//! The rule compares current levels every bar; it does not look for the bar
//! on which a cross happened. Repeated qualifying bars do not re-trigger
//! because a pending order or an open position blocks a second entry.

use super::{BarContext, OrderRequest, Strategy, StrategyError};
use crate::broker::BrokerEvent;
use crate::config::{ConfigError, StrategyParams, ZeroSizePolicy};
use crate::indicators::{Indicator, IndicatorError, Sma};
use tracing::debug;

/// Current values of the three averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaLevels {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

#[derive(Debug, Clone)]
pub struct DualMaStrategy {
    params: StrategyParams,
    short: Sma,
    medium: Sma,
    long: Sma,
    name: String,
    /// Entries skipped because the computed size was zero.
    zero_size_skips: usize,
}

impl DualMaStrategy {
    pub fn new(params: StrategyParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let sma = |period| Sma::new(period).map_err(|e| ConfigError::Invalid(e.to_string()));
        Ok(Self {
            short: sma(params.short_period)?,
            medium: sma(params.medium_period)?,
            long: sma(params.long_period)?,
            name: format!(
                "dual_ma_{}_{}_{}",
                params.short_period, params.medium_period, params.long_period
            ),
            params,
            zero_size_skips: 0,
        })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn zero_size_skips(&self) -> usize {
        self.zero_size_skips
    }

    /// The three averages at the latest bar, or `None` while any is warming up.
    pub fn levels(&self) -> Result<Option<MaLevels>, IndicatorError> {
        let read = |sma: &Sma| match sma.value(0) {
            Ok(v) => Ok(Some(v)),
            Err(IndicatorError::NotReady { .. }) => Ok(None),
            Err(e) => Err(e),
        };
        let (Some(short), Some(medium), Some(long)) =
            (read(&self.short)?, read(&self.medium)?, read(&self.long)?)
        else {
            return Ok(None);
        };
        Ok(Some(MaLevels {
            short,
            medium,
            long,
        }))
    }

    /// Whole shares to buy, or `None` when the count exceeds `i64::MAX`
    /// (a near-zero close against a large balance).
    fn entry_size(&self, cash: f64, close: f64) -> Option<u64> {
        if close <= 0.0 || cash <= 0.0 {
            return Some(0);
        }
        let shares = (self.params.invest_fraction * cash / close).floor();
        if !shares.is_finite() || shares >= MAX_SHARES {
            return None;
        }
        Some(shares as u64)
    }
}

/// 2^63: the first share count a signed position cannot hold.
const MAX_SHARES: f64 = i64::MAX as f64;

impl Strategy for DualMaStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    /// `MA Period S-M-L`: all three periods, not only short and medium.
    fn label(&self) -> String {
        format!(
            "MA Period {}-{}-{}",
            self.params.short_period, self.params.medium_period, self.params.long_period
        )
    }

    fn warmup_bars(&self) -> usize {
        self.params.warmup_bars()
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Result<Option<OrderRequest>, StrategyError> {
        // Indicators advance every bar, whether or not a decision is made.
        self.short.update(ctx.closes)?;
        self.medium.update(ctx.closes)?;
        self.long.update(ctx.closes)?;

        if ctx.has_pending_order {
            return Ok(None);
        }
        let Some(levels) = self.levels()? else {
            return Ok(None);
        };

        if ctx.position.is_flat() {
            if levels.medium <= levels.long {
                return Ok(None);
            }
            let Some(size) = self.entry_size(ctx.cash, ctx.bar.close) else {
                debug!(
                    bar = ctx.bar_index,
                    cash = ctx.cash,
                    close = ctx.bar.close,
                    "entry signal skipped: size exceeds position limit"
                );
                return Ok(None);
            };
            if size == 0 && self.params.zero_size == ZeroSizePolicy::Skip {
                self.zero_size_skips += 1;
                debug!(
                    bar = ctx.bar_index,
                    cash = ctx.cash,
                    close = ctx.bar.close,
                    "entry signal skipped: size rounds to zero"
                );
                return Ok(None);
            }
            return Ok(Some(OrderRequest::buy(size)));
        }

        if ctx.position.is_long() && levels.short < levels.medium {
            return Ok(Some(OrderRequest::sell(ctx.position.size.unsigned_abs())));
        }

        Ok(None)
    }

    fn on_event(&mut self, event: &BrokerEvent) {
        if let BrokerEvent::OrderRejected { order_id, reason, .. } = event {
            debug!(%order_id, %reason, "order rejected; waiting for next bar");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, OrderSide, Position};
    use crate::series::SeriesBuffer;
    use chrono::NaiveDate;

    struct Harness {
        strategy: DualMaStrategy,
        closes: SeriesBuffer,
        bar_index: usize,
    }

    impl Harness {
        fn new(params: StrategyParams) -> Self {
            Self {
                strategy: DualMaStrategy::new(params).unwrap(),
                closes: SeriesBuffer::new(),
                bar_index: 0,
            }
        }

        fn step(
            &mut self,
            close: f64,
            cash: f64,
            position: Position,
            pending: bool,
        ) -> Option<OrderRequest> {
            self.closes.append(close);
            let bar = Bar::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(self.bar_index as i64),
                close,
                close,
                close,
                close,
                1_000.0,
            );
            let ctx = BarContext {
                bar_index: self.bar_index,
                bar: &bar,
                closes: &self.closes,
                cash,
                position: &position,
                has_pending_order: pending,
            };
            self.bar_index += 1;
            self.strategy.on_bar(&ctx).unwrap()
        }
    }

    fn long(size: i64) -> Position {
        Position {
            size,
            avg_price: 10.0,
        }
    }

    #[test]
    fn no_action_until_long_average_ready() {
        let mut h = Harness::new(StrategyParams::new(2, 3, 4));
        for close in [10.0, 11.0, 12.0] {
            assert_eq!(h.step(close, 1_000.0, Position::default(), false), None);
        }
        // Fourth bar: all ready and rising, so M > L.
        assert_eq!(
            h.step(13.0, 1_000.0, Position::default(), false),
            Some(OrderRequest::buy(73)) // floor(950 / 13)
        );
    }

    #[test]
    fn buy_size_uses_invest_fraction() {
        let mut h = Harness::new(StrategyParams::new(1, 2, 3));
        h.step(10.0, 100_000.0, Position::default(), false);
        h.step(10.0, 100_000.0, Position::default(), false);
        let req = h.step(40.0, 100_000.0, Position::default(), false).unwrap();
        assert_eq!(req.side, OrderSide::Buy);
        assert_eq!(req.size, (0.95_f64 * 100_000.0 / 40.0).floor() as u64);
    }

    #[test]
    fn equal_averages_do_not_buy() {
        let mut h = Harness::new(StrategyParams::new(2, 3, 4));
        for _ in 0..10 {
            assert_eq!(h.step(10.0, 1_000.0, Position::default(), false), None);
        }
    }

    #[test]
    fn sells_full_position_when_short_below_medium() {
        let mut h = Harness::new(StrategyParams::new(1, 3, 4));
        for close in [10.0, 12.0, 14.0, 16.0] {
            h.step(close, 0.0, long(79), false);
        }
        // S = 11 < M = (14 + 16 + 11) / 3
        assert_eq!(h.step(11.0, 0.0, long(79), false), Some(OrderRequest::sell(79)));
    }

    #[test]
    fn long_position_ignores_entry_rule() {
        let mut h = Harness::new(StrategyParams::new(1, 2, 3));
        for close in [10.0, 11.0, 12.0, 13.0] {
            // Rising prices: S >= M and M > L, so nothing to do while long.
            assert_eq!(h.step(close, 1_000.0, long(10), false), None);
        }
    }

    #[test]
    fn pending_order_blocks_decision_but_indicators_advance() {
        let mut h = Harness::new(StrategyParams::new(1, 2, 3));
        for close in [10.0, 11.0, 12.0] {
            assert_eq!(h.step(close, 1_000.0, Position::default(), true), None);
        }
        assert!(h.strategy.levels().unwrap().is_some());
        assert!(h.step(13.0, 1_000.0, Position::default(), false).is_some());
    }

    #[test]
    fn zero_size_skipped_by_default() {
        let mut h = Harness::new(StrategyParams::new(1, 2, 3));
        for close in [10.0, 11.0, 12.0] {
            assert_eq!(h.step(close, 0.0, Position::default(), false), None);
        }
        assert_eq!(h.strategy.zero_size_skips(), 1);
    }

    #[test]
    fn zero_size_submitted_when_configured() {
        let mut params = StrategyParams::new(1, 2, 3);
        params.zero_size = ZeroSizePolicy::Submit;
        let mut h = Harness::new(params);
        h.step(10.0, 0.0, Position::default(), false);
        h.step(11.0, 0.0, Position::default(), false);
        assert_eq!(
            h.step(12.0, 0.0, Position::default(), false),
            Some(OrderRequest::buy(0))
        );
    }

    #[test]
    fn unrepresentable_entry_size_is_no_signal() {
        // 0.95 * 100_000 / 2e-15 is far beyond i64::MAX shares.
        let mut h = Harness::new(StrategyParams::new(1, 2, 3));
        h.step(1e-15, 100_000.0, Position::default(), false);
        h.step(1e-15, 100_000.0, Position::default(), false);
        assert_eq!(h.step(2e-15, 100_000.0, Position::default(), false), None);
        assert_eq!(h.strategy.zero_size_skips(), 0);
    }

    #[test]
    fn entry_size_just_below_limit_is_kept() {
        let strategy = DualMaStrategy::new(StrategyParams::new(1, 2, 3)).unwrap();
        let size = strategy.entry_size(0.95e9, 1e-9).unwrap();
        assert!(size > 0 && size < i64::MAX as u64);
        assert_eq!(strategy.entry_size(1e6, 1e-15), None);
        assert_eq!(strategy.entry_size(0.0, 10.0), Some(0));
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(DualMaStrategy::new(StrategyParams::new(0, 22, 41)).is_err());
    }

    #[test]
    fn name_and_warmup() {
        let strategy = DualMaStrategy::new(StrategyParams::default()).unwrap();
        assert_eq!(strategy.name(), "dual_ma_7_22_41");
        assert_eq!(strategy.label(), "MA Period 7-22-41");
        assert_eq!(strategy.warmup_bars(), 40);
    }
}
