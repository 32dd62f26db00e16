//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the last `period` source values. Each update recomputes
//! the trailing window sum, so identical inputs always produce bit-identical
//! outputs regardless of run length.

use super::{Indicator, IndicatorError};
use crate::series::SeriesBuffer;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    /// One entry per update; `None` until `period` source values exist.
    output: SeriesBuffer<Option<f64>>,
    /// Source length seen at the last update.
    source_len: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidPeriod(period));
        }
        Ok(Self {
            period,
            name: format!("sma_{period}"),
            output: SeriesBuffer::new(),
            source_len: 0,
        })
    }

    /// Number of outputs produced so far (ready or not).
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Mean of the `period` source values ending `ago` bars before the latest.
    pub fn mean_of(source: &SeriesBuffer, period: usize, ago: usize) -> Option<f64> {
        let window = source.window_at(period, ago).ok()?;
        Some(window.iter().sum::<f64>() / period as f64)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> usize {
        self.period
    }

    fn update(&mut self, source: &SeriesBuffer) -> Result<(), IndicatorError> {
        // Latest source value must exist.
        source.at(0)?;
        self.source_len = source.len();
        self.output.append(Self::mean_of(source, self.period, 0));
        Ok(())
    }

    fn value(&self, ago: usize) -> Result<f64, IndicatorError> {
        match self.output.at(ago)? {
            Some(v) => Ok(v),
            None => Err(IndicatorError::NotReady {
                name: self.name.clone(),
                required: self.period,
                available: self.source_len.saturating_sub(ago),
            }),
        }
    }
}
