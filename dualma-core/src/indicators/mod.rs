//! Streaming indicators.
//!
//! Indicators are created once when the strategy is built and live for the
//! whole run. The bar loop appends one source value per bar; each indicator is
//! then updated once and appends exactly one output (or an unavailable marker)
//! to its own series.

pub mod sma;

pub use sma::Sma;

use crate::series::{SeriesBuffer, SeriesError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("indicator period must be >= 1 (got {0})")]
    InvalidPeriod(usize),

    #[error("{name} not ready: needs {required} values, {available} available")]
    NotReady {
        name: String,
        required: usize,
        available: usize,
    },

    #[error(transparent)]
    OutOfRange(#[from] SeriesError),
}

/// Trait for streaming indicators.
///
/// # Look-ahead guard
/// `update` only sees the source values appended so far, so no output at bar t
/// can depend on bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_22").
    fn name(&self) -> &str;

    /// Number of source values needed for the first output.
    fn period(&self) -> usize;

    /// Number of bars before the first valid output.
    fn lookback(&self) -> usize {
        self.period().saturating_sub(1)
    }

    /// Consume the latest source value and append one output.
    fn update(&mut self, source: &SeriesBuffer) -> Result<(), IndicatorError>;

    /// Output `ago` bars before the latest update.
    fn value(&self, ago: usize) -> Result<f64, IndicatorError>;

    fn is_ready(&self) -> bool {
        self.value(0).is_ok()
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
