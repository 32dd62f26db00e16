//! Append-only series with lookback access.
//!
//! A `SeriesBuffer` holds one value per processed bar. Values are addressed by
//! how many bars ago they were appended: `at(0)` is the latest value, `at(1)`
//! the one before it, and so on. Nothing is ever removed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("lookback {ago} bars is before the start of the series (length {len})")]
    OutOfRange { ago: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBuffer<T = f64> {
    values: Vec<T>,
}

impl<T: Copy> SeriesBuffer<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, value: T) {
        self.values.push(value);
    }

    /// Value appended `ago` bars before the latest one.
    pub fn at(&self, ago: usize) -> Result<T, SeriesError> {
        let len = self.values.len();
        if ago >= len {
            return Err(SeriesError::OutOfRange { ago, len });
        }
        Ok(self.values[len - 1 - ago])
    }

    /// The `n` most recent values, oldest first.
    pub fn window(&self, n: usize) -> Result<&[T], SeriesError> {
        self.window_at(n, 0)
    }

    /// The `n` values ending `ago` bars before the latest one, oldest first.
    pub fn window_at(&self, n: usize, ago: usize) -> Result<&[T], SeriesError> {
        let len = self.values.len();
        let end = len
            .checked_sub(ago)
            .ok_or(SeriesError::OutOfRange { ago, len })?;
        let start = end.checked_sub(n).ok_or(SeriesError::OutOfRange {
            ago: ago + n.saturating_sub(1),
            len,
        })?;
        Ok(&self.values[start..end])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Copy> Default for SeriesBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
