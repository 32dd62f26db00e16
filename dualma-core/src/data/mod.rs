//! Data sources: where bars come from.
//!
//! The [`DataSource`] trait hands the bar loop one bar at a time, in
//! chronological order. Two implementations are provided: [`VecSource`] for
//! bars already in memory, and [`CsvSource`] for the daily CSV layout
//! `date,time,open,high,low,close,volume,amount`.

pub mod csv_source;

pub use csv_source::{load_csv, CsvSource};

use crate::domain::Bar;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: cannot parse date '{value}' with format '{format}'")]
    BadDate {
        line: u64,
        value: String,
        format: String,
    },

    #[error("bar dated {date} follows {previous}; bars must be in chronological order")]
    OutOfOrder { date: NaiveDate, previous: NaiveDate },

    #[error("bar dated {date} has a non-finite price")]
    VoidBar { date: NaiveDate },
}

/// A chronological stream of bars.
pub trait DataSource {
    /// The next bar, `None` at the end of data.
    fn next_bar(&mut self) -> Option<Result<Bar, DataError>>;

    /// Number of bars left, if known in advance.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Bars held in memory.
#[derive(Debug, Clone)]
pub struct VecSource {
    bars: std::vec::IntoIter<Bar>,
}

impl VecSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars: bars.into_iter(),
        }
    }
}

impl From<Vec<Bar>> for VecSource {
    fn from(bars: Vec<Bar>) -> Self {
        Self::new(bars)
    }
}

impl DataSource for VecSource {
    fn next_bar(&mut self) -> Option<Result<Bar, DataError>> {
        self.bars.next().map(Ok)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.bars.len())
    }
}

/// Synthetic daily bars from close prices.
///
/// Open is the previous close (the first bar opens at its close), high/low
/// bracket open and close by 1.0, and dates advance one calendar day per bar
/// from 2024-01-02.
#[cfg(test)]
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}
