//! Shared fixtures for the integration tests and benchmarks.

use chrono::NaiveDate;
use dualma_core::domain::Bar;

/// Synthetic daily bars from close prices.
///
/// Open is the previous close (the first bar opens at its close), high/low
/// bracket open and close by 1.0, and dates advance one calendar day per bar
/// from 2024-01-02.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
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
