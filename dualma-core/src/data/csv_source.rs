//! Daily bars from CSV.
//!
//! Expected header: `date,time,open,high,low,close,volume,amount`. Columns
//! are matched by name; `time`, `amount` and any other extra column are
//! ignored. An empty numeric field reads as `0.0`.

use super::{DataError, DataSource};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

/// Streams bars from any CSV reader, one row per call.
pub struct CsvSource<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, CsvRow>,
    date_format: String,
}

impl CsvSource<File> {
    pub fn from_path(path: &Path, date_format: &str) -> Result<Self, DataError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, date_format))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R, date_format: &str) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self {
            records: reader.into_deserialize(),
            date_format: date_format.to_string(),
        }
    }

    fn parse_row(&self, row: CsvRow, line: u64) -> Result<Bar, DataError> {
        let date = NaiveDate::parse_from_str(&row.date, &self.date_format).map_err(|_| {
            DataError::BadDate {
                line,
                value: row.date.clone(),
                format: self.date_format.clone(),
            }
        })?;
        Ok(Bar {
            date,
            open: row.open.unwrap_or(0.0),
            high: row.high.unwrap_or(0.0),
            low: row.low.unwrap_or(0.0),
            close: row.close.unwrap_or(0.0),
            volume: row.volume.unwrap_or(0.0),
        })
    }
}

impl<R: Read> DataSource for CsvSource<R> {
    fn next_bar(&mut self) -> Option<Result<Bar, DataError>> {
        let result = self.records.next()?;
        let line = self.records.reader().position().line();
        Some(
            result
                .map_err(DataError::from)
                .and_then(|row| self.parse_row(row, line)),
        )
    }
}

/// Read a whole CSV file into memory.
pub fn load_csv(path: &Path, date_format: &str) -> Result<Vec<Bar>, DataError> {
    let mut source = CsvSource::from_path(path, date_format)?;
    std::iter::from_fn(|| source.next_bar()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,time,open,high,low,close,volume,amount
2019-01-02,15:00:00,9.39,9.42,9.16,9.19,53938500,497169000.0
2019-01-03,15:00:00,9.18,9.33,9.15,9.28,41553400,383993000.0
2019-01-04,15:00:00,9.24,9.82,9.22,9.75,148115400,1422150000.0
";

    fn read_all(text: &str) -> Vec<Result<Bar, DataError>> {
        let mut source = CsvSource::from_reader(text.as_bytes(), "%Y-%m-%d");
        std::iter::from_fn(|| source.next_bar()).collect()
    }

    #[test]
    fn parses_reference_layout() {
        let bars: Vec<Bar> = read_all(SAMPLE).into_iter().map(|b| b.unwrap()).collect();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2019, 1, 2).unwrap());
        assert_eq!(bars[0].open, 9.39);
        assert_eq!(bars[0].close, 9.19);
        assert_eq!(bars[2].high, 9.82);
        assert_eq!(bars[2].volume, 148_115_400.0);
    }

    #[test]
    fn empty_field_reads_as_zero() {
        let text = "date,open,high,low,close,volume\n2019-01-02,9.39,9.42,9.16,9.19,\n";
        let bar = read_all(text).remove(0).unwrap();
        assert_eq!(bar.volume, 0.0);
        assert_eq!(bar.close, 9.19);
    }

    #[test]
    fn bad_date_reports_format() {
        let text = "date,open,high,low,close,volume\n02/01/2019,1,1,1,1,1\n";
        let err = read_all(text).remove(0).unwrap_err();
        match err {
            DataError::BadDate { value, format, .. } => {
                assert_eq!(value, "02/01/2019");
                assert_eq!(format, "%Y-%m-%d");
            }
            other => panic!("expected BadDate, got {other:?}"),
        }
    }

    #[test]
    fn custom_date_format() {
        let text = "date,open,high,low,close,volume\n02/01/2019,1,1,1,1,1\n";
        let mut source = CsvSource::from_reader(text.as_bytes(), "%d/%m/%Y");
        let bar = source.next_bar().unwrap().unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2019, 1, 2).unwrap());
    }

    #[test]
    fn non_numeric_price_is_csv_error() {
        let text = "date,open,high,low,close,volume\n2019-01-02,1,1,1,abc,1\n";
        assert!(matches!(read_all(text).remove(0), Err(DataError::Csv(_))));
    }
}
