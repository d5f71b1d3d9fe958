//! CSV file data adapter.
//!
//! Each ticker lives in `<dir>/<TICKER>.csv` with a header row. Columns are
//! located by name so both our own files and Yahoo-style downloads load.

use crate::domain::error::BacktestError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
    adjusted: bool,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            adjusted: false,
        }
    }

    /// Prefer an `Adj Close` column when the file has one.
    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Write `prices` to `<dir>/<TICKER>.csv`, creating the directory if needed.
    pub fn write_prices(
        &self,
        ticker: &str,
        prices: &[PricePoint],
    ) -> Result<PathBuf, BacktestError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(ticker);
        let mut wtr = csv::Writer::from_path(&path).map_err(csv_io_error)?;
        wtr.write_record(["date", "close"]).map_err(csv_io_error)?;
        for p in prices {
            wtr.write_record([p.date.format(DATE_FORMAT).to_string(), p.close.to_string()])
                .map_err(csv_io_error)?;
        }
        wtr.flush()?;
        Ok(path)
    }

    fn close_column(&self, headers: &csv::StringRecord) -> Option<usize> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let adjusted = if self.adjusted {
            find(&["adj close", "adj_close", "adjclose"])
        } else {
            None
        };
        adjusted.or_else(|| find(&["close"]))
    }
}

fn csv_io_error(e: csv::Error) -> BacktestError {
    BacktestError::Io(std::io::Error::other(e))
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        let fetch_err = |reason: String| BacktestError::DataFetch {
            ticker: ticker.to_string(),
            reason,
        };

        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| fetch_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| fetch_err(format!("CSV header error: {}", e)))?
            .clone();
        let date_idx = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("date"))
            .ok_or_else(|| fetch_err("missing date column".into()))?;
        let close_idx = self
            .close_column(&headers)
            .ok_or_else(|| fetch_err("missing close column".into()))?;

        let mut prices = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| fetch_err(format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_idx).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
                .map_err(|e| fetch_err(format!("invalid date '{}': {}", date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let close_str = record.get(close_idx).unwrap_or("").trim();
            // Yahoo exports mark non-trading rows with "null".
            if close_str.is_empty() || close_str.eq_ignore_ascii_case("null") {
                continue;
            }
            let close: f64 = close_str
                .parse()
                .map_err(|e| fetch_err(format!("invalid close '{}': {}", close_str, e)))?;

            prices.push(PricePoint::new(date, close));
        }

        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }
}
