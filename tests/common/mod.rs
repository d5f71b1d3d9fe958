#![allow(dead_code)]

use chrono::NaiveDate;
use crossover_backtest::domain::backtest::BacktestConfig;
use crossover_backtest::domain::batch::RunConfig;
use crossover_backtest::domain::error::BacktestError;
pub use crossover_backtest::domain::price::PricePoint;
use crossover_backtest::domain::strategy::Strategy;
use crossover_backtest::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_prices(mut self, ticker: &str, prices: Vec<PricePoint>) -> Self {
        self.data.insert(ticker.to_string(), prices);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        self.requests.borrow_mut().push(ticker.to_string());
        if let Some(reason) = self.errors.get(ticker) {
            return Err(BacktestError::DataFetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One price per calendar day starting at 2020-01-01.
pub fn make_prices(closes: &[f64]) -> Vec<PricePoint> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn flat_prices(count: usize, close: f64) -> Vec<PricePoint> {
    make_prices(&vec![close; count])
}

/// Closes `start, start + 1, start + 2, ...`.
pub fn rising_prices(count: usize, start: f64) -> Vec<PricePoint> {
    let closes: Vec<f64> = (0..count).map(|i| start + i as f64).collect();
    make_prices(&closes)
}

/// Oscillating closes, enough to produce several crossovers for every strategy.
pub fn wave_prices(count: usize) -> Vec<PricePoint> {
    let closes: Vec<f64> = (0..count)
        .map(|i| 100.0 + 15.0 * (i as f64 / 9.0).sin() + 0.05 * i as f64)
        .collect();
    make_prices(&closes)
}

pub fn sample_config(tickers: &[&str]) -> RunConfig {
    RunConfig {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        strategies: vec![Strategy::sma(), Strategy::ema(), Strategy::macd()],
        backtest: BacktestConfig {
            start_date: date(2020, 1, 1),
            end_date: date(2024, 12, 31),
            initial_cash: 100_000.0,
        },
        parallel: false,
    }
}
