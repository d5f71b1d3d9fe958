//! Batch runner: every enabled strategy over every configured ticker.
//!
//! Prices are fetched one ticker at a time. A ticker whose data cannot be
//! fetched or fails validation is recorded as a failure and the batch moves on.
//! The (ticker, strategy) simulations share no state, so they may run on the
//! rayon pool; results keep configuration order either way.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::error::BacktestError;
use crate::domain::price::{validate_prices, PricePoint};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub tickers: Vec<String>,
    pub strategies: Vec<Strategy>,
    pub backtest: BacktestConfig,
    pub parallel: bool,
}

#[derive(Debug, Clone)]
pub struct TickerRun {
    pub ticker: String,
    pub bars: usize,
    pub results: Vec<BacktestResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerFailure {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub runs: Vec<TickerRun>,
    pub failures: Vec<TickerFailure>,
}

impl BatchReport {
    pub fn all_failed(&self) -> bool {
        self.runs.is_empty() && !self.failures.is_empty()
    }
}

pub fn run_batch(data_port: &dyn DataPort, config: &RunConfig) -> BatchReport {
    let mut loaded: Vec<(String, Vec<PricePoint>)> = Vec::with_capacity(config.tickers.len());
    let mut failures = Vec::new();

    for ticker in &config.tickers {
        match load_prices(data_port, ticker, &config.backtest) {
            Ok(prices) => {
                info!(ticker = %ticker, bars = prices.len(), "loaded prices");
                loaded.push((ticker.clone(), prices));
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let tasks: Vec<(usize, Strategy)> = (0..loaded.len())
        .flat_map(|t| config.strategies.iter().map(move |s| (t, *s)))
        .collect();

    let simulate = |&(t, strategy): &(usize, Strategy)| {
        let (ticker, prices) = &loaded[t];
        run_backtest(ticker, prices, &strategy, config.backtest.initial_cash)
    };

    let outcomes: Vec<Result<BacktestResult, BacktestError>> = if config.parallel {
        tasks.par_iter().map(simulate).collect()
    } else {
        tasks.iter().map(simulate).collect()
    };

    let mut runs: Vec<TickerRun> = loaded
        .iter()
        .map(|(ticker, prices)| TickerRun {
            ticker: ticker.clone(),
            bars: prices.len(),
            results: Vec::with_capacity(config.strategies.len()),
        })
        .collect();

    let mut broken = vec![None; runs.len()];
    for (&(t, _), outcome) in tasks.iter().zip(outcomes) {
        match outcome {
            Ok(result) => runs[t].results.push(result),
            Err(e) => broken[t] = Some(e.to_string()),
        }
    }

    let mut kept = Vec::with_capacity(runs.len());
    for (run, reason) in runs.into_iter().zip(broken) {
        match reason {
            Some(reason) => failures.push(TickerFailure {
                ticker: run.ticker,
                reason,
            }),
            None => kept.push(run),
        }
    }

    BatchReport {
        runs: kept,
        failures,
    }
}

fn load_prices(
    data_port: &dyn DataPort,
    ticker: &str,
    config: &BacktestConfig,
) -> Result<Vec<PricePoint>, BacktestError> {
    let prices = data_port.fetch_prices(ticker, config.start_date, config.end_date)?;
    validate_prices(ticker, &prices)?;
    Ok(prices)
}
