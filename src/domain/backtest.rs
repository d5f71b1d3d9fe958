//! Simulation driver.
//!
//! BacktestConfig defines the shared parameters of every run. `run_backtest`
//! walks one price series bar by bar: read the indicator pair, decide, execute
//! against the ledger at the close, then sample equity.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::equity::EquityTracker;
use crate::domain::error::BacktestError;
use crate::domain::ledger::{ClosedTrade, ExecutionResult, Fill, Ledger};
use crate::domain::metrics::Metrics;
use crate::domain::price::{validate_prices, PricePoint};
use crate::domain::signal::{decide, Action};
use crate::domain::strategy::IndicatorPair;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ticker: String,
    pub strategy: String,
    pub initial_cash: f64,
    pub equity: EquityTracker,
    pub fills: Vec<Fill>,
    pub trades: Vec<ClosedTrade>,
    /// Bars processed.
    pub bars: usize,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.equity.final_value()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::compute(self.equity.samples(), &self.trades, self.initial_cash)
    }
}

pub fn run_backtest(
    ticker: &str,
    prices: &[PricePoint],
    strategy: &dyn IndicatorPair,
    initial_cash: f64,
) -> Result<BacktestResult, BacktestError> {
    validate_prices(ticker, prices)?;

    let readings = strategy.readings(prices);
    let warmup = strategy.warmup_bars();
    let mut ledger = Ledger::new(initial_cash);
    let mut equity = EquityTracker::new(
        EquityTracker::opening_date_for(prices[0].date),
        initial_cash,
    );
    let mut fills = Vec::new();

    for (i, bar) in prices.iter().enumerate() {
        let reading = if i < warmup {
            None
        } else {
            readings.get(i).copied().flatten()
        };

        let action = decide(reading, ledger.position_state());
        if action != Action::Hold {
            match ledger.execute(action, i, bar.date, bar.close) {
                ExecutionResult::Filled(fill) => {
                    debug!(
                        ticker,
                        strategy = %strategy.name(),
                        date = %fill.date,
                        action = %fill.action,
                        quantity = fill.quantity,
                        price = fill.price,
                        "order filled"
                    );
                    fills.push(fill);
                }
                ExecutionResult::InsufficientCash => {
                    debug!(ticker, date = %bar.date, cash = ledger.cash, "buy skipped: insufficient cash");
                }
                ExecutionResult::Ignored => {}
            }
        }

        equity.record(bar.date, ledger.total_value(bar.close));
    }

    Ok(BacktestResult {
        ticker: ticker.to_string(),
        strategy: strategy.name(),
        initial_cash,
        equity,
        fills,
        trades: ledger.closed_trades,
        bars: prices.len(),
    })
}
