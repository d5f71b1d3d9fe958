//! Daily closing prices.

use chrono::NaiveDate;

use crate::domain::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PricePoint { date, close }
    }
}

/// Check that a price series can be simulated: non-empty, strictly increasing
/// dates and finite positive closes.
pub fn validate_prices(ticker: &str, prices: &[PricePoint]) -> Result<(), BacktestError> {
    if prices.is_empty() {
        return Err(BacktestError::NoData {
            ticker: ticker.to_string(),
        });
    }

    for (i, point) in prices.iter().enumerate() {
        if !point.close.is_finite() || point.close <= 0.0 {
            return Err(BacktestError::InvalidPriceData {
                ticker: ticker.to_string(),
                reason: format!("bad close {} on {}", point.close, point.date),
            });
        }
        if i > 0 && point.date <= prices[i - 1].date {
            return Err(BacktestError::InvalidPriceData {
                ticker: ticker.to_string(),
                reason: format!(
                    "dates out of order: {} follows {}",
                    point.date,
                    prices[i - 1].date
                ),
            });
        }
    }

    Ok(())
}
