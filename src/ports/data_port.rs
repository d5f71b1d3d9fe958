//! Price data access port trait.

use crate::domain::error::BacktestError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `ticker` between `start_date` and `end_date` inclusive,
    /// in chronological order.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, BacktestError>;
}
