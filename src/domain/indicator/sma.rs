//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(C[i-n+1..=i]), maintained as a rolling sum.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_sma(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || prices.is_empty() {
        return IndicatorSeries::default();
    }

    let mut values = Vec::with_capacity(prices.len());
    let mut sum = 0.0;

    for (i, point) in prices.iter().enumerate() {
        sum += point.close;
        if i >= period {
            sum -= prices[i - period].close;
        }

        let valid = i + 1 >= period;
        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Simple(if valid { sum / period as f64 } else { 0.0 }),
        });
    }

    IndicatorSeries { values }
}
