//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    prices: &[PricePoint],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    if prices.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::default();
    }

    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // The signal EMA runs over the defined part of the line only.
    let line_start = fast.max(slow) - 1;
    let mut signal_line: Vec<Option<f64>> = vec![None; prices.len()];
    if line_start < prices.len() {
        let defined: Vec<f64> = macd_line[line_start..]
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        for (offset, signal) in ema_values(&defined, signal_period).into_iter().enumerate() {
            signal_line[line_start + offset] = signal;
        }
    }

    let values = prices
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let line = macd_line[i];
            let signal = signal_line[i];
            let valid = line.is_some() && signal.is_some();
            let line = line.unwrap_or(0.0);
            let signal = signal.unwrap_or(0.0);
            IndicatorPoint {
                date: point.date,
                valid,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries { values }
}
