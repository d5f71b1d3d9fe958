//! Strategy definitions and their indicator pairs.

use std::fmt;

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{
    calculate_ema, calculate_macd, calculate_sma, IndicatorSeries, IndicatorValue,
};
use crate::domain::price::PricePoint;
use crate::domain::signal::Reading;

pub const DEFAULT_SMA_PERIOD: usize = 30;
pub const DEFAULT_EMA_PERIOD: usize = 30;

/// Supplies the two aligned values a crossover rule compares on each bar.
///
/// `readings` must return one entry per price, and the entry at `i` may only
/// depend on prices `0..=i`.
pub trait IndicatorPair: Send + Sync {
    fn name(&self) -> String;

    /// Bars at the start of the series on which no decision is taken.
    fn warmup_bars(&self) -> usize;

    fn readings(&self, prices: &[PricePoint]) -> Vec<Option<Reading>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    SmaCrossover { period: usize },
    EmaCrossover { period: usize },
    MacdCrossover { fast: usize, slow: usize, signal: usize },
}

impl Strategy {
    pub fn sma() -> Self {
        Strategy::SmaCrossover {
            period: DEFAULT_SMA_PERIOD,
        }
    }

    pub fn ema() -> Self {
        Strategy::EmaCrossover {
            period: DEFAULT_EMA_PERIOD,
        }
    }

    pub fn macd() -> Self {
        Strategy::MacdCrossover {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }

    /// Short key used in configuration (`enabled = sma,ema,macd`).
    pub fn key(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "sma",
            Strategy::EmaCrossover { .. } => "ema",
            Strategy::MacdCrossover { .. } => "macd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "SMA Crossover",
            Strategy::EmaCrossover { .. } => "EMA Crossover",
            Strategy::MacdCrossover { .. } => "MACD Crossover",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmaCrossover { period } | Strategy::EmaCrossover { period } => {
                write!(f, "{} ({})", self.label(), period)
            }
            Strategy::MacdCrossover { fast, slow, signal } => {
                write!(f, "{} ({},{},{})", self.label(), fast, slow, signal)
            }
        }
    }
}

impl IndicatorPair for Strategy {
    fn name(&self) -> String {
        self.to_string()
    }

    fn warmup_bars(&self) -> usize {
        match *self {
            Strategy::SmaCrossover { period } | Strategy::EmaCrossover { period } => period,
            Strategy::MacdCrossover { fast, slow, signal } => {
                (fast.max(slow) + signal).saturating_sub(1)
            }
        }
    }

    fn readings(&self, prices: &[PricePoint]) -> Vec<Option<Reading>> {
        match *self {
            Strategy::SmaCrossover { period } => {
                close_vs_average(prices, &calculate_sma(prices, period))
            }
            Strategy::EmaCrossover { period } => {
                close_vs_average(prices, &calculate_ema(prices, period))
            }
            Strategy::MacdCrossover { fast, slow, signal } => {
                let series = calculate_macd(prices, fast, slow, signal);
                (0..prices.len())
                    .map(|i| match series.value_at(i) {
                        Some(IndicatorValue::Macd { line, signal, .. }) => {
                            Some(Reading::new(*line, *signal))
                        }
                        _ => None,
                    })
                    .collect()
            }
        }
    }
}

fn close_vs_average(prices: &[PricePoint], series: &IndicatorSeries) -> Vec<Option<Reading>> {
    prices
        .iter()
        .enumerate()
        .map(|(i, point)| match series.value_at(i) {
            Some(IndicatorValue::Simple(avg)) => Some(Reading::new(point.close, *avg)),
            _ => None,
        })
        .collect()
}
