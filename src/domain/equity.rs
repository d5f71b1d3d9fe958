//! Equity tracking.
//!
//! The tracker starts with one sample holding the starting cash, dated the
//! calendar day before the first simulated bar, and then appends one sample per
//! bar after that bar's order has settled. Samples are never modified.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquitySample {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityTracker {
    samples: Vec<EquitySample>,
}

impl EquityTracker {
    pub fn new(opening_date: NaiveDate, starting_cash: f64) -> Self {
        EquityTracker {
            samples: vec![EquitySample {
                date: opening_date,
                value: starting_cash,
            }],
        }
    }

    /// Opening date for a run whose first bar falls on `first_bar`.
    pub fn opening_date_for(first_bar: NaiveDate) -> NaiveDate {
        first_bar.pred_opt().unwrap_or(first_bar)
    }

    pub fn record(&mut self, date: NaiveDate, value: f64) {
        debug_assert!(
            self.samples.last().is_none_or(|s| s.date <= date),
            "equity samples must be recorded in date order"
        );
        self.samples.push(EquitySample { date, value });
    }

    pub fn samples(&self) -> &[EquitySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn final_value(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.value)
    }

    /// Split into the (dates, values) pair consumed by the report stage.
    pub fn to_parts(&self) -> (Vec<NaiveDate>, Vec<f64>) {
        self.samples.iter().map(|s| (s.date, s.value)).unzip()
    }
}
