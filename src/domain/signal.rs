//! Single-indicator crossover decision rule.
//!
//! Every strategy compares one value against one reference on each bar:
//! close vs SMA, close vs EMA, MACD line vs signal line. Entry fires when the
//! value is strictly above the reference while flat, exit when it is strictly
//! below while long. Anything else holds.

use std::fmt;

/// Relative tolerance under which value and reference compare equal.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionState {
    Flat,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hold,
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hold => write!(f, "HOLD"),
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// The pair compared on one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub reference: f64,
}

impl Reading {
    pub fn new(value: f64, reference: f64) -> Self {
        Reading { value, reference }
    }

    fn is_defined(&self) -> bool {
        self.value.is_finite() && self.reference.is_finite()
    }

    fn tolerance(&self) -> f64 {
        EPSILON * self.reference.abs().max(1.0)
    }

    pub fn is_above(&self) -> bool {
        self.is_defined() && self.value > self.reference + self.tolerance()
    }

    pub fn is_below(&self) -> bool {
        self.is_defined() && self.value < self.reference - self.tolerance()
    }
}

/// Decide the action for one bar. An undefined reading always holds.
pub fn decide(reading: Option<Reading>, position: PositionState) -> Action {
    let Some(reading) = reading else {
        return Action::Hold;
    };

    match position {
        PositionState::Flat if reading.is_above() => Action::Buy,
        PositionState::Long if reading.is_below() => Action::Sell,
        _ => Action::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_and_above_buys() {
        let r = Reading::new(101.0, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Buy);
    }

    #[test]
    fn long_and_above_holds() {
        let r = Reading::new(101.0, 100.0);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Hold);
    }

    #[test]
    fn long_and_below_sells() {
        let r = Reading::new(99.0, 100.0);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Sell);
    }

    #[test]
    fn flat_and_below_holds() {
        let r = Reading::new(99.0, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Hold);
    }

    #[test]
    fn equality_holds_both_ways() {
        let r = Reading::new(100.0, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Hold);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Hold);
    }

    #[test]
    fn float_noise_counts_as_equal() {
        let r = Reading::new(100.0 + 1e-12, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Hold);
        let r = Reading::new(100.0 - 1e-12, 100.0);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Hold);
    }

    #[test]
    fn small_macd_differences_still_cross() {
        let r = Reading::new(0.001, 0.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Buy);
        let r = Reading::new(-0.001, 0.0);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Sell);
    }

    #[test]
    fn undefined_reading_holds() {
        assert_eq!(decide(None, PositionState::Flat), Action::Hold);
        assert_eq!(decide(None, PositionState::Long), Action::Hold);
    }

    #[test]
    fn nan_reading_holds() {
        let r = Reading::new(f64::NAN, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Hold);
        let r = Reading::new(50.0, f64::NAN);
        assert_eq!(decide(Some(r), PositionState::Long), Action::Hold);
        let r = Reading::new(f64::INFINITY, 100.0);
        assert_eq!(decide(Some(r), PositionState::Flat), Action::Hold);
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Buy.to_string(), "BUY");
        assert_eq!(Action::Sell.to_string(), "SELL");
        assert_eq!(Action::Hold.to_string(), "HOLD");
    }
}
