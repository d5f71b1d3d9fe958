//! Cash/position ledger and order execution.
//!
//! Orders are all-in/all-out and fill at the bar's close: a buy spends all
//! available cash on whole shares, a sell liquidates the whole position.

use chrono::NaiveDate;

use crate::domain::signal::{Action, PositionState};

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

/// An executed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub action: Action,
    pub quantity: u64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Filled(Fill),
    /// Cash does not cover a single share.
    InsufficientCash,
    /// The action does not apply to the current position.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Ledger {
            cash: initial_cash,
            position: None,
            closed_trades: Vec::new(),
        }
    }

    pub fn position_state(&self) -> PositionState {
        match &self.position {
            Some(p) if p.quantity > 0 => PositionState::Long,
            _ => PositionState::Flat,
        }
    }

    /// Cash plus the position marked at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |p| p.market_value(price))
    }

    /// Execute `action` at `price`. Buys only apply while flat and sells only
    /// while long; anything else is ignored.
    pub fn execute(
        &mut self,
        action: Action,
        bar_index: usize,
        date: NaiveDate,
        price: f64,
    ) -> ExecutionResult {
        match (action, self.position_state()) {
            (Action::Buy, PositionState::Flat) => self.buy_all(bar_index, date, price),
            (Action::Sell, PositionState::Long) => self.sell_all(bar_index, date, price),
            _ => ExecutionResult::Ignored,
        }
    }

    fn buy_all(&mut self, bar_index: usize, date: NaiveDate, price: f64) -> ExecutionResult {
        if !(price.is_finite() && price > 0.0) {
            return ExecutionResult::InsufficientCash;
        }
        let quantity = (self.cash / price).floor();
        if quantity < 1.0 {
            return ExecutionResult::InsufficientCash;
        }
        let quantity = quantity as u64;

        self.cash -= quantity as f64 * price;
        self.position = Some(Position {
            quantity,
            entry_price: price,
            entry_date: date,
        });

        ExecutionResult::Filled(Fill {
            bar_index,
            date,
            action: Action::Buy,
            quantity,
            price,
        })
    }

    fn sell_all(&mut self, bar_index: usize, date: NaiveDate, price: f64) -> ExecutionResult {
        let Some(position) = self.position.take() else {
            return ExecutionResult::Ignored;
        };

        self.cash += position.market_value(price);
        self.closed_trades.push(ClosedTrade {
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date: date,
            pnl: position.unrealized_pnl(price),
        });

        ExecutionResult::Filled(Fill {
            bar_index,
            date,
            action: Action::Sell,
            quantity: position.quantity,
            price,
        })
    }
}
