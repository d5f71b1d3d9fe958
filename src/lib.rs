//! crossover-backtest: replay SMA, EMA and MACD crossover strategies over
//! daily closing prices and chart the resulting equity curves.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
