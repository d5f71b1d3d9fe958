//! Core domain types and logic.

pub mod backtest;
pub mod batch;
pub mod config;
pub mod equity;
pub mod error;
pub mod indicator;
pub mod ledger;
pub mod metrics;
pub mod price;
pub mod signal;
pub mod strategy;
pub mod tickers;
