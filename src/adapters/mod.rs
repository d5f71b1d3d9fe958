//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod svg_report_adapter;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
