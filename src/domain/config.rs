//! Run configuration: defaults, loading and validation.
//!
//! Every key is optional. A missing key takes its default; a present key that
//! does not parse or breaks a rule is a `ConfigInvalid` error.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CASH};
use crate::domain::batch::RunConfig;
use crate::domain::error::BacktestError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::strategy::{Strategy, DEFAULT_EMA_PERIOD, DEFAULT_SMA_PERIOD};
use crate::domain::tickers::parse_tickers;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TICKERS: &str = "AAPL,MSFT,GOOGL,LPLA,IBM";
pub const DEFAULT_START_DATE: &str = "2015-01-01";
pub const DEFAULT_END_DATE: &str = "2023-03-14";
pub const DEFAULT_CSV_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = ".";

const DATE_FORMAT: &str = "%Y-%m-%d";
const STRATEGY_KEYS: [&str; 3] = ["sma", "ema", "macd"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Yahoo,
    Csv,
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "csv" => Ok(DataSource::Csv),
            other => Err(format!("unknown data source '{}' (expected yahoo or csv)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub source: DataSource,
    pub csv_dir: PathBuf,
    pub adjusted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub run: RunConfig,
    pub data: DataConfig,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let date = |s| NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap_or_default();
        AppConfig {
            run: RunConfig {
                tickers: DEFAULT_TICKERS.split(',').map(String::from).collect(),
                strategies: vec![Strategy::sma(), Strategy::ema(), Strategy::macd()],
                backtest: BacktestConfig {
                    start_date: date(DEFAULT_START_DATE),
                    end_date: date(DEFAULT_END_DATE),
                    initial_cash: DEFAULT_INITIAL_CASH,
                },
                parallel: false,
            },
            data: DataConfig {
                source: DataSource::Yahoo,
                csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
                adjusted: true,
            },
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

pub fn load_app_config(config: &dyn ConfigPort) -> Result<AppConfig, BacktestError> {
    let tickers = parse_tickers(
        &config
            .get_string("backtest", "tickers")
            .unwrap_or_else(|| DEFAULT_TICKERS.to_string()),
    )?;

    let run = RunConfig {
        tickers,
        strategies: build_strategies(config)?,
        backtest: build_backtest_config(config)?,
        parallel: parse_flag(config, "backtest", "parallel", false)?,
    };

    let source = match config.get_string("data", "source") {
        Some(s) => s
            .parse()
            .map_err(|reason: String| BacktestError::config_invalid("data", "source", reason))?,
        None => DataSource::Yahoo,
    };

    Ok(AppConfig {
        run,
        data: DataConfig {
            source,
            csv_dir: PathBuf::from(
                config
                    .get_string("data", "csv_dir")
                    .unwrap_or_else(|| DEFAULT_CSV_DIR.to_string()),
            ),
            adjusted: parse_flag(config, "data", "adjusted", true)?,
        },
        output_dir: PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        ),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let start_date = parse_date(config, "start_date", DEFAULT_START_DATE)?;
    let end_date = parse_date(config, "end_date", DEFAULT_END_DATE)?;
    if start_date >= end_date {
        return Err(BacktestError::config_invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }

    let initial_cash: f64 = parse_key(config, "backtest", "initial_cash", DEFAULT_INITIAL_CASH)?;
    if !initial_cash.is_finite() || initial_cash <= 0.0 {
        return Err(BacktestError::config_invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_cash,
    })
}

pub fn build_strategies(config: &dyn ConfigPort) -> Result<Vec<Strategy>, BacktestError> {
    let enabled = config
        .get_list("strategies", "enabled")
        .unwrap_or_else(|| STRATEGY_KEYS.iter().map(|s| s.to_string()).collect());
    if enabled.is_empty() {
        return Err(BacktestError::config_invalid(
            "strategies",
            "enabled",
            "at least one strategy must be enabled",
        ));
    }

    let mut strategies: Vec<Strategy> = Vec::with_capacity(enabled.len());
    for key in &enabled {
        let strategy = match key.as_str() {
            "sma" => Strategy::SmaCrossover {
                period: period(config, "sma_period", DEFAULT_SMA_PERIOD)?,
            },
            "ema" => Strategy::EmaCrossover {
                period: period(config, "ema_period", DEFAULT_EMA_PERIOD)?,
            },
            "macd" => {
                let fast = period(config, "macd_fast", DEFAULT_FAST)?;
                let slow = period(config, "macd_slow", DEFAULT_SLOW)?;
                let signal = period(config, "macd_signal", DEFAULT_SIGNAL)?;
                if fast >= slow {
                    return Err(BacktestError::config_invalid(
                        "strategies",
                        "macd_fast",
                        "macd_fast must be less than macd_slow",
                    ));
                }
                Strategy::MacdCrossover { fast, slow, signal }
            }
            other => {
                return Err(BacktestError::config_invalid(
                    "strategies",
                    "enabled",
                    format!("unknown strategy '{}' (expected sma, ema or macd)", other),
                ));
            }
        };
        if strategies.iter().any(|s| s.key() == strategy.key()) {
            return Err(BacktestError::config_invalid(
                "strategies",
                "enabled",
                format!("strategy '{}' listed twice", key),
            ));
        }
        strategies.push(strategy);
    }
    Ok(strategies)
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, BacktestError> {
    let value: usize = parse_key(config, "strategies", key, default)?;
    if value == 0 {
        return Err(BacktestError::config_invalid(
            "strategies",
            key,
            format!("{} must be positive", key),
        ));
    }
    Ok(value)
}

fn parse_date(config: &dyn ConfigPort, key: &str, default: &str) -> Result<NaiveDate, BacktestError> {
    let raw = config
        .get_string("backtest", key)
        .unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| {
        BacktestError::config_invalid(
            "backtest",
            key,
            format!("invalid {} '{}', expected YYYY-MM-DD", key, raw),
        )
    })
}

fn parse_key<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| BacktestError::config_invalid(section, key, format!("cannot parse '{}'", raw))),
    }
}

fn parse_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, BacktestError> {
    config
        .get_bool(section, key)
        .map(|value| value.unwrap_or(default))
        .map_err(|raw| {
            BacktestError::config_invalid(section, key, format!("expected true or false, got '{}'", raw))
        })
}
