//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_report_adapter::{format_currency, SvgReportAdapter};
use crate::domain::batch::{run_batch, BatchReport, RunConfig, TickerFailure, TickerRun};
use crate::domain::config::{load_app_config, AppConfig, DataConfig, DataSource};
use crate::domain::error::BacktestError;
use crate::domain::price::validate_prices;
use crate::domain::tickers::parse_tickers;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "crossover-backtest",
    about = "Backtest SMA, EMA and MACD crossover strategies over daily closes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every enabled strategy over every ticker and write equity charts
    Backtest {
        /// INI file; built-in defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma separated tickers, replaces the configured list
        #[arg(short, long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Run simulations on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Validate a configuration file and print the resolved run
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Download prices from Yahoo Finance into the CSV directory
    Fetch {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            ticker,
            output_dir,
            parallel,
        } => run_backtest(config.as_deref(), ticker.as_deref(), output_dir, parallel),
        Command::Validate { config } => run_validate(&config),
        Command::Fetch {
            ticker,
            config,
            data_dir,
        } => run_fetch(&ticker, config.as_deref(), data_dir),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the configuration at `path`, or the built-in defaults when absent.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, BacktestError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            load_app_config(&adapter)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(
    mut app: AppConfig,
    ticker: Option<&str>,
    output_dir: Option<PathBuf>,
    parallel: bool,
) -> Result<AppConfig, BacktestError> {
    if let Some(ticker) = ticker {
        app.run.tickers = parse_tickers(ticker)?;
    }
    if let Some(dir) = output_dir {
        app.output_dir = dir;
    }
    app.run.parallel |= parallel;
    Ok(app)
}

pub fn build_data_port(data: &DataConfig) -> Result<Box<dyn DataPort>, BacktestError> {
    match data.source {
        DataSource::Csv => Ok(Box::new(
            CsvAdapter::new(data.csv_dir.clone()).with_adjusted(data.adjusted),
        )),
        DataSource::Yahoo => yahoo_port(data.adjusted),
    }
}

#[cfg(feature = "yahoo")]
fn yahoo_port(adjusted: bool) -> Result<Box<dyn DataPort>, BacktestError> {
    let adapter = crate::adapters::yahoo_adapter::YahooAdapter::new(adjusted)?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "yahoo"))]
fn yahoo_port(_adjusted: bool) -> Result<Box<dyn DataPort>, BacktestError> {
    Err(BacktestError::config_invalid(
        "data",
        "source",
        "yahoo support is not compiled in, use source = csv",
    ))
}

fn run_backtest(
    config_path: Option<&Path>,
    ticker: Option<&str>,
    output_dir: Option<PathBuf>,
    parallel: bool,
) -> Result<ExitCode, BacktestError> {
    let app = apply_overrides(resolve_config(config_path)?, ticker, output_dir, parallel)?;
    let data_port = build_data_port(&app.data)?;
    let report = run_backtest_pipeline(
        data_port.as_ref(),
        &app.run,
        &SvgReportAdapter::new(),
        &app.output_dir,
    );

    if report.all_failed() {
        eprintln!("error: no ticker produced results");
        return Ok(ExitCode::from(5));
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the batch, print per-run summaries and write one chart per ticker.
///
/// Tickers that fail to load or whose chart cannot be written are moved to
/// `failures` and the rest carry on; check [`BatchReport::all_failed`] on the
/// returned report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    run_config: &RunConfig,
    report_port: &dyn ReportPort,
    output_dir: &Path,
) -> BatchReport {
    eprintln!(
        "Running backtest: {} tickers x {} strategies, {} to {}",
        run_config.tickers.len(),
        run_config.strategies.len(),
        run_config.backtest.start_date,
        run_config.backtest.end_date,
    );

    let mut report = run_batch(data_port, run_config);

    for failure in &report.failures {
        eprintln!("warning: skipping {} ({})", failure.ticker, failure.reason);
    }

    let mut charted = Vec::with_capacity(report.runs.len());
    for run in report.runs {
        print_summary(&run);
        match report_port.write_ticker(&run, output_dir) {
            Ok(path) => {
                eprintln!("Chart written to: {}", path.display());
                charted.push(run);
            }
            Err(e) => {
                warn!(ticker = %run.ticker, error = %e, "chart not written");
                eprintln!("warning: no chart for {} ({})", run.ticker, e);
                report.failures.push(TickerFailure {
                    ticker: run.ticker,
                    reason: e.to_string(),
                });
            }
        }
    }
    report.runs = charted;

    report
}

fn print_summary(run: &TickerRun) {
    eprintln!("\n=== {} ({} bars) ===", run.ticker, run.bars);
    for result in &run.results {
        let m = result.metrics();
        eprintln!("{}", result.strategy);
        eprintln!("  Final Value:      {}", format_currency(m.final_value));
        eprintln!("  Total Return:     {:.2}%", m.total_return * 100.0);
        eprintln!(
            "  Max Drawdown:     -{:.1}% ({} bars)",
            m.max_drawdown * 100.0,
            m.max_drawdown_duration
        );
        eprintln!("  Total Trades:     {}", m.total_trades);
        eprintln!("  Win Rate:         {:.1}%", m.win_rate * 100.0);
        eprintln!("  Profit Factor:    {:.2}", m.profit_factor);
    }
}

fn run_validate(config_path: &Path) -> Result<ExitCode, BacktestError> {
    let app = resolve_config(Some(config_path))?;
    eprintln!("Config validated successfully");
    eprintln!("{}", describe(&app));
    Ok(ExitCode::SUCCESS)
}

/// Human readable dump of a resolved configuration.
pub fn describe(app: &AppConfig) -> String {
    let strategies: Vec<String> = app.run.strategies.iter().map(|s| s.to_string()).collect();
    let source = match app.data.source {
        DataSource::Yahoo => "yahoo".to_string(),
        DataSource::Csv => format!("csv ({})", app.data.csv_dir.display()),
    };
    format!(
        "  Tickers:      {}\n  Period:       {} to {}\n  Initial Cash: {}\n  Strategies:   {}\n  Data Source:  {}{}\n  Parallel:     {}\n  Output Dir:   {}",
        app.run.tickers.join(", "),
        app.run.backtest.start_date,
        app.run.backtest.end_date,
        format_currency(app.run.backtest.initial_cash),
        strategies.join(", "),
        source,
        if app.data.adjusted { ", adjusted" } else { "" },
        app.run.parallel,
        app.output_dir.display(),
    )
}

fn run_fetch(
    ticker: &str,
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<ExitCode, BacktestError> {
    let app = resolve_config(config_path)?;
    let yahoo = yahoo_port(app.data.adjusted)?;
    let csv = CsvAdapter::new(data_dir.unwrap_or(app.data.csv_dir));
    eprintln!("Saving prices under {}", csv.base_path().display());
    let outcome = fetch_to_csv(yahoo.as_ref(), &csv, &parse_tickers(ticker)?, &app.run);

    for saved in &outcome.saved {
        eprintln!("{}: {} bars written to {}", saved.ticker, saved.bars, saved.path.display());
    }
    for failure in &outcome.failures {
        eprintln!("warning: {} not saved ({})", failure.ticker, failure.reason);
    }

    if outcome.saved.is_empty() && !outcome.failures.is_empty() {
        eprintln!("error: no ticker was downloaded");
        return Ok(ExitCode::from(5));
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedPrices {
    pub ticker: String,
    pub path: PathBuf,
    pub bars: usize,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub saved: Vec<SavedPrices>,
    pub failures: Vec<TickerFailure>,
}

/// Copy prices for each ticker from `source` into the CSV directory.
///
/// A ticker that cannot be downloaded, validated or written is recorded in
/// `failures` and the remaining tickers are still fetched.
pub fn fetch_to_csv(
    source: &dyn DataPort,
    csv: &CsvAdapter,
    tickers: &[String],
    run_config: &RunConfig,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    for ticker in tickers {
        match save_ticker(source, csv, ticker, run_config) {
            Ok(saved) => outcome.saved.push(saved),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "fetch failed");
                outcome.failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}

fn save_ticker(
    source: &dyn DataPort,
    csv: &CsvAdapter,
    ticker: &str,
    run_config: &RunConfig,
) -> Result<SavedPrices, BacktestError> {
    let prices = source.fetch_prices(
        ticker,
        run_config.backtest.start_date,
        run_config.backtest.end_date,
    )?;
    validate_prices(ticker, &prices)?;
    let path = csv.write_prices(ticker, &prices)?;
    info!(ticker = %ticker, bars = prices.len(), path = %path.display(), "prices saved");
    Ok(SavedPrices {
        ticker: ticker.to_string(),
        path,
        bars: prices.len(),
    })
}
