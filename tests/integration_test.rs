//! Integration tests for the simulation pipeline.
//!
//! Tests cover:
//! - Known-outcome runs for each crossover strategy
//! - Equity sequence shape and determinism
//! - Batch runs with mock data ports (failure isolation, ordering, parallel)
//! - Charts written through the report port

mod common;

use approx::assert_relative_eq;
use common::*;
use crossover_backtest::adapters::svg_report_adapter::SvgReportAdapter;
use crossover_backtest::domain::backtest::run_backtest;
use crossover_backtest::domain::batch::run_batch;
use crossover_backtest::domain::signal::Action;
use crossover_backtest::domain::strategy::Strategy;
use crossover_backtest::ports::report_port::ReportPort;

mod known_outcomes {
    use super::*;

    #[test]
    fn flat_prices_never_trade() {
        let prices = flat_prices(120, 100.0);
        for strategy in [Strategy::sma(), Strategy::ema(), Strategy::macd()] {
            let result = run_backtest("FLAT", &prices, &strategy, 100_000.0).unwrap();
            assert!(result.fills.is_empty(), "{} traded on flat prices", strategy);
            assert_eq!(result.final_value(), 100_000.0);
        }
    }

    #[test]
    fn rising_series_buys_once_after_warmup() {
        let prices = rising_prices(40, 100.0);
        let result = run_backtest("UP", &prices, &Strategy::sma(), 100_000.0).unwrap();

        assert_eq!(result.fills.len(), 1);
        let buy = &result.fills[0];
        assert_eq!(buy.action, Action::Buy);
        assert_eq!(buy.bar_index, 30);
        assert_eq!(buy.quantity, 769);
        assert_eq!(buy.price, 130.0);
        assert!(result.trades.is_empty());
        assert_relative_eq!(result.final_value(), 30.0 + 769.0 * 139.0);
    }

    #[test]
    fn rising_series_ema_also_buys_at_warmup_end() {
        let prices = rising_prices(40, 100.0);
        let result = run_backtest("UP", &prices, &Strategy::ema(), 100_000.0).unwrap();

        let actions: Vec<_> = result.fills.iter().map(|f| (f.bar_index, f.action)).collect();
        assert_eq!(actions, vec![(30, Action::Buy)]);
    }

    #[test]
    fn macd_single_sign_change_buys_once() {
        let mut closes = vec![100.0; 40];
        closes.extend((1..=40).map(|i| 100.0 + i as f64));
        let prices = make_prices(&closes);

        let result = run_backtest("MACD", &prices, &Strategy::macd(), 100_000.0).unwrap();

        let actions: Vec<_> = result.fills.iter().map(|f| (f.bar_index, f.action)).collect();
        assert_eq!(actions, vec![(40, Action::Buy)]);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn round_trip_realises_pnl() {
        // Above the SMA on bar 30, then a collapse well below it.
        let mut closes: Vec<f64> = (0..31).map(|i| 100.0 + i as f64).collect();
        closes.extend([50.0, 50.0]);
        let prices = make_prices(&closes);

        let result = run_backtest("RT", &prices, &Strategy::sma(), 10_000.0).unwrap();

        let actions: Vec<_> = result.fills.iter().map(|f| (f.bar_index, f.action)).collect();
        assert_eq!(actions, vec![(30, Action::Buy), (31, Action::Sell)]);
        assert_eq!(result.trades.len(), 1);

        // 10_000 / 130 = 76 shares, 120 left over.
        let trade = &result.trades[0];
        assert_eq!(trade.quantity, 76);
        assert_relative_eq!(trade.pnl, 76.0 * (50.0 - 130.0));
        assert_relative_eq!(result.final_value(), 120.0 + 76.0 * 50.0);
        assert_eq!(result.metrics().trades_lost, 1);
    }

    #[test]
    fn unaffordable_buy_is_skipped() {
        let prices = rising_prices(40, 100.0);
        let result = run_backtest("UP", &prices, &Strategy::sma(), 50.0).unwrap();

        assert!(result.fills.is_empty());
        assert_eq!(result.final_value(), 50.0);
    }
}

mod equity_sequence {
    use super::*;

    #[test]
    fn one_sample_per_bar_plus_opening() {
        let prices = wave_prices(150);
        for strategy in [Strategy::sma(), Strategy::ema(), Strategy::macd()] {
            let result = run_backtest("WAVE", &prices, &strategy, 100_000.0).unwrap();
            let (dates, values) = result.equity.to_parts();

            assert_eq!(values.len(), prices.len() + 1);
            assert_eq!(dates.len(), values.len());
            assert_eq!(dates[0], date(2019, 12, 31));
            assert_eq!(values[0], 100_000.0);
            assert!(dates.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(&dates[1..], prices.iter().map(|p| p.date).collect::<Vec<_>>());
        }
    }

    #[test]
    fn fills_alternate_starting_with_buy() {
        let prices = wave_prices(250);
        for strategy in [Strategy::sma(), Strategy::ema(), Strategy::macd()] {
            let result = run_backtest("WAVE", &prices, &strategy, 100_000.0).unwrap();
            assert!(result.fills.len() >= 2, "{} should trade on a wave", strategy);
            for (i, fill) in result.fills.iter().enumerate() {
                let expected = if i % 2 == 0 { Action::Buy } else { Action::Sell };
                assert_eq!(fill.action, expected);
            }
        }
    }

    #[test]
    fn identical_input_gives_identical_curve() {
        let prices = wave_prices(200);
        let a = run_backtest("WAVE", &prices, &Strategy::ema(), 100_000.0).unwrap();
        let b = run_backtest("WAVE", &prices, &Strategy::ema(), 100_000.0).unwrap();
        assert_eq!(a.equity, b.equity);
        assert_eq!(a.fills, b.fills);
    }
}

mod batch_runs {
    use super::*;

    #[test]
    fn failed_tickers_are_isolated() {
        let port = MockDataPort::new()
            .with_prices("AAPL", wave_prices(120))
            .with_error("MSFT", "HTTP 404 Not Found")
            .with_prices("IBM", wave_prices(90));
        let report = run_batch(&port, &sample_config(&["AAPL", "MSFT", "IBM", "GOOGL"]));

        let ok: Vec<_> = report.runs.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(ok, vec!["AAPL", "IBM"]);

        let failed: Vec<_> = report.failures.iter().map(|f| f.ticker.as_str()).collect();
        assert_eq!(failed, vec!["MSFT", "GOOGL"]);
        assert!(report.failures[0].reason.contains("404"));
        assert!(report.failures[1].reason.contains("no price data"));
        assert!(!report.all_failed());
    }

    #[test]
    fn tickers_are_fetched_in_order_once() {
        let port = MockDataPort::new()
            .with_prices("AAPL", wave_prices(60))
            .with_prices("IBM", wave_prices(60));
        run_batch(&port, &sample_config(&["IBM", "AAPL"]));
        assert_eq!(*port.requests.borrow(), vec!["IBM", "AAPL"]);
    }

    #[test]
    fn every_strategy_runs_per_ticker() {
        let port = MockDataPort::new().with_prices("AAPL", wave_prices(120));
        let report = run_batch(&port, &sample_config(&["AAPL"]));

        let run = &report.runs[0];
        assert_eq!(run.bars, 120);
        assert_eq!(run.results.len(), 3);
        for result in &run.results {
            assert_eq!(result.ticker, "AAPL");
            assert_eq!(result.equity.len(), 121);
        }
    }

    #[test]
    fn unsorted_data_fails_only_that_ticker() {
        let mut bad = wave_prices(50);
        bad.swap(10, 11);
        let port = MockDataPort::new()
            .with_prices("BAD", bad)
            .with_prices("GOOD", wave_prices(50));
        let report = run_batch(&port, &sample_config(&["BAD", "GOOD"]));

        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.runs[0].ticker, "GOOD");
        assert!(report.failures[0].reason.contains("invalid price data"));
    }

    #[test]
    fn all_failing_is_flagged() {
        let port = MockDataPort::new().with_error("AAPL", "network unreachable");
        let report = run_batch(&port, &sample_config(&["AAPL"]));
        assert!(report.all_failed());
    }

    #[test]
    fn parallel_output_matches_serial() {
        let port = MockDataPort::new()
            .with_prices("AAPL", wave_prices(300))
            .with_prices("MSFT", wave_prices(200))
            .with_prices("IBM", rising_prices(80, 50.0));
        let serial = run_batch(&port, &sample_config(&["AAPL", "MSFT", "IBM"]));
        let mut config = sample_config(&["AAPL", "MSFT", "IBM"]);
        config.parallel = true;
        let parallel = run_batch(&port, &config);

        assert_eq!(serial.runs.len(), parallel.runs.len());
        for (a, b) in serial.runs.iter().zip(&parallel.runs) {
            assert_eq!(a.ticker, b.ticker);
            assert_eq!(a.results.len(), b.results.len());
            for (ra, rb) in a.results.iter().zip(&b.results) {
                assert_eq!(ra.strategy, rb.strategy);
                assert_eq!(ra.equity, rb.equity);
                assert_eq!(ra.trades, rb.trades);
            }
        }
    }
}

mod charts {
    use super::*;

    #[test]
    fn one_chart_per_ticker_with_labelled_lines() {
        let dir = tempfile::tempdir().unwrap();
        let port = MockDataPort::new()
            .with_prices("AAPL", flat_prices(60, 100.0))
            .with_prices("IBM", wave_prices(120));
        let report = run_batch(&port, &sample_config(&["AAPL", "IBM"]));

        let adapter = SvgReportAdapter::new();
        for run in &report.runs {
            adapter.write_ticker(run, dir.path()).unwrap();
        }

        let aapl = std::fs::read_to_string(dir.path().join("strategy_performance_AAPL.svg"))
            .unwrap();
        assert_eq!(aapl.matches("<polyline").count(), 3);
        assert!(aapl.contains("SMA Crossover (30): $100,000.00"));
        assert!(aapl.contains("EMA Crossover (30): $100,000.00"));
        assert!(aapl.contains("MACD Crossover (12,26,9): $100,000.00"));
        assert!(dir.path().join("strategy_performance_IBM.svg").exists());
    }
}
