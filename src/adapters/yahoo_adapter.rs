//! Yahoo Finance data adapter.
//!
//! Reads daily closes from the v8 chart API. Transient failures (connect,
//! timeout, 429, 5xx) are retried with exponential backoff.

use crate::domain::error::BacktestError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    adjusted: bool,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooAdapter {
    pub fn new(adjusted: bool) -> Result<Self, BacktestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| BacktestError::Io(std::io::Error::other(e)))?;

        Ok(Self {
            client,
            adjusted,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive; ask through the end of the last day.
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp() + 86_399;
        format!(
            "{BASE_URL}/{ticker}?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    fn parse_response(
        ticker: &str,
        resp: ChartResponse,
        adjusted: bool,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        let fetch_err = |reason: String| BacktestError::DataFetch {
            ticker: ticker.to_string(),
            reason,
        };

        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(fetch_err("unknown ticker".into()));
            }
            (None, Some(err)) => {
                return Err(fetch_err(format!("{}: {}", err.code, err.description)));
            }
            (None, None) => return Err(fetch_err("empty result with no error".into())),
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| fetch_err("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Err(BacktestError::NoData {
                ticker: ticker.to_string(),
            });
        };

        let closes = if adjusted {
            data.indicators
                .adjclose
                .and_then(|v| v.into_iter().next())
                .map(|a| a.adjclose)
        } else {
            None
        };
        let closes = match closes {
            Some(c) => c,
            None => data
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .ok_or_else(|| fetch_err("no quote data".into()))?,
        };

        let mut prices = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| fetch_err(format!("invalid timestamp: {ts}")))?;

            // Null rows are non-trading days.
            let Some(close) = closes.get(i).copied().flatten() else {
                continue;
            };
            prices.push(PricePoint::new(date, close));
        }

        prices.sort_by_key(|p| p.date);
        prices.dedup_by_key(|p| p.date);
        Ok(prices)
    }

    fn fetch_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ChartResponse, BacktestError> {
        let url = Self::chart_url(ticker, start, end);
        let mut last_error = String::from("max retries exceeded");

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(ticker, attempt, delay_ms = delay.as_millis() as u64, error = %last_error, "retrying");
                std::thread::sleep(delay);
            }

            debug!(ticker, %url, "requesting chart");
            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        last_error = format!("HTTP {status}");
                        continue;
                    }
                    // A 404 body still carries the chart error.
                    if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                        return Err(BacktestError::DataFetch {
                            ticker: ticker.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                    }

                    return resp.json().map_err(|e| BacktestError::DataFetch {
                        ticker: ticker.to_string(),
                        reason: format!("failed to parse response: {e}"),
                    });
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = e.to_string();
                }
                Err(e) => {
                    return Err(BacktestError::DataFetch {
                        ticker: ticker.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(BacktestError::DataFetch {
            ticker: ticker.to_string(),
            reason: last_error,
        })
    }
}

impl DataPort for YahooAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        let resp = self.fetch_with_retry(ticker, start_date, end_date)?;
        let mut prices = Self::parse_response(ticker, resp, self.adjusted)?;
        prices.retain(|p| p.date >= start_date && p.date <= end_date);
        Ok(prices)
    }
}
