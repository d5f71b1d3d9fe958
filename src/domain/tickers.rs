//! Ticker list parsing.
//!
//! Tickers become file names (`<dir>/<TICKER>.csv`) and URL path segments, so
//! only exchange symbol characters are accepted: `A-Z`, `0-9`, `.`, `^`, `=`
//! and `-` (e.g. `BRK.B`, `^GSPC`, `EURUSD=X`).

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerListError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("invalid character {found:?} in ticker {ticker}")]
    InvalidCharacter { ticker: String, found: char },

    #[error("ticker {0} has no letter or digit")]
    NoSymbol(String),
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-')
}

fn check_ticker(ticker: &str) -> Result<(), TickerListError> {
    if let Some(found) = ticker.chars().find(|c| !is_symbol_char(*c)) {
        return Err(TickerListError::InvalidCharacter {
            ticker: ticker.to_string(),
            found,
        });
    }
    // Rules out "." and ".." as file names.
    if !ticker.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(TickerListError::NoSymbol(ticker.to_string()));
    }
    Ok(())
}

/// Parse a comma separated ticker list into upper-case symbols, in input order.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, TickerListError> {
    let mut seen = HashSet::new();

    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err(TickerListError::EmptyToken);
            }
            let ticker = token.to_uppercase();
            check_ticker(&ticker)?;
            if !seen.insert(ticker.clone()) {
                return Err(TickerListError::DuplicateTicker(ticker));
            }
            Ok(ticker)
        })
        .collect()
}
