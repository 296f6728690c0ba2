//! Symbol normalization for Indian markets
//!
//! Callers may use plain NSE names (`RELIANCE`), index nicknames (`NIFTY`,
//! `BANKNIFTY`, `SENSEX`) or full Yahoo tickers (`ITC.NS`, `^NSEI`).

const INDEX_ALIASES: &[(&str, &str)] = &[
    ("NIFTY", "^NSEI"),
    ("NIFTY50", "^NSEI"),
    ("NIFTY_50", "^NSEI"),
    ("NIFTY 50", "^NSEI"),
    ("BANKNIFTY", "^NSEBANK"),
    ("NIFTYBANK", "^NSEBANK"),
    ("NIFTY_BANK", "^NSEBANK"),
    ("NIFTY BANK", "^NSEBANK"),
    ("SENSEX", "^BSESN"),
];

/// Map a user-facing name to a Yahoo Finance ticker
pub fn normalize_symbol(symbol: &str) -> String {
    let s = symbol.trim().to_uppercase();
    if s.is_empty() {
        return s;
    }

    if let Some((_, ticker)) = INDEX_ALIASES.iter().find(|(alias, _)| *alias == s) {
        return ticker.to_string();
    }

    if s.ends_with(".NS") || s.ends_with(".BO") || s.starts_with('^') {
        return s;
    }

    // Bare names are NSE listings
    format!("{}.NS", s)
}

/// The caller's symbol as echoed back in responses
pub fn display_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
