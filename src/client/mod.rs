//! Market data collaborators
//!
//! The prediction core and the API only see these traits; the Yahoo Finance
//! client and the quote cache are the production implementations.

pub mod quotes;
pub mod yahoo;

pub use quotes::CachedQuotes;
pub use yahoo::YahooClient;

use crate::error::Result;
use crate::types::{Bar, Fundamentals};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of ordered OHLCV history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Bars for a trailing period such as `"5d"`, oldest first.
    /// Fails with `NoData` when the symbol has no bars in that period.
    async fn get_history(&self, symbol: &str, interval: &str, period: &str) -> Result<Vec<Bar>>;

    /// Bars between two instants, oldest first
    async fn get_history_range(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>>;
}

/// Best-effort latest traded price
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LivePriceLookup: Send + Sync {
    /// `None` when no quote is available; lookup failures never propagate
    async fn get_last_price(&self, symbol: &str) -> Option<f64>;
}

/// Company profile and valuation lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsLookup: Send + Sync {
    async fn get_fundamentals(&self, symbol: &str) -> Result<Fundamentals>;
}
