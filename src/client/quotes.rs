//! Read-through cache for live quotes
//!
//! Many readers, one writer per miss: lookups take the read lock, and only a
//! stale or missing entry fetches from the wrapped source and takes the
//! write lock to store the result.

use super::LivePriceLookup;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    fetched_at: Instant,
}

pub struct CachedQuotes<L> {
    inner: L,
    ttl: Duration,
    prices: RwLock<HashMap<String, CachedPrice>>,
}

impl<L: LivePriceLookup> CachedQuotes<L> {
    pub fn new(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh cached price, if any
    pub fn cached(&self, symbol: &str) -> Option<f64> {
        let prices = self.prices.read();
        prices
            .get(symbol)
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.price)
    }

    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<L: LivePriceLookup> LivePriceLookup for CachedQuotes<L> {
    async fn get_last_price(&self, symbol: &str) -> Option<f64> {
        if let Some(price) = self.cached(symbol) {
            debug!("{}: cached quote {:.2}", symbol, price);
            return Some(price);
        }

        let price = self.inner.get_last_price(symbol).await?;
        self.prices.write().insert(
            symbol.to_string(),
            CachedPrice {
                price,
                fetched_at: Instant::now(),
            },
        );
        Some(price)
    }
}
