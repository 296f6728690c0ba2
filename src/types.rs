//! Core domain types

use crate::error::{PredictError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a single sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// True when every price and volume field is a finite number
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Predicted price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn suggestion(&self) -> Suggestion {
        match self {
            Direction::Up => Suggestion::BuyCall,
            Direction::Down => Suggestion::BuyPut,
        }
    }
}

/// Option trade matching a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suggestion {
    #[serde(rename = "BUY CALL")]
    BuyCall,
    #[serde(rename = "BUY PUT")]
    BuyPut,
}

/// The record returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub live_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub predicted_price: Decimal,
    /// Predicted-class probability as a percentage
    #[serde(with = "rust_decimal::serde::float")]
    pub confidence: Decimal,
    pub direction: Direction,
    pub suggestion: Suggestion,
}

/// Company profile and valuation figures; any field may be unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    #[serde(rename = "epsTrailingTwelveMonths")]
    pub eps_trailing_twelve_months: Option<f64>,
    #[serde(rename = "dividendYield")]
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
}

/// Two-decimal price or percentage as returned to callers
pub fn round_price(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| PredictError::Internal(format!("cannot represent {} as a price", value)))
}
