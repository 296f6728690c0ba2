//! Short-horizon price direction predictor
//!
//! Trains a gradient-boosted classifier on recent intraday bars for one
//! symbol and forecasts whether the close a few bars ahead will be higher.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API / CLI → Predictor → HistoryProvider (Yahoo chart API)
//!                      ↓
//!      FeatureEngineer → WindowLabeler → ModelTrainer → score latest window
//!                      ↓
//!           LivePriceLookup (cached quotes) → PredictionResult
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod ml;
pub mod symbols;
pub mod types;

#[cfg(test)]
mod config_tests;
