//! Direction prediction module
//!
//! Retrains a small model on every request:
//! - Feature engineering (SMA, RSI) from OHLCV bars
//! - Sliding-window dataset with forward-move labels
//! - Standardization plus gradient-boosted trees
//! - Predictor turning the latest window into a price forecast

pub mod dataset;
pub mod features;
pub mod gbm;
pub mod predictor;
pub mod scaler;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use dataset::{Dataset, WindowLabeler};
pub use features::{FeatureConfig, FeatureEngineer, FeatureRow, FEATURES_PER_ROW};
pub use gbm::{GbmParams, GradientBoostedClassifier};
pub use predictor::{build_result, Forecast, Pipeline, Predictor};
pub use scaler::StandardScaler;
pub use trainer::{Model, ModelTrainer};
