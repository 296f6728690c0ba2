//! Service configuration
//!
//! Loaded from an optional TOML file layered with `PREDICTOR__SECTION__KEY`
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working configuration.

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub yahoo: YahooConfig,
    #[serde(default)]
    pub quotes: QuoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests running longer than this are abandoned at the HTTP layer
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Windowing and history parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_prediction_offset")]
    pub prediction_offset: usize,
    /// Bar interval requested from the history provider (e.g. "15m")
    #[serde(default = "default_interval")]
    pub interval: String,
    /// How many days of history to fetch
    #[serde(default = "default_period_days")]
    pub period_days: u32,
}

fn default_window_size() -> usize {
    10
}

fn default_prediction_offset() -> usize {
    3
}

fn default_interval() -> String {
    "15m".to_string()
}

fn default_period_days() -> u32 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            prediction_offset: default_prediction_offset(),
            interval: default_interval(),
            period_days: default_period_days(),
        }
    }
}

impl PipelineConfig {
    pub fn period(&self) -> String {
        format!("{}d", self.period_days)
    }
}

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Fraction of rows sampled for each tree
    #[serde(default = "default_sample_ratio")]
    pub subsample: f64,
    /// Fraction of columns sampled for each tree
    #[serde(default = "default_sample_ratio")]
    pub colsample_bytree: f64,
    /// L2 penalty on leaf weights
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_min_child_weight")]
    pub min_child_weight: f64,
    /// Seed for row/column sampling; fixes the fitted model for a given history
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_estimators() -> usize {
    300
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_max_depth() -> usize {
    5
}

fn default_sample_ratio() -> f64 {
    0.9
}

fn default_lambda() -> f64 {
    1.0
}

fn default_min_child_weight() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            subsample: default_sample_ratio(),
            colsample_bytree: default_sample_ratio(),
            lambda: default_lambda(),
            min_child_weight: default_min_child_weight(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    #[serde(default = "default_yahoo_url")]
    pub base_url: String,
    #[serde(default = "default_yahoo_timeout")]
    pub timeout_secs: u64,
}

fn default_yahoo_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_yahoo_timeout() -> u64 {
    30
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_url(),
            timeout_secs: default_yahoo_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// How long a fetched live price is served from cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    5
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (optional) and the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("PREDICTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.window_size == 0 {
            return Err(PredictError::Config("pipeline.window_size must be positive".into()));
        }
        if self.pipeline.period_days == 0 {
            return Err(PredictError::Config("pipeline.period_days must be positive".into()));
        }
        if self.model.n_estimators == 0 {
            return Err(PredictError::Config("model.n_estimators must be positive".into()));
        }
        if !(self.model.learning_rate > 0.0 && self.model.learning_rate <= 1.0) {
            return Err(PredictError::Config(format!(
                "model.learning_rate must be in (0, 1], got {}",
                self.model.learning_rate
            )));
        }
        for (name, ratio) in [
            ("model.subsample", self.model.subsample),
            ("model.colsample_bytree", self.model.colsample_bytree),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(PredictError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.model.lambda < 0.0 {
            return Err(PredictError::Config("model.lambda must not be negative".into()));
        }
        Ok(())
    }
}
