//! Error types for the prediction pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictError>;

#[derive(Debug, Error)]
pub enum PredictError {
    /// The history provider returned no bars at all
    #[error("No data found for symbol: {0}")]
    NoData(String),

    /// Bars exist but too few feature rows survive indicator warm-up
    #[error("Not enough data to train the prediction model: {rows} feature rows, need {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prediction timed out after {0}s")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for PredictError {
    fn from(e: config::ConfigError) -> Self {
        PredictError::Config(e.to_string())
    }
}

impl From<tokio::task::JoinError> for PredictError {
    fn from(e: tokio::task::JoinError) -> Self {
        PredictError::Internal(format!("prediction worker failed: {}", e))
    }
}

impl PredictError {
    /// Errors that mean "the symbol has too little history" rather than a fault
    pub fn is_data_shortage(&self) -> bool {
        matches!(self, PredictError::NoData(_) | PredictError::InsufficientData { .. })
    }
}
