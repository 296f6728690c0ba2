//! HTTP error responses

use crate::error::PredictError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

const NO_DATA_MESSAGE: &str = "No price data available for this symbol. \
     Check if the symbol is valid for NSE/BSE (e.g. RELIANCE, TCS, HDFCBANK, \
     NIFTY, BANKNIFTY, SENSEX) and the market has traded recently.";

const NOT_ENOUGH_HISTORY_MESSAGE: &str = "Not enough recent history to make a prediction \
     for this symbol. Try again once the market has traded for longer.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Predict(e) => match e {
                PredictError::NoData(_) | PredictError::InsufficientData { .. } => {
                    StatusCode::NOT_FOUND
                }
                PredictError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Predict(PredictError::NoData(_)) => NO_DATA_MESSAGE.to_string(),
            ApiError::Predict(PredictError::InsufficientData { .. }) => {
                NOT_ENOUGH_HISTORY_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = json!({ "error": self.message() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PredictError::NoData("X".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PredictError::InsufficientData { rows: 2, required: 14 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PredictError::Timeout(60)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(PredictError::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_data_shortage_messages_differ() {
        let no_data = ApiError::from(PredictError::NoData("X".into())).message();
        let short = ApiError::from(PredictError::InsufficientData { rows: 0, required: 14 }).message();
        assert_ne!(no_data, short);
        assert!(short.contains("Not enough"));
    }
}
