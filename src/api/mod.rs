//! HTTP API
//!
//! JSON endpoints consumed by the web frontend:
//! - `GET /health`
//! - `GET /predict?symbol=RELIANCE`
//! - `GET /live-price?symbol=NIFTY`
//! - `GET /stock-data?symbol=TCS&start=2024-01-01&end=2024-01-31`

pub mod chart;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::client::{FundamentalsLookup, HistoryProvider, LivePriceLookup};
use crate::config::{Config, ServerConfig};
use crate::ml::Predictor;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// State shared across handlers
pub struct AppState {
    pub predictor: Predictor,
    pub history: Arc<dyn HistoryProvider>,
    pub quotes: Arc<dyn LivePriceLookup>,
    pub fundamentals: Arc<dyn FundamentalsLookup>,
    /// Upper bound on a single prediction, training included
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        config: &Config,
        history: Arc<dyn HistoryProvider>,
        quotes: Arc<dyn LivePriceLookup>,
        fundamentals: Arc<dyn FundamentalsLookup>,
    ) -> Self {
        Self {
            predictor: Predictor::from_config(config, Arc::clone(&history), Arc::clone(&quotes)),
            history,
            quotes,
            fundamentals,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}

/// Create API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", get(handlers::predict))
        .route("/live-price", get(handlers::live_price))
        .route("/stock-data", get(handlers::stock_data))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start API server
pub async fn start_server(
    state: Arc<AppState>,
    server: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
