//! Request handlers

use super::chart::{downsample, interval_candidates, ist_midnight, StockData, MAX_POINTS};
use super::{ApiError, AppState};
use crate::error::PredictError;
use crate::symbols::{display_symbol, normalize_symbol};
use crate::types::{round_price, Fundamentals, PredictionResult};
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

const NO_RANGE_DATA_MESSAGE: &str = "No price data available for this symbol/date range. \
     Check if the market was open on these dates and the symbol is valid for NSE/BSE \
     (e.g. RELIANCE, TCS, HDFCBANK, NIFTY, BANKNIFTY, SENSEX).";

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockDataQuery {
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LivePrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require_symbol(query: SymbolQuery) -> Result<String, ApiError> {
    non_empty(query.symbol)
        .ok_or_else(|| ApiError::BadRequest("symbol query parameter is required".to_string()))
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", value)))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "api" }))
}

/// Train on recent history and forecast the next move
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<PredictionResult>, ApiError> {
    let raw = require_symbol(query)?;
    let symbol = normalize_symbol(&raw);
    info!("Generating prediction for {} -> {}", raw, symbol);

    let mut result = tokio::time::timeout(state.request_timeout, state.predictor.predict(&symbol))
        .await
        .map_err(|_| PredictError::Timeout(state.request_timeout.as_secs()))??;

    result.symbol = display_symbol(&raw);
    Ok(Json(result))
}

/// Latest price, falling back to the last daily close
pub async fn live_price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<LivePrice>, ApiError> {
    let raw = require_symbol(query)?;
    let symbol = normalize_symbol(&raw);

    let price = match state.quotes.get_last_price(&symbol).await {
        Some(price) => Some(price),
        None => match state.history.get_history(&symbol, "1d", "1d").await {
            Ok(bars) => bars.last().map(|b| b.close),
            Err(e) => {
                warn!("{}: last close lookup failed: {}", symbol, e);
                None
            }
        },
    };

    let display = display_symbol(&raw);
    let price = price.ok_or_else(|| ApiError::NotFound(format!("No live price for {}", display)))?;

    Ok(Json(LivePrice {
        symbol: display,
        price: round_price(price)?,
    }))
}

/// Chart series and pricing table for a date range
pub async fn stock_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockDataQuery>,
) -> Result<Json<StockData>, ApiError> {
    let (Some(raw), Some(start), Some(end)) = (
        non_empty(query.symbol),
        non_empty(query.start),
        non_empty(query.end),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing parameters: symbol, start, end are required.".to_string(),
        ));
    };

    let symbol = normalize_symbol(&raw);
    let start_date = parse_date(&start)?;
    // End date is inclusive
    let end_date = parse_date(&end)?
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ApiError::BadRequest(format!("end date out of range: {}", end)))?;
    if end_date <= start_date {
        return Err(ApiError::BadRequest("end must not be before start".to_string()));
    }
    let days = (end_date - start_date).num_days();
    info!("Fetching stock data for {} -> {} from {} to {}", raw, symbol, start, end);

    let (start_at, end_at) = (ist_midnight(start_date), ist_midnight(end_date));
    let mut found = None;
    for interval in interval_candidates(days) {
        match state
            .history
            .get_history_range(&symbol, interval, start_at, end_at)
            .await
        {
            Ok(bars) if !bars.is_empty() => {
                found = Some((*interval, bars));
                break;
            }
            Ok(_) => debug!("{}: no bars at {}", symbol, interval),
            Err(e) if e.is_data_shortage() => debug!("{}: no bars at {}", symbol, interval),
            Err(e) => warn!("{}: history at {} failed: {}", symbol, interval, e),
        }
    }

    let Some((interval, mut bars)) = found else {
        return Err(ApiError::NotFound(NO_RANGE_DATA_MESSAGE.to_string()));
    };
    info!("{}: using interval {} ({} bars)", symbol, interval, bars.len());

    bars.sort_by_key(|b| b.timestamp);
    let bars = downsample(bars, MAX_POINTS);

    let fundamentals = match state.fundamentals.get_fundamentals(&symbol).await {
        Ok(fundamentals) => fundamentals,
        Err(e) => {
            warn!("{}: could not fetch fundamentals: {}", symbol, e);
            Fundamentals::default()
        }
    };

    Ok(Json(StockData::from_bars(&bars, fundamentals)?))
}
