//! Yahoo Finance chart API client
//!
//! Serves both history (`/v8/finance/chart/{symbol}`) and the latest quote
//! (`meta.regularMarketPrice` of the same endpoint). Company fundamentals come
//! from `/v10/finance/quoteSummary/{symbol}`.

use super::{FundamentalsLookup, HistoryProvider, LivePriceLookup};
use crate::config::YahooConfig;
use crate::error::{PredictError, Result};
use crate::types::{Bar, Fundamentals};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryModules>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    beta: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`, or `{}` when unknown
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref()?.raw.filter(|v| v.is_finite())
}

impl YahooClient {
    pub fn new(config: &YahooConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResponse> {
        self.get_json("v8/finance/chart", symbol, query).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}/{}", self.base_url, path, symbol);
        debug!("GET {} {:?}", url, query);

        let resp = self.http.get(&url).query(query).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(PredictError::NoData(symbol.to_string()));
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

/// Convert a chart payload into bars, dropping any bar with a missing field
pub(crate) fn parse_bars(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>> {
    if let Some(err) = resp.chart.error {
        debug!("{}: chart error {} {:?}", symbol, err.code, err.description);
        return Err(PredictError::NoData(symbol.to_string()));
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(PredictError::NoData(symbol.to_string()));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars: Vec<Bar> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(Bar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: field(&quote.open, i)?,
                high: field(&quote.high, i)?,
                low: field(&quote.low, i)?,
                close: field(&quote.close, i)?,
                volume: field(&quote.volume, i)?,
            })
        })
        .filter(Bar::is_finite)
        .collect();
    bars.sort_by_key(|b| b.timestamp);

    if bars.is_empty() {
        return Err(PredictError::NoData(symbol.to_string()));
    }
    Ok(bars)
}

fn field(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

pub(crate) fn parse_last_price(resp: &ChartResponse) -> Option<f64> {
    resp.chart
        .result
        .as_ref()?
        .first()?
        .meta
        .regular_market_price
        .filter(|p| p.is_finite())
}

pub(crate) fn parse_fundamentals(symbol: &str, resp: QuoteSummaryResponse) -> Result<Fundamentals> {
    if let Some(err) = resp.quote_summary.error {
        debug!("{}: quote summary error {} {:?}", symbol, err.code, err.description);
        return Err(PredictError::NoData(symbol.to_string()));
    }
    let Some(modules) = resp.quote_summary.result.and_then(|r| r.into_iter().next()) else {
        return Err(PredictError::NoData(symbol.to_string()));
    };

    let (sector, industry) = modules
        .asset_profile
        .map(|p| (p.sector, p.industry))
        .unwrap_or_default();
    let detail = modules.summary_detail.as_ref();
    let stats = modules.default_key_statistics.as_ref();

    Ok(Fundamentals {
        sector,
        industry,
        market_cap: detail.and_then(|d| raw(&d.market_cap)),
        trailing_pe: detail.and_then(|d| raw(&d.trailing_pe)),
        forward_pe: detail
            .and_then(|d| raw(&d.forward_pe))
            .or_else(|| stats.and_then(|s| raw(&s.forward_pe))),
        eps_trailing_twelve_months: stats.and_then(|s| raw(&s.trailing_eps)),
        dividend_yield: detail.and_then(|d| raw(&d.dividend_yield)),
        beta: detail
            .and_then(|d| raw(&d.beta))
            .or_else(|| stats.and_then(|s| raw(&s.beta))),
    })
}

#[async_trait]
impl HistoryProvider for YahooClient {
    async fn get_history(&self, symbol: &str, interval: &str, period: &str) -> Result<Vec<Bar>> {
        let resp = self
            .fetch_chart(
                symbol,
                &[("interval", interval.to_string()), ("range", period.to_string())],
            )
            .await?;
        parse_bars(symbol, resp)
    }

    async fn get_history_range(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let resp = self
            .fetch_chart(
                symbol,
                &[
                    ("interval", interval.to_string()),
                    ("period1", start.timestamp().to_string()),
                    ("period2", end.timestamp().to_string()),
                ],
            )
            .await?;
        parse_bars(symbol, resp)
    }
}

#[async_trait]
impl LivePriceLookup for YahooClient {
    async fn get_last_price(&self, symbol: &str) -> Option<f64> {
        let query = [("interval", "1d".to_string()), ("range", "1d".to_string())];
        match self.fetch_chart(symbol, &query).await {
            Ok(resp) => parse_last_price(&resp),
            Err(e) => {
                warn!("{}: live price lookup failed: {}", symbol, e);
                None
            }
        }
    }
}

#[async_trait]
impl FundamentalsLookup for YahooClient {
    async fn get_fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let query = [(
            "modules",
            "assetProfile,summaryDetail,defaultKeyStatistics".to_string(),
        )];
        let resp = self
            .get_json("v10/finance/quoteSummary", symbol, &query)
            .await?;
        parse_fundamentals(symbol, resp)
    }
}
