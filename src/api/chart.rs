//! Chart and pricing-table payloads for the stock-data endpoint

use crate::error::{PredictError, Result};
use crate::types::{Bar, Fundamentals};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Charts never carry more points than this
pub const MAX_POINTS: usize = 1000;

/// India Standard Time, UTC+05:30
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Midnight of an IST calendar date, as a UTC instant
pub fn ist_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(IST_OFFSET_SECS as i64)
}

/// Finest intervals first; short ranges get intraday bars
pub fn interval_candidates(days: i64) -> &'static [&'static str] {
    if days <= 5 {
        &["5m", "15m", "30m", "1d"]
    } else if days <= 60 {
        &["15m", "30m", "1d"]
    } else {
        &["1d"]
    }
}

/// Keep every `len / max_points + 1`-th bar when over the limit
pub fn downsample(bars: Vec<Bar>, max_points: usize) -> Vec<Bar> {
    if bars.len() <= max_points || max_points == 0 {
        return bars;
    }
    let step = bars.len() / max_points + 1;
    bars.into_iter().step_by(step).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub dates: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    #[serde(rename = "Volume")]
    pub volume: i64,
    #[serde(rename = "% Change")]
    pub pct_change: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockData {
    #[serde(rename = "chartData")]
    pub chart_data: ChartData,
    /// Latest first
    pub pricing: Vec<PricingRow>,
    /// All null when the lookup failed
    pub fundamentals: Fundamentals,
}

impl StockData {
    /// Build chart and pricing views from bars already sorted oldest first
    pub fn from_bars(bars: &[Bar], fundamentals: Fundamentals) -> Result<Self> {
        let ist = FixedOffset::east_opt(IST_OFFSET_SECS)
            .ok_or_else(|| PredictError::Internal("invalid IST offset".to_string()))?;

        let mut chart_data = ChartData {
            dates: Vec::with_capacity(bars.len()),
            open: Vec::with_capacity(bars.len()),
            high: Vec::with_capacity(bars.len()),
            low: Vec::with_capacity(bars.len()),
            close: Vec::with_capacity(bars.len()),
            volume: Vec::with_capacity(bars.len()),
        };
        let mut pricing = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let local = bar.timestamp.with_timezone(&ist);
            chart_data.dates.push(local.format("%Y-%m-%d %H:%M:%S").to_string());
            chart_data.open.push(round2(bar.open));
            chart_data.high.push(round2(bar.high));
            chart_data.low.push(round2(bar.low));
            chart_data.close.push(round2(bar.close));
            chart_data.volume.push(bar.volume as i64);

            // Adjusted close is not available from the chart feed
            let pct_change = match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev) if prev != 0.0 => (bar.close / prev - 1.0) * 100.0,
                _ => 0.0,
            };
            pricing.push(PricingRow {
                date: local.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
                open: round2(bar.open),
                high: round2(bar.high),
                low: round2(bar.low),
                close: round2(bar.close),
                adj_close: round2(bar.close),
                volume: bar.volume as i64,
                pct_change: round2(pct_change),
            });
        }
        pricing.reverse();

        Ok(Self {
            chart_data,
            pricing,
            fundamentals,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
