//! Technical indicator features
//!
//! Turns raw bars into feature rows carrying two simple moving averages and
//! a 14-period RSI. Rows whose indicators are not yet defined are dropped,
//! so the output is always shorter than the input.

use crate::error::{PredictError, Result};
use crate::types::Bar;
use serde::Serialize;

/// Number of values each feature row contributes to a model window
pub const FEATURES_PER_ROW: usize = 8;

/// Indicator periods
#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sma_short: 5,
            sma_long: 10,
            rsi_period: 14,
        }
    }
}

/// A bar plus its indicators; only built when all indicators are defined
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub bar: Bar,
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
}

impl FeatureRow {
    /// Field order used for every model input
    pub fn values(&self) -> [f64; FEATURES_PER_ROW] {
        [
            self.bar.open,
            self.bar.high,
            self.bar.low,
            self.bar.close,
            self.bar.volume,
            self.sma_short,
            self.sma_long,
            self.rsi,
        ]
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FeatureConfig::default())
    }

    /// Compute indicators and keep only fully defined rows
    pub fn build(&self, symbol: &str, bars: &[Bar]) -> Result<Vec<FeatureRow>> {
        if bars.is_empty() {
            return Err(PredictError::NoData(symbol.to_string()));
        }
        if let Some(index) = bars.iter().position(|b| !b.is_finite()) {
            return Err(PredictError::MalformedBar {
                index,
                reason: "non-finite price or volume".to_string(),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma_short = rolling_mean(&closes, self.config.sma_short);
        let sma_long = rolling_mean(&closes, self.config.sma_long);
        let rsi = rsi(&closes, self.config.rsi_period);

        let rows: Vec<FeatureRow> = bars
            .iter()
            .enumerate()
            .filter_map(|(i, bar)| {
                Some(FeatureRow {
                    bar: *bar,
                    sma_short: sma_short[i]?,
                    sma_long: sma_long[i]?,
                    rsi: rsi[i]?,
                })
            })
            .collect();

        tracing::debug!(
            "{}: {} bars -> {} feature rows",
            symbol,
            bars.len(),
            rows.len()
        );
        Ok(rows)
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Trailing mean over `period` values; `None` until the window is full
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            // Summed per window so a row never depends on how long the series is
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect()
}

/// Relative Strength Index from simple rolling means of gains and losses.
///
/// The first bar has no predecessor and counts as a zero change, so the
/// first defined value sits at index `period - 1`. A window with no losses
/// has an undefined gain/loss ratio and yields `None` rather than 100.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let delta = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) if loss > 0.0 => {
                let rs = gain / loss;
                Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
            }
            _ => None,
        })
        .collect()
}
