//! Direction predictor
//!
//! Ties the pipeline together for one symbol:
//!
//! ```text
//! HistoryProvider → FeatureEngineer → WindowLabeler → ModelTrainer → score latest window
//!                                                                          ↓
//!                                            LivePriceLookup → PredictionResult
//! ```
//!
//! Nothing survives between calls: every `predict` fetches history, trains a
//! new model and throws it away.

use std::sync::Arc;

use super::dataset::WindowLabeler;
use super::features::{FeatureEngineer, FeatureRow};
use super::gbm::GbmParams;
use super::trainer::ModelTrainer;
use crate::client::{HistoryProvider, LivePriceLookup};
use crate::config::{Config, PipelineConfig};
use crate::error::{PredictError, Result};
use crate::types::{round_price, Bar, Direction, PredictionResult};

/// Share of the live price the forecast moves at 100% confidence
const MAX_MOVE_FRACTION: f64 = 0.01;

/// Classifier output for the most recent window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    /// 1 = up, 0 = down
    pub class: u8,
    /// Probability of `class`, in [0.5, 1]
    pub probability: f64,
    /// Close of the last feature row, used when no live quote exists
    pub last_close: f64,
    /// Number of training windows
    pub n_windows: usize,
}

/// The synchronous, CPU-bound part of a prediction
pub struct Pipeline {
    engineer: FeatureEngineer,
    labeler: WindowLabeler,
    trainer: ModelTrainer,
}

impl Pipeline {
    pub fn new(engineer: FeatureEngineer, labeler: WindowLabeler, trainer: ModelTrainer) -> Self {
        Self {
            engineer,
            labeler,
            trainer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FeatureEngineer::with_defaults(),
            WindowLabeler::new(config.pipeline.window_size, config.pipeline.prediction_offset),
            ModelTrainer::new(GbmParams::from(&config.model)),
        )
    }

    /// Features, dataset, fit, and score the latest window
    pub fn run(&self, symbol: &str, bars: &[Bar]) -> Result<Forecast> {
        let rows = self.engineer.build(symbol, bars)?;
        self.run_on_rows(&rows)
    }

    pub fn run_on_rows(&self, rows: &[FeatureRow]) -> Result<Forecast> {
        let dataset = self.labeler.build(rows)?;
        let model = self.trainer.train(&dataset)?;

        let window = self.labeler.latest_window(rows)?;
        let (class, probability) = model.score(&window)?;
        let last_close = rows
            .last()
            .map(FeatureRow::close)
            .ok_or(PredictError::InsufficientData {
                rows: 0,
                required: self.labeler.required_rows(),
            })?;

        Ok(Forecast {
            class,
            probability,
            last_close,
            n_windows: dataset.n_samples(),
        })
    }
}

/// Turn a forecast and an optional live quote into the caller-facing record
pub fn build_result(symbol: &str, forecast: &Forecast, live_price: Option<f64>) -> Result<PredictionResult> {
    let direction = Direction::from_class(forecast.class);
    let confidence = forecast.probability * 100.0;

    let live_price = live_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(forecast.last_close);

    let predicted_change = MAX_MOVE_FRACTION * live_price * (confidence / 100.0);
    let predicted_price = match direction {
        Direction::Up => live_price + predicted_change,
        Direction::Down => live_price - predicted_change,
    };

    Ok(PredictionResult {
        symbol: symbol.to_uppercase(),
        live_price: round_price(live_price)?,
        predicted_price: round_price(predicted_price)?,
        confidence: round_price(confidence)?,
        direction,
        suggestion: direction.suggestion(),
    })
}

/// Predicts direction for a symbol using injected data collaborators
#[derive(Clone)]
pub struct Predictor {
    pipeline: Arc<Pipeline>,
    history: Arc<dyn HistoryProvider>,
    quotes: Arc<dyn LivePriceLookup>,
    settings: PipelineConfig,
}

impl Predictor {
    pub fn new(
        pipeline: Pipeline,
        history: Arc<dyn HistoryProvider>,
        quotes: Arc<dyn LivePriceLookup>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            history,
            quotes,
            settings,
        }
    }

    pub fn from_config(
        config: &Config,
        history: Arc<dyn HistoryProvider>,
        quotes: Arc<dyn LivePriceLookup>,
    ) -> Self {
        Self::new(
            Pipeline::from_config(config),
            history,
            quotes,
            config.pipeline.clone(),
        )
    }

    /// Fetch history, retrain, and forecast the next move for `symbol`
    pub async fn predict(&self, symbol: &str) -> Result<PredictionResult> {
        let bars = self
            .history
            .get_history(symbol, &self.settings.interval, &self.settings.period())
            .await?;
        if bars.is_empty() {
            return Err(PredictError::NoData(symbol.to_string()));
        }
        tracing::info!("{}: fetched {} bars", symbol, bars.len());

        // Training is CPU-bound; keep it off the async workers
        let pipeline = Arc::clone(&self.pipeline);
        let owned_symbol = symbol.to_string();
        let forecast =
            tokio::task::spawn_blocking(move || pipeline.run(&owned_symbol, &bars)).await??;

        let live_price = self.quotes.get_last_price(symbol).await;
        if live_price.is_none() {
            tracing::warn!(
                "{}: no live price, using last close {:.2}",
                symbol,
                forecast.last_close
            );
        }

        let result = build_result(symbol, &forecast, live_price)?;
        tracing::info!(
            "{}: {:?} with {}% confidence ({} training windows)",
            symbol,
            result.direction,
            result.confidence,
            forecast.n_windows
        );
        Ok(result)
    }
}
