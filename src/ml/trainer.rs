//! Fits a fresh scaler + classifier pair for one prediction request

use super::dataset::Dataset;
use super::gbm::{GbmParams, GradientBoostedClassifier};
use super::scaler::StandardScaler;
use crate::error::{PredictError, Result};
use std::time::Instant;

/// A trained model; lives only as long as the request that built it
#[derive(Debug, Clone)]
pub struct Model {
    pub scaler: StandardScaler,
    pub classifier: GradientBoostedClassifier,
}

impl Model {
    /// Scale a raw window with the training statistics and classify it
    pub fn score(&self, window: &[f64]) -> Result<(u8, f64)> {
        let scaled = self.scaler.transform_one(window)?;
        self.classifier.predict(&scaled)
    }
}

pub struct ModelTrainer {
    params: GbmParams,
}

impl ModelTrainer {
    pub fn new(params: GbmParams) -> Self {
        Self { params }
    }

    pub fn train(&self, dataset: &Dataset) -> Result<Model> {
        if dataset.is_empty() {
            return Err(PredictError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }

        let started = Instant::now();
        let scaler = StandardScaler::fit(&dataset.features)?;
        let scaled = scaler.transform(&dataset.features)?;
        let classifier = GradientBoostedClassifier::fit(&scaled, &dataset.labels, &self.params)?;

        tracing::info!(
            "Trained {} trees on {} windows in {:?}",
            classifier.n_trees(),
            dataset.n_samples(),
            started.elapsed()
        );

        Ok(Model { scaler, classifier })
    }
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(GbmParams::default())
    }
}
