//! Windowed supervised dataset with forward-looking labels

use super::features::{FeatureRow, FEATURES_PER_ROW};
use crate::error::{PredictError, Result};

/// Flattened windows and their binary labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// One flattened window per sample, `window_size * 8` values each
    pub features: Vec<Vec<f64>>,
    /// 1 if the close rose over the forecast horizon, else 0
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Share of samples labelled "up"
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowLabeler {
    pub window_size: usize,
    pub prediction_offset: usize,
}

impl Default for WindowLabeler {
    fn default() -> Self {
        Self {
            window_size: 10,
            prediction_offset: 3,
        }
    }
}

impl WindowLabeler {
    pub fn new(window_size: usize, prediction_offset: usize) -> Self {
        Self {
            window_size,
            prediction_offset,
        }
    }

    /// Fewest rows that yield at least one labelled window
    pub fn required_rows(&self) -> usize {
        self.window_size + self.prediction_offset + 1
    }

    /// Slice rows into windows. The label of window `i` compares the close at
    /// `i + window_size + prediction_offset` with the close at `i + window_size`,
    /// and nothing past that index is read.
    pub fn build(&self, rows: &[FeatureRow]) -> Result<Dataset> {
        let required = self.required_rows();
        if rows.len() < required {
            return Err(PredictError::InsufficientData {
                rows: rows.len(),
                required,
            });
        }

        let n = rows.len() - self.window_size - self.prediction_offset;
        let mut features = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);

        for i in 0..n {
            features.push(flatten(&rows[i..i + self.window_size]));

            let current = rows[i + self.window_size].close();
            let future = rows[i + self.window_size + self.prediction_offset].close();
            labels.push(u8::from(future > current));
        }

        let dataset = Dataset { features, labels };
        tracing::debug!(
            "Built {} windows of {} features ({:.0}% up)",
            dataset.n_samples(),
            dataset.n_features(),
            dataset.positive_rate() * 100.0
        );
        Ok(dataset)
    }

    /// The most recent `window_size` rows, flattened like training windows
    pub fn latest_window(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        if rows.len() < self.window_size || self.window_size == 0 {
            return Err(PredictError::InsufficientData {
                rows: rows.len(),
                required: self.window_size.max(1),
            });
        }
        Ok(flatten(&rows[rows.len() - self.window_size..]))
    }
}

fn flatten(window: &[FeatureRow]) -> Vec<f64> {
    let mut out = Vec::with_capacity(window.len() * FEATURES_PER_ROW);
    for row in window {
        out.extend_from_slice(&row.values());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::Utc;

    fn rows_from_closes(closes: &[f64]) -> Vec<FeatureRow> {
        closes
            .iter()
            .map(|&close| FeatureRow {
                bar: Bar {
                    timestamp: Utc::now(),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 500.0,
                },
                sma_short: close,
                sma_long: close,
                rsi: 50.0,
            })
            .collect()
    }

    #[test]
    fn test_window_count_and_width() {
        let rows = rows_from_closes(&(0..30).map(|i| i as f64).collect::<Vec<_>>());
        let dataset = WindowLabeler::default().build(&rows).unwrap();

        // 30 - 10 - 3 windows
        assert_eq!(dataset.n_samples(), 17);
        assert_eq!(dataset.labels.len(), 17);
        assert_eq!(dataset.n_features(), 80);
    }

    #[test]
    fn test_labels_follow_forward_close() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i * 7) % 11) as f64 - 5.0)
            .collect();
        let rows = rows_from_closes(&closes);
        let labeler = WindowLabeler::default();
        let dataset = labeler.build(&rows).unwrap();

        for (i, &label) in dataset.labels.iter().enumerate() {
            let expected = closes[i + 13] > closes[i + 10];
            assert_eq!(label == 1, expected, "window {}", i);
        }
    }

    #[test]
    fn test_equal_close_is_not_up() {
        let rows = rows_from_closes(&[5.0; 14]);
        let dataset = WindowLabeler::default().build(&rows).unwrap();
        assert_eq!(dataset.labels, vec![0]);
    }

    #[test]
    fn test_window_flattening_order() {
        let rows = rows_from_closes(&(0..14).map(|i| i as f64).collect::<Vec<_>>());
        let dataset = WindowLabeler::default().build(&rows).unwrap();

        let first = &dataset.features[0];
        assert_eq!(&first[..8], &rows[0].values());
        assert_eq!(&first[72..], &rows[9].values());
    }

    #[test]
    fn test_labels_ignore_data_past_horizon() {
        let mut closes: Vec<f64> = (0..20).map(|i| (i % 4) as f64).collect();
        let labeler = WindowLabeler::default();
        let before = labeler.build(&rows_from_closes(&closes)).unwrap();

        // Changing the final close only affects the last window's label
        *closes.last_mut().unwrap() += 100.0;
        let after = labeler.build(&rows_from_closes(&closes)).unwrap();

        let n = before.labels.len();
        assert_eq!(before.labels[..n - 1], after.labels[..n - 1]);
        assert_eq!(before.features, after.features);
    }

    #[test]
    fn test_insufficient_rows() {
        let rows = rows_from_closes(&[1.0; 13]);
        let err = WindowLabeler::default().build(&rows).unwrap_err();
        assert!(matches!(
            err,
            PredictError::InsufficientData { rows: 13, required: 14 }
        ));
    }

    #[test]
    fn test_minimum_rows_give_one_window() {
        let rows = rows_from_closes(&(0..14).map(|i| i as f64).collect::<Vec<_>>());
        let dataset = WindowLabeler::default().build(&rows).unwrap();
        assert_eq!(dataset.n_samples(), 1);
        assert_eq!(dataset.labels, vec![1]);
    }

    #[test]
    fn test_latest_window() {
        let rows = rows_from_closes(&(0..25).map(|i| i as f64).collect::<Vec<_>>());
        let window = WindowLabeler::default().latest_window(&rows).unwrap();
        assert_eq!(window.len(), 80);
        assert_eq!(&window[..8], &rows[15].values());
        assert_eq!(&window[72..], &rows[24].values());
    }

    #[test]
    fn test_custom_parameters() {
        let rows = rows_from_closes(&(0..20).map(|i| i as f64).collect::<Vec<_>>());
        let dataset = WindowLabeler::new(5, 1).build(&rows).unwrap();
        assert_eq!(dataset.n_samples(), 14);
        assert_eq!(dataset.n_features(), 40);
    }
}
