//! Integration tests for ML module

use super::*;
use crate::client::{MockHistoryProvider, MockLivePriceLookup};
use crate::config::PipelineConfig;
use crate::error::PredictError;
use crate::types::{Bar, Direction, Suggestion};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Closes move by `step` each bar, with a half-size move against the trend
/// every fifth bar
fn trending_bars(n: usize, step: f64) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 45, 0).unwrap();
    let mut close = 500.0;
    (0..n)
        .map(|i| {
            close += if i % 5 == 4 { -step / 2.0 } else { step };
            Bar {
                timestamp: start + Duration::minutes(15 * i as i64),
                open: close - step / 4.0,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000.0 + (i % 7) as f64 * 250.0,
            }
        })
        .collect()
}

fn fast_pipeline() -> Pipeline {
    Pipeline::new(
        FeatureEngineer::with_defaults(),
        WindowLabeler::default(),
        ModelTrainer::new(GbmParams {
            n_estimators: 25,
            ..GbmParams::default()
        }),
    )
}

fn predictor(history: MockHistoryProvider, quotes: MockLivePriceLookup) -> Predictor {
    Predictor::new(
        fast_pipeline(),
        Arc::new(history),
        Arc::new(quotes),
        PipelineConfig::default(),
    )
}

#[test]
fn test_rising_series_predicts_up() {
    let bars = trending_bars(80, 1.0);
    let forecast = fast_pipeline().run("TEST.NS", &bars).unwrap();
    assert_eq!(forecast.class, 1);
    assert!(forecast.probability >= 0.5);

    let result = build_result("TEST.NS", &forecast, None).unwrap();
    assert_eq!(result.direction, Direction::Up);
    assert_eq!(result.suggestion, Suggestion::BuyCall);
    assert!(result.confidence >= dec!(50));
    assert!(result.predicted_price > result.live_price);
}

#[test]
fn test_falling_series_predicts_down() {
    let bars = trending_bars(80, -1.0);
    let forecast = fast_pipeline().run("TEST.NS", &bars).unwrap();

    let result = build_result("TEST.NS", &forecast, Some(400.0)).unwrap();
    assert_eq!(result.direction, Direction::Down);
    assert_eq!(result.suggestion, Suggestion::BuyPut);
    assert!(result.predicted_price < result.live_price);
}

#[test]
fn test_window_count() {
    // 80 bars -> 67 feature rows -> 67 - 10 - 3 windows
    let forecast = fast_pipeline().run("TEST.NS", &trending_bars(80, 1.0)).unwrap();
    assert_eq!(forecast.n_windows, 54);
}

#[test]
fn test_five_bars_is_insufficient() {
    let err = fast_pipeline()
        .run("TEST.NS", &trending_bars(5, 1.0))
        .unwrap_err();
    assert!(matches!(err, PredictError::InsufficientData { .. }));
}

#[test]
fn test_strictly_monotone_series_is_insufficient() {
    // No losses anywhere, so RSI is undefined on every row
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 45, 0).unwrap();
    let bars: Vec<Bar> = (0..80)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar {
                timestamp: start + Duration::minutes(15 * i),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
            }
        })
        .collect();

    let err = fast_pipeline().run("TEST.NS", &bars).unwrap_err();
    assert!(matches!(err, PredictError::InsufficientData { rows: 0, .. }));
}

#[test]
fn test_same_inputs_same_forecast() {
    let bars = trending_bars(90, 1.0);
    let a = fast_pipeline().run("TEST.NS", &bars).unwrap();
    let b = fast_pipeline().run("TEST.NS", &bars).unwrap();
    assert_eq!(a, b);
}

/// Upward drift under an oscillation large enough to reverse the 3-bar move
fn oscillating_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 45, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 500.0 + 0.2 * i as f64 + 8.0 * (0.35 * i as f64).sin();
            Bar {
                timestamp: start + Duration::minutes(15 * i as i64),
                open: close - 0.3,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000.0 + (i % 11) as f64 * 150.0,
            }
        })
        .collect()
}

#[test]
fn test_mixed_labels_pipeline() {
    let bars = oscillating_bars(120);

    let rows = FeatureEngineer::with_defaults().build("TEST.NS", &bars).unwrap();
    assert_eq!(rows.len(), 107);
    let dataset = WindowLabeler::default().build(&rows).unwrap();
    let rate = dataset.positive_rate();
    assert!(rate > 0.0 && rate < 1.0, "positive rate {}", rate);

    let a = fast_pipeline().run("TEST.NS", &bars).unwrap();
    let b = fast_pipeline().run("TEST.NS", &bars).unwrap();
    assert_eq!(a, b);
    // 107 feature rows -> 107 - 10 - 3 windows
    assert_eq!(a.n_windows, 94);
    assert!(a.probability >= 0.5 && a.probability <= 1.0);

    let result = build_result("TEST.NS", &a, None).unwrap();
    assert!(result.confidence >= dec!(50) && result.confidence <= dec!(100));
    match result.direction {
        Direction::Up => assert_eq!(result.suggestion, Suggestion::BuyCall),
        Direction::Down => assert_eq!(result.suggestion, Suggestion::BuyPut),
    }
}

#[test]
fn test_direction_matches_suggestion() {
    for step in [1.0, -1.0] {
        let forecast = fast_pipeline().run("X", &trending_bars(70, step)).unwrap();
        let result = build_result("X", &forecast, None).unwrap();
        match result.direction {
            Direction::Up => assert_eq!(result.suggestion, Suggestion::BuyCall),
            Direction::Down => assert_eq!(result.suggestion, Suggestion::BuyPut),
        }
    }
}

#[tokio::test]
async fn test_predict_with_live_price() {
    let mut history = MockHistoryProvider::new();
    history
        .expect_get_history()
        .withf(|symbol, interval, period| symbol == "TCS.NS" && interval == "15m" && period == "5d")
        .times(1)
        .returning(|_, _, _| Ok(trending_bars(80, 1.0)));
    let mut quotes = MockLivePriceLookup::new();
    quotes
        .expect_get_last_price()
        .times(1)
        .returning(|_| Some(3950.0));

    let result = predictor(history, quotes).predict("TCS.NS").await.unwrap();
    assert_eq!(result.symbol, "TCS.NS");
    assert_eq!(result.live_price, dec!(3950.00));
    assert_eq!(result.direction, Direction::Up);
    assert!(result.confidence >= dec!(50) && result.confidence <= dec!(100));
}

#[tokio::test]
async fn test_predict_without_quote_uses_last_close() {
    let bars = trending_bars(80, 1.0);
    let last_close = bars.last().unwrap().close;

    let mut history = MockHistoryProvider::new();
    history
        .expect_get_history()
        .returning(move |_, _, _| Ok(trending_bars(80, 1.0)));
    let mut quotes = MockLivePriceLookup::new();
    quotes.expect_get_last_price().returning(|_| None);

    let result = predictor(history, quotes).predict("TCS.NS").await.unwrap();
    assert_eq!(result.live_price, crate::types::round_price(last_close).unwrap());
}

#[tokio::test]
async fn test_predict_empty_history_is_no_data() {
    let mut history = MockHistoryProvider::new();
    history.expect_get_history().returning(|_, _, _| Ok(Vec::new()));
    let mut quotes = MockLivePriceLookup::new();
    quotes.expect_get_last_price().never();

    let err = predictor(history, quotes).predict("EMPTY.NS").await.unwrap_err();
    assert!(matches!(err, PredictError::NoData(ref s) if s == "EMPTY.NS"));
}

#[tokio::test]
async fn test_predict_short_history_is_insufficient() {
    let mut history = MockHistoryProvider::new();
    history
        .expect_get_history()
        .returning(|_, _, _| Ok(trending_bars(5, 1.0)));
    let mut quotes = MockLivePriceLookup::new();
    quotes.expect_get_last_price().never();

    let err = predictor(history, quotes).predict("TCS.NS").await.unwrap_err();
    assert!(err.is_data_shortage());
    assert!(matches!(err, PredictError::InsufficientData { .. }));
}

#[tokio::test]
async fn test_predict_history_error_propagates() {
    let mut history = MockHistoryProvider::new();
    history
        .expect_get_history()
        .returning(|s, _, _| Err(PredictError::NoData(s.to_string())));

    let err = predictor(history, MockLivePriceLookup::new())
        .predict("GONE.NS")
        .await
        .unwrap_err();
    assert!(matches!(err, PredictError::NoData(_)));
}
