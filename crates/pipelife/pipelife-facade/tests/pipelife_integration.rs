//! Integration tests for the pipelife facade
//!
//! Component interplay: forecasters feeding the risk scorer, configuration
//! flowing from JSON into the dispatcher, custom forecasters and trainers
//! plugged in through the builder.

use chrono::{Duration, NaiveDate};
use pipelife_facade::{
    config_from_json, normalize_history, ForecastFailure, ForecastOutcome, Forecaster,
    Measurement, NormalizedSeries, PredictionRequest, PredictorBuilder, PredictorConfig,
    Result, RiskScorer, SequenceForecaster, SequenceModel, SequenceTrainer, Tier,
    TrendForecaster,
};
use uuid::Uuid;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn yearly_history(start_year: i32, values: &[f64]) -> Vec<Measurement> {
    let start = NaiveDate::from_ymd_opt(start_year, 4, 15).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Measurement::new(start + Duration::days(365 * i as i64), v))
        .collect()
}

fn series(values: &[f64]) -> NormalizedSeries {
    normalize_history(&yearly_history(2015, values), 12, reference()).unwrap()
}

#[test]
fn test_trend_forecast_follows_linear_decline() {
    let values: Vec<f64> = (0..6).map(|i| 20.0 - 0.25 * i as f64).collect();
    let points = TrendForecaster::default().forecast(&series(&values), 12).unwrap();

    assert_eq!(points.len(), 5);
    let first = points.get(13).unwrap();
    let last = points.get(17).unwrap();
    assert!((first - 18.5).abs() < 0.1, "first = {}", first);
    assert!(last < first);
}

#[test]
fn test_trend_into_risk_scorer() {
    let config = PredictorConfig::default();
    let values = [16.0, 15.6, 15.1, 14.7];
    let points = TrendForecaster::from_config(&config)
        .forecast(&series(&values), 12)
        .unwrap();

    let thicknesses: Vec<f64> = (13..=17).map(|age| points.get_or(age, 16.0)).collect();
    let predictions = RiskScorer::for_tier(&config, Tier::TrendOnly).score_all(&thicknesses);

    assert_eq!(predictions.len(), 5);
    for pair in predictions.windows(2) {
        assert!(pair[1].failure_probability >= pair[0].failure_probability);
    }
}

#[test]
fn test_seeded_sequence_forecast_is_stable() {
    let mut config = PredictorConfig::default();
    config.sequence.seed = Some(21);
    let history = series(&[21.0, 20.7, 20.5, 20.1, 19.8, 19.4, 19.1]);

    let a = SequenceForecaster::from_config(&config).forecast(&history, 12);
    let b = SequenceForecaster::from_config(&config).forecast(&history, 12);
    assert_eq!(a, b);
    assert!(a.unwrap().iter().all(|(_, t)| t >= 0.1));
}

/// Trainer producing a model that repeats the last observation
struct Persistence;

struct Repeat;

impl SequenceModel for Repeat {
    fn predict_next(&self, window: &[f64]) -> Result<f64> {
        Ok(window[window.len() - 1])
    }
}

impl SequenceTrainer for Persistence {
    type Model = Repeat;

    fn train(&self, _: &[Vec<f64>], _: &[f64]) -> Result<Repeat> {
        Ok(Repeat)
    }
}

#[test]
fn test_custom_trainer_through_builder() {
    let config = PredictorConfig::default();
    let predictor = PredictorBuilder::new()
        .reference_date(reference())
        .sequence_forecaster(Box::new(SequenceForecaster::with_trainer(
            Persistence,
            &config,
        )))
        .trend_forecaster(Box::new(SequenceForecaster::with_trainer(Persistence, &config)))
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 12, 19.0, 0.2)
        .with_history(yearly_history(2015, &[21.0, 20.5, 20.0, 19.5, 19.2]));
    let response = predictor.predict(&request).unwrap();

    assert!(response
        .predictions
        .iter()
        .all(|p| (p.predicted_thickness - 19.2).abs() < 1e-9));
}

struct AlwaysFails;

impl Forecaster for AlwaysFails {
    fn name(&self) -> &str {
        "always-fails"
    }

    fn forecast(&self, _: &NormalizedSeries, _: u32) -> ForecastOutcome {
        Err(ForecastFailure::PredictFailed("no signal".to_string()))
    }
}

#[test]
fn test_both_forecasters_failing_yields_current_thickness() {
    let predictor = PredictorBuilder::new()
        .reference_date(reference())
        .trend_forecaster(Box::new(AlwaysFails))
        .sequence_forecaster(Box::new(AlwaysFails))
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 12, 17.5, 0.2)
        .with_history(yearly_history(2015, &[20.0, 19.5, 19.0, 18.5, 18.0, 17.5]));
    let detailed = predictor.predict_detailed(&request).unwrap();

    assert_eq!(detailed.tier, Tier::FullEnsemble);
    assert_eq!(detailed.failures.len(), 2);
    assert!(detailed
        .response
        .predictions
        .iter()
        .all(|p| p.predicted_thickness == 17.5));
}

#[test]
fn test_json_config_changes_tier_routing() {
    let config = config_from_json(
        r#"{
            "tiers": { "full_ensemble_min_points": 8, "trend_only_min_points": 2 }
        }"#,
    )
    .unwrap();
    let predictor = PredictorBuilder::new()
        .config(config)
        .reference_date(reference())
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 12, 19.0, 0.2)
        .with_history(yearly_history(2016, &[20.0, 19.5]));
    let detailed = predictor.predict_detailed(&request).unwrap();
    assert_eq!(detailed.tier, Tier::TrendOnly);
}

#[test]
fn test_json_config_changes_fallback_factor() {
    let config =
        config_from_json(r#"{ "materials": { "factors": { "steel": 2.0 } } }"#).unwrap();
    let predictor = PredictorBuilder::new()
        .config(config)
        .reference_date(reference())
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "Steel", 12, 20.0, 0.25);
    let response = predictor.predict(&request).unwrap();
    assert_eq!(response.predictions[0].predicted_thickness, 19.5);
}
