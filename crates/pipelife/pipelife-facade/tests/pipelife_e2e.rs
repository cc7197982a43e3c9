//! End-to-end tests for the pipelife facade
//!
//! Request in, response out: reference scenarios, tier routing, output
//! invariants and determinism.

use chrono::{Duration, NaiveDate};
use pipelife_facade::{
    ForecastOutcome, Forecaster, Measurement, NormalizedSeries, PipeLifetimePredictor, PipeStatus,
    PredictionRequest, PredictionResponse, PredictorBuilder, Tier, YearlyPrediction,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn predictor() -> PipeLifetimePredictor {
    PredictorBuilder::new()
        .reference_date(reference())
        .seed(42)
        .build()
        .unwrap()
}

fn history(values: &[f64]) -> Vec<Measurement> {
    let start = NaiveDate::from_ymd_opt(2012, 9, 1).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Measurement::new(start + Duration::days(365 * i as i64), v))
        .collect()
}

fn declining(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 24.0 - 0.35 * i as f64 + if i % 2 == 0 { 0.05 } else { -0.05 })
        .collect()
}

fn assert_invariants(response: &PredictionResponse, tier: Tier) {
    let years: Vec<u32> = response.predictions.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![1, 2, 3, 4, 5]);

    for p in &response.predictions {
        assert!(p.predicted_thickness > 0.0, "{:?}", p);
        assert!(p.conf_upper > 0.0, "{:?}", p);
        if tier == Tier::Fallback {
            assert!(p.conf_lower >= 0.0, "{:?}", p);
        } else {
            assert!(p.conf_lower > 0.0, "{:?}", p);
        }
        assert!(p.conf_lower <= p.predicted_thickness);
        assert!(p.predicted_thickness <= p.conf_upper);
        assert!((0.0..=0.99).contains(&p.failure_probability), "{:?}", p);
        assert_status_ordering(p);
    }

    let width = |p: &YearlyPrediction| p.conf_upper - p.predicted_thickness;
    assert!(width(&response.predictions[4]) > width(&response.predictions[0]));
}

fn assert_status_ordering(p: &YearlyPrediction) {
    if p.predicted_thickness < 14.0 {
        assert_eq!(p.status, PipeStatus::Critical, "{:?}", p);
    } else if p.predicted_thickness < 18.0 {
        assert_ne!(p.status, PipeStatus::Ok, "{:?}", p);
    }
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn e2e_scenario_steel_without_history() {
    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 20, 20.0, 0.1);
    let detailed = predictor().predict_detailed(&request).unwrap();

    assert_eq!(detailed.tier, Tier::Fallback);
    let first = &detailed.response.predictions[0];
    assert!((first.predicted_thickness - 19.9).abs() < 1e-9);
    assert_eq!(first.status, PipeStatus::Ok);
    assert_invariants(&detailed.response, Tier::Fallback);
}

#[test]
fn e2e_scenario_below_critical_thickness() {
    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 40, 12.0, 0.1);
    let response = predictor().predict(&request).unwrap();

    assert!(response
        .predictions
        .iter()
        .all(|p| p.status == PipeStatus::Critical));
    assert_invariants(&response, Tier::Fallback);
}

#[test]
fn e2e_scenario_below_critical_with_exact_prediction() {
    // With the uncertainty collapsed the probability becomes a step.
    let mut config = pipelife_facade::PredictorConfig::default();
    config.uncertainty.fallback.scale = 1e-6;
    let predictor = PredictorBuilder::new()
        .config(config)
        .reference_date(reference())
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 40, 12.0, 0.0);
    let response = predictor.predict(&request).unwrap();
    for p in &response.predictions {
        assert_eq!(p.failure_probability, 1.0);
        assert_eq!(p.status, PipeStatus::Critical);
    }
}

#[test]
fn e2e_scenario_pvc_dampens_decay() {
    let request = PredictionRequest::new(Uuid::new_v4(), "pvc", 8, 20.0, 1.0);
    let response = predictor().predict(&request).unwrap();

    let thickness: Vec<f64> = response
        .predictions
        .iter()
        .map(|p| p.predicted_thickness)
        .collect();
    assert!((thickness[0] - 19.9).abs() < 1e-9);
    for pair in thickness.windows(2) {
        assert!((pair[0] - pair[1] - 0.1).abs() < 1e-9);
    }
}

// ============================================================================
// Tier Routing
// ============================================================================

struct Counting {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Forecaster for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn forecast(&self, series: &NormalizedSeries, current_age: u32) -> ForecastOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = series.values().last().copied().unwrap_or(20.0);
        Ok((1..=5).map(|k| (current_age + k, last)).collect())
    }
}

fn routed(points: usize) -> (Tier, usize, usize) {
    let trend = Arc::new(AtomicUsize::new(0));
    let sequence = Arc::new(AtomicUsize::new(0));
    let predictor = PredictorBuilder::new()
        .reference_date(reference())
        .trend_forecaster(Box::new(Counting {
            name: "trend",
            calls: trend.clone(),
        }))
        .sequence_forecaster(Box::new(Counting {
            name: "sequence",
            calls: sequence.clone(),
        }))
        .build()
        .unwrap();

    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 15, 21.0, 0.2)
        .with_history(history(&declining(points)));
    let detailed = predictor.predict_detailed(&request).unwrap();
    assert_invariants(&detailed.response, detailed.tier);

    (
        detailed.tier,
        trend.load(Ordering::SeqCst),
        sequence.load(Ordering::SeqCst),
    )
}

#[test]
fn e2e_tier_routing_by_history_length() {
    assert_eq!(routed(0), (Tier::Fallback, 0, 0));
    assert_eq!(routed(2), (Tier::Fallback, 0, 0));
    assert_eq!(routed(3), (Tier::TrendOnly, 1, 0));
    assert_eq!(routed(4), (Tier::TrendOnly, 1, 0));
    assert_eq!(routed(5), (Tier::FullEnsemble, 1, 1));
    assert_eq!(routed(9), (Tier::FullEnsemble, 1, 1));
}

// ============================================================================
// Real Models
// ============================================================================

#[test]
fn e2e_trend_only_with_changepoint_model() {
    let request = PredictionRequest::new(Uuid::new_v4(), "cast_iron", 15, 23.3, 0.3)
        .with_history(history(&declining(4)));
    let detailed = predictor().predict_detailed(&request).unwrap();

    assert_eq!(detailed.tier, Tier::TrendOnly);
    assert!(detailed.failures.is_empty());
    assert_invariants(&detailed.response, Tier::TrendOnly);
}

#[test]
fn e2e_full_ensemble_with_trained_sequence_model() {
    let request = PredictionRequest::new(Uuid::new_v4(), "ductile_iron", 15, 21.5, 0.3)
        .with_history(history(&declining(8)));
    let detailed = predictor().predict_detailed(&request).unwrap();

    assert_eq!(detailed.tier, Tier::FullEnsemble);
    assert_eq!(detailed.series_len, 8);
    assert_eq!(detailed.response.confidence_score, 0.94);
    assert_invariants(&detailed.response, Tier::FullEnsemble);
}

#[test]
fn e2e_unseeded_full_ensemble_keeps_invariants() {
    let predictor = PredictorBuilder::new()
        .reference_date(reference())
        .build()
        .unwrap();
    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 15, 20.5, 0.3)
        .with_history(history(&declining(6)));

    for _ in 0..3 {
        let response = predictor.predict(&request).unwrap();
        assert_invariants(&response, Tier::FullEnsemble);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn e2e_fallback_is_deterministic() {
    let request = PredictionRequest::new(Uuid::new_v4(), "cast_iron", 30, 18.4, 0.35);
    let unseeded = PredictorBuilder::new()
        .reference_date(reference())
        .build()
        .unwrap();
    assert_eq!(
        unseeded.predict(&request).unwrap(),
        unseeded.predict(&request).unwrap()
    );
}

#[test]
fn e2e_seeded_full_ensemble_is_reproducible() {
    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 15, 21.0, 0.2)
        .with_history(history(&declining(7)));
    assert_eq!(
        predictor().predict(&request).unwrap(),
        predictor().predict(&request).unwrap()
    );
}

#[test]
fn e2e_batch_matches_single_requests() {
    let requests: Vec<PredictionRequest> = (0..8)
        .map(|i| {
            PredictionRequest::new(Uuid::new_v4(), "steel", 15, 20.0 + i as f64 * 0.5, 0.2)
                .with_history(history(&declining(i % 5)))
        })
        .collect();

    let predictor = predictor();
    let batch = predictor.predict_batch(&requests);
    for (request, result) in requests.iter().zip(batch) {
        assert_eq!(result.unwrap(), predictor.predict(request).unwrap());
    }
}

#[test]
fn e2e_response_serializes() {
    let request = PredictionRequest::new(Uuid::new_v4(), "steel", 20, 20.0, 0.1);
    let response = predictor().predict(&request).unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["model_version"], "hybrid-trend-lstm-v1.0");
    assert_eq!(json["predictions"].as_array().unwrap().len(), 5);
    assert_eq!(json["predictions"][0]["status"], "Ok");
}
