//! Basic example forecasting three pipes
//!
//! Run with: cargo run --example basic -p pipelife-facade

use chrono::{Duration, NaiveDate};
use pipelife_facade::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

fn history(start: NaiveDate, values: &[f64]) -> Vec<Measurement> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Measurement::new(start + Duration::days(365 * i as i64), v))
        .collect()
}

fn print_response(label: &str, detailed: &DetailedPrediction) {
    println!(
        "{} (tier: {}, confidence: {:.2})",
        label, detailed.tier, detailed.response.confidence_score
    );
    for p in &detailed.response.predictions {
        println!(
            "   year {}: {:>6.2} mm  [{:>6.2}, {:>6.2}]  p(fail) {:.4}  {}",
            p.year, p.predicted_thickness, p.conf_lower, p.conf_upper, p.failure_probability,
            p.status
        );
    }
    for (name, failure) in &detailed.failures {
        println!("   degraded: {} ({})", name, failure);
    }
    println!();
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipelife=info".into()),
        )
        .init();

    println!("=== pipelife Basic Examples ===\n");

    let predictor = PredictorBuilder::new().build()?;
    let info = predictor.info();
    println!("{} {} ({})\n", info.service, info.version, info.model_version);

    // 1. No inspections yet: material-adjusted degradation rate
    let new_pipe = PredictionRequest::new(Uuid::new_v4(), "cast_iron", 3, 21.0, 0.25);
    print_response("1. Fallback", &predictor.predict_detailed(&new_pipe)?);

    // 2. A few inspections: changepoint trend only
    let start = NaiveDate::from_ymd_opt(2019, 5, 1).ok_or("invalid date")?;
    let inspected = PredictionRequest::new(Uuid::new_v4(), "steel", 12, 18.9, 0.3)
        .with_history(history(start, &[19.8, 19.5, 19.1, 18.9]));
    print_response("2. Trend only", &predictor.predict_detailed(&inspected)?);

    // 3. Long inspection record: trend and LSTM ensemble
    let start = NaiveDate::from_ymd_opt(2014, 5, 1).ok_or("invalid date")?;
    let monitored = PredictionRequest::new(Uuid::new_v4(), "ductile_iron", 25, 15.2, 0.4)
        .with_history(history(
            start,
            &[18.6, 18.2, 17.9, 17.3, 16.9, 16.5, 16.0, 15.7, 15.2],
        ));
    print_response("3. Full ensemble", &predictor.predict_detailed(&monitored)?);

    // 4. Batch evaluation
    let responses = predictor.predict_batch(&[new_pipe, inspected, monitored]);
    let critical = responses
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter(|r| r.predictions.iter().any(|p| p.status == PipeStatus::Critical))
        .count();
    println!("4. Batch: {} pipes, {} with a critical year", responses.len(), critical);

    Ok(())
}
