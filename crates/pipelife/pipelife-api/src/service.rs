//! Request-level prediction service

use chrono::NaiveDate;
use pipelife_core::{TieredDispatcher, TieredForecast};
use pipelife_spi::{
    ForecastFailure, PredictionRequest, PredictionResponse, PredictorConfig, Result, Tier,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Version tag reported with every response
pub const MODEL_VERSION: &str = "hybrid-trend-lstm-v1.0";

/// Identity of the running service, for health reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub model_version: String,
}

/// Response plus the dispatch diagnostics behind it
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedPrediction {
    pub response: PredictionResponse,
    pub tier: Tier,
    pub series_len: usize,
    pub failures: Vec<(String, ForecastFailure)>,
}

/// Confidence in a forecast from the number of raw history records
///
/// `0.7 + min(count / 10, 1) * 0.3`, rounded to 2 decimals.
pub fn confidence_score(history_count: usize) -> f64 {
    let coverage = (history_count as f64 / 10.0).min(1.0);
    ((0.7 + coverage * 0.3) * 100.0).round() / 100.0
}

/// Validates requests and produces five-year forecasts
#[derive(Debug)]
pub struct PipeLifetimePredictor {
    dispatcher: TieredDispatcher,
    reference_date: Option<NaiveDate>,
}

impl Default for PipeLifetimePredictor {
    fn default() -> Self {
        Self::from_dispatcher(TieredDispatcher::default(), None)
    }
}

impl PipeLifetimePredictor {
    /// Predictor with the default forecasters and a validated configuration
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_dispatcher(TieredDispatcher::new(config), None))
    }

    pub fn from_dispatcher(dispatcher: TieredDispatcher, reference_date: Option<NaiveDate>) -> Self {
        Self {
            dispatcher,
            reference_date,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        self.dispatcher.config()
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            service: "pipelife".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_version: MODEL_VERSION.to_string(),
        }
    }

    /// Forecast a single pipe
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        self.predict_detailed(request).map(|detailed| detailed.response)
    }

    /// Forecast a single pipe and keep the tier and failure diagnostics
    pub fn predict_detailed(&self, request: &PredictionRequest) -> Result<DetailedPrediction> {
        tracing::info!(
            pipe_id = %request.pipe_id,
            material = %request.material,
            age_years = request.age_years,
            history = request.history_measurements.len(),
            "prediction requested"
        );
        request.validate()?;

        let today = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let TieredForecast {
            tier,
            series_len,
            predictions,
            failures,
        } = self.dispatcher.predict_as_of(request, today)?;

        let confidence = confidence_score(request.history_measurements.len());
        tracing::info!(
            pipe_id = %request.pipe_id,
            %tier,
            confidence,
            degraded = failures.len(),
            "prediction complete"
        );

        Ok(DetailedPrediction {
            response: PredictionResponse {
                pipe_id: request.pipe_id,
                predictions,
                model_version: MODEL_VERSION.to_string(),
                confidence_score: confidence,
            },
            tier,
            series_len,
            failures,
        })
    }

    /// Forecast many pipes in parallel; results keep input order
    pub fn predict_batch(&self, requests: &[PredictionRequest]) -> Vec<Result<PredictionResponse>> {
        requests.par_iter().map(|r| self.predict(r)).collect()
    }
}
