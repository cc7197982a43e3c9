//! Tier selection and the per-request forecast pipeline
//!
//! The dispatcher normalizes history, picks exactly one tier from the series
//! length and always produces five yearly predictions. Forecaster failures
//! are recorded and degrade to the current thickness for the missing ages;
//! they never escape as errors.

use chrono::NaiveDate;
use pipelife_spi::{
    ForecastFailure, ForecastPoints, Forecaster, NormalizedSeries, PredictionRequest,
    PredictorConfig, Result, Tier, YearlyPrediction,
};

use crate::ensemble::{blend, linear_decay, single, RiskScorer};
use crate::normalizer::normalize_history;
use crate::sequence::SequenceForecaster;
use crate::trend::TrendForecaster;

/// Outcome of one dispatch, with the diagnostics behind it
#[derive(Debug, Clone, PartialEq)]
pub struct TieredForecast {
    pub tier: Tier,
    /// Number of admissible measurements after normalization
    pub series_len: usize,
    pub predictions: Vec<YearlyPrediction>,
    /// Forecasters that produced nothing, by name
    pub failures: Vec<(String, ForecastFailure)>,
}

/// Routes a request to the full-ensemble, trend-only or fallback tier
pub struct TieredDispatcher {
    config: PredictorConfig,
    trend: Box<dyn Forecaster>,
    sequence: Box<dyn Forecaster>,
}

impl TieredDispatcher {
    /// Dispatcher with the changepoint trend and LSTM sequence forecasters
    pub fn new(config: PredictorConfig) -> Self {
        let trend = Box::new(TrendForecaster::from_config(&config));
        let sequence = Box::new(SequenceForecaster::from_config(&config));
        Self::with_forecasters(config, trend, sequence)
    }

    /// Dispatcher with custom forecasters
    pub fn with_forecasters(
        config: PredictorConfig,
        trend: Box<dyn Forecaster>,
        sequence: Box<dyn Forecaster>,
    ) -> Self {
        Self {
            config,
            trend,
            sequence,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Tier for a normalized series of `len` points
    pub fn select_tier(&self, len: usize) -> Tier {
        self.config.tiers.select(len)
    }

    /// Forecast relative to today's local date
    pub fn predict(&self, request: &PredictionRequest) -> Result<TieredForecast> {
        self.predict_as_of(request, chrono::Local::now().date_naive())
    }

    /// Forecast with an explicit reference date for the production-date cutoff
    ///
    /// Only normalization can fail; every tier yields five predictions.
    pub fn predict_as_of(
        &self,
        request: &PredictionRequest,
        today: NaiveDate,
    ) -> Result<TieredForecast> {
        let series = normalize_history(&request.history_measurements, request.age_years, today)?;
        let tier = self.select_tier(series.len());
        tracing::debug!(
            pipe_id = %request.pipe_id,
            series_len = series.len(),
            %tier,
            "tier selected"
        );

        let age = request.age_years;
        let current = request.current_wall_thickness;
        let mut failures = Vec::new();

        let thicknesses = match tier {
            Tier::FullEnsemble => {
                let trend = Self::run(self.trend.as_ref(), &series, age, &mut failures);
                let sequence = Self::run(self.sequence.as_ref(), &series, age, &mut failures);
                blend(&trend, &sequence, &self.config.weights, age, current)
            }
            Tier::TrendOnly => {
                let trend = Self::run(self.trend.as_ref(), &series, age, &mut failures);
                single(&trend, age, current)
            }
            Tier::Fallback => {
                let factor = self.config.materials.factor(&request.material);
                let slope = -request.corrosion_rate_historical * factor;
                linear_decay(current, slope, self.config.thresholds.min_thickness)
            }
        };

        let predictions = RiskScorer::for_tier(&self.config, tier).score_all(&thicknesses);

        Ok(TieredForecast {
            tier,
            series_len: series.len(),
            predictions,
            failures,
        })
    }

    fn run(
        forecaster: &dyn Forecaster,
        series: &NormalizedSeries,
        current_age: u32,
        failures: &mut Vec<(String, ForecastFailure)>,
    ) -> ForecastPoints {
        match forecaster.forecast(series, current_age) {
            Ok(points) => points,
            Err(failure) => {
                tracing::warn!(
                    forecaster = forecaster.name(),
                    reason = %failure,
                    "forecaster degraded to current thickness"
                );
                failures.push((forecaster.name().to_string(), failure));
                ForecastPoints::new()
            }
        }
    }
}

impl Default for TieredDispatcher {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl std::fmt::Debug for TieredDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredDispatcher")
            .field("trend", &self.trend.name())
            .field("sequence", &self.sequence.name())
            .finish()
    }
}
