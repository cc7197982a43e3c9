//! Predictor configuration loading and builder

use chrono::NaiveDate;
use pipelife_core::{LstmTrainer, SequenceForecaster, TieredDispatcher, TrendForecaster};
use pipelife_spi::{EnsembleWeights, Forecaster, PredictionError, PredictorConfig, Result};
use std::path::Path;

use crate::service::PipeLifetimePredictor;

/// Parse and validate a (possibly partial) JSON configuration
pub fn config_from_json(json: &str) -> Result<PredictorConfig> {
    let config: PredictorConfig =
        serde_json::from_str(json).map_err(|e| PredictionError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Read a JSON configuration file and validate it
pub fn config_from_path(path: impl AsRef<Path>) -> Result<PredictorConfig> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| PredictionError::Config(format!("{}: {}", path.display(), e)))?;
    config_from_json(&json)
}

/// Builder for [`PipeLifetimePredictor`].
#[derive(Default)]
pub struct PredictorBuilder {
    config: Option<PredictorConfig>,
    weights: Option<EnsembleWeights>,
    seed: Option<u64>,
    reference_date: Option<NaiveDate>,
    trend: Option<Box<dyn Forecaster>>,
    sequence: Option<Box<dyn Forecaster>>,
}

impl PredictorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full configuration.
    pub fn config(mut self, config: PredictorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the ensemble weights.
    pub fn weights(mut self, trend: f64, sequence: f64) -> Self {
        self.weights = Some(EnsembleWeights { trend, sequence });
        self
    }

    /// Seed the sequence model's RNG for reproducible training.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Evaluate production dates against a fixed date instead of today.
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Replace the changepoint trend forecaster.
    pub fn trend_forecaster(mut self, forecaster: Box<dyn Forecaster>) -> Self {
        self.trend = Some(forecaster);
        self
    }

    /// Replace the LSTM sequence forecaster.
    pub fn sequence_forecaster(mut self, forecaster: Box<dyn Forecaster>) -> Self {
        self.sequence = Some(forecaster);
        self
    }

    /// Validate the configuration and build the predictor.
    pub fn build(self) -> Result<PipeLifetimePredictor> {
        let mut config = self.config.unwrap_or_default();
        if let Some(weights) = self.weights {
            config.weights = weights;
        }
        if let Some(seed) = self.seed {
            config.sequence.seed = Some(seed);
        }
        config.validate()?;

        let trend = self
            .trend
            .unwrap_or_else(|| Box::new(TrendForecaster::from_config(&config)));
        let sequence = self.sequence.unwrap_or_else(|| {
            Box::new(SequenceForecaster::with_trainer(
                LstmTrainer::new(&config.sequence),
                &config,
            ))
        });

        let dispatcher = TieredDispatcher::with_forecasters(config, trend, sequence);
        Ok(PipeLifetimePredictor::from_dispatcher(
            dispatcher,
            self.reference_date,
        ))
    }
}
