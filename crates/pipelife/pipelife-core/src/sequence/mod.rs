//! Recurrent sequence forecasting
//!
//! A small LSTM is trained from scratch on sliding windows of the
//! z-scored history for every request, then rolled forward one year at a
//! time, feeding each prediction back into the window.

pub mod adam;
pub mod lstm;
pub mod scaler;

pub use adam::Adam;
pub use lstm::LstmNetwork;
pub use scaler::ZScoreScaler;

use pipelife_spi::{
    ForecastFailure, ForecastOutcome, ForecastPoints, Forecaster, NormalizedSeries,
    PredictionError, PredictorConfig, Result, SequenceConfig, SequenceModel, SequenceTrainer,
    HORIZON_YEARS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Full-batch BPTT training of an [`LstmNetwork`] with Adam and MSE loss
#[derive(Debug, Clone)]
pub struct LstmTrainer {
    hidden_size: usize,
    epochs: usize,
    learning_rate: f64,
    seed: Option<u64>,
}

impl LstmTrainer {
    pub fn new(config: &SequenceConfig) -> Self {
        Self {
            hidden_size: config.hidden_size,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            seed: config.seed,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for LstmTrainer {
    fn default() -> Self {
        Self::new(&SequenceConfig::default())
    }
}

impl SequenceTrainer for LstmTrainer {
    type Model = LstmNetwork;

    fn train(&self, windows: &[Vec<f64>], targets: &[f64]) -> Result<LstmNetwork> {
        if windows.is_empty() {
            return Err(PredictionError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if windows.len() != targets.len() {
            return Err(PredictionError::InvalidData(format!(
                "{} windows for {} targets",
                windows.len(),
                targets.len()
            )));
        }

        let mut network = LstmNetwork::new(self.hidden_size, &mut self.rng());
        let mut optimizer = Adam::new(network.param_count(), self.learning_rate);
        let mut grads = vec![0.0; network.param_count()];
        let n = windows.len() as f64;
        let mut loss = f64::NAN;

        for _ in 0..self.epochs {
            grads.iter_mut().for_each(|g| *g = 0.0);
            loss = 0.0;

            for (window, &target) in windows.iter().zip(targets) {
                let (y, trace) = network.forward_trace(window);
                let error = y - target;
                loss += error * error;
                network.backward(&trace, 2.0 * error / n, &mut grads);
            }
            loss /= n;

            if !loss.is_finite() {
                return Err(PredictionError::NumericalError(
                    "training loss diverged".to_string(),
                ));
            }
            optimizer.step(network.params_mut(), &grads);
        }

        tracing::debug!(
            pairs = windows.len(),
            epochs = self.epochs,
            loss,
            "sequence model trained"
        );
        Ok(network)
    }
}

/// Forecaster that rolls a trained sequence model five years ahead
#[derive(Debug, Clone)]
pub struct SequenceForecaster<T = LstmTrainer> {
    trainer: T,
    config: SequenceConfig,
    min_points: usize,
    floor: f64,
}

impl SequenceForecaster<LstmTrainer> {
    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::with_trainer(LstmTrainer::new(&config.sequence), config)
    }
}

impl Default for SequenceForecaster<LstmTrainer> {
    fn default() -> Self {
        Self::from_config(&PredictorConfig::default())
    }
}

impl<T: SequenceTrainer> SequenceForecaster<T> {
    /// Use a custom training loop or a pre-trained model
    pub fn with_trainer(trainer: T, config: &PredictorConfig) -> Self {
        Self {
            trainer,
            config: config.sequence.clone(),
            min_points: config.tiers.full_ensemble_min_points,
            floor: config.thresholds.min_thickness,
        }
    }

    /// Sliding windows over `normalized`, or why none can be built
    fn training_pairs(
        &self,
        normalized: &[f64],
    ) -> std::result::Result<(usize, Vec<Vec<f64>>, Vec<f64>), ForecastFailure> {
        let n = normalized.len();
        let window = self.config.max_window.min(n.saturating_sub(1));
        if window < self.config.min_window {
            return Err(ForecastFailure::InsufficientData {
                required: self.config.min_window + 1,
                actual: n,
            });
        }

        let pairs = n - window;
        if pairs < self.config.min_training_pairs {
            return Err(ForecastFailure::InsufficientData {
                required: window + self.config.min_training_pairs,
                actual: n,
            });
        }

        let windows = (0..pairs)
            .map(|i| normalized[i..i + window].to_vec())
            .collect();
        let targets = normalized[window..].to_vec();
        Ok((window, windows, targets))
    }
}

impl<T: SequenceTrainer> Forecaster for SequenceForecaster<T> {
    fn name(&self) -> &str {
        "sequence"
    }

    fn forecast(&self, series: &NormalizedSeries, current_age: u32) -> ForecastOutcome {
        if series.len() < self.min_points {
            return Err(ForecastFailure::InsufficientData {
                required: self.min_points,
                actual: series.len(),
            });
        }

        let values = series.values();
        let scaler = ZScoreScaler::fit(&values, self.config.std_epsilon);
        let normalized = scaler.transform(&values);

        let (window_len, windows, targets) = self.training_pairs(&normalized)?;
        let model = self
            .trainer
            .train(&windows, &targets)
            .map_err(ForecastFailure::from_fit_error)?;

        let mut window = normalized[normalized.len() - window_len..].to_vec();
        let mut points = ForecastPoints::new();

        for offset in 1..=HORIZON_YEARS {
            let next = model
                .predict_next(&window)
                .map_err(ForecastFailure::from_predict_error)?;
            if !next.is_finite() {
                return Err(ForecastFailure::PredictFailed(
                    "non-finite sequence prediction".to_string(),
                ));
            }

            let thickness = scaler.inverse_one(next).max(self.floor);
            points.insert(current_age + offset, thickness);

            window.remove(0);
            window.push(next);
        }

        Ok(points)
    }
}
