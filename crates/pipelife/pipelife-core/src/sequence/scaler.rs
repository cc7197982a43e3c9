//! Z-score scaling for the sequence model

/// Zero-mean, unit-variance scaling fitted on one series
///
/// The standard deviation is the population value plus `epsilon`, so a
/// constant series scales to zeros instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreScaler {
    mean: f64,
    std_dev: f64,
}

impl ZScoreScaler {
    pub fn fit(data: &[f64], epsilon: f64) -> Self {
        let n = data.len().max(1) as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt() + epsilon,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| (x - self.mean) / self.std_dev).collect()
    }

    pub fn inverse_one(&self, z: f64) -> f64 {
        z * self.std_dev + self.mean
    }
}
