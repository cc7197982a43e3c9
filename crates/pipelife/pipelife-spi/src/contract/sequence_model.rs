//! Seams around the recurrent sequence model
//!
//! Training sits behind [`SequenceTrainer`] so the per-request training run
//! can be replaced by a pre-trained model without changing how forecasts are
//! blended.

use crate::error::Result;

/// A trained one-step-ahead model over fixed-length windows
pub trait SequenceModel {
    /// Predict the value that follows `window`
    fn predict_next(&self, window: &[f64]) -> Result<f64>;
}

/// Produces a [`SequenceModel`] from supervised window/target pairs
pub trait SequenceTrainer: Send + Sync {
    type Model: SequenceModel;

    /// Train a model where `targets[i]` follows `windows[i]`
    fn train(&self, windows: &[Vec<f64>], targets: &[f64]) -> Result<Self::Model>;
}
