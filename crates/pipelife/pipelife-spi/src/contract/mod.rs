//! Contract module containing trait definitions for forecasting seams

mod forecaster;
mod sequence_model;
mod trend_model;

pub use forecaster::Forecaster;
pub use sequence_model::{SequenceModel, SequenceTrainer};
pub use trend_model::TrendModel;
