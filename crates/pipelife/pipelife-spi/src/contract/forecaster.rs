//! Forecaster trait shared by the trend and sequence forecasters

use crate::model::{ForecastOutcome, NormalizedSeries};

/// Produces thickness forecasts keyed by future age
///
/// Implementations never return an error: internal failures are reported
/// as a [`ForecastFailure`](crate::model::ForecastFailure) so the caller can
/// degrade to another signal.
pub trait Forecaster: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &str;

    /// Forecast the horizon for a pipe currently `current_age` years old
    fn forecast(&self, series: &NormalizedSeries, current_age: u32) -> ForecastOutcome;
}
