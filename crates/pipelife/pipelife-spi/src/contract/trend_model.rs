//! Trend model trait following the fit-then-predict pattern

use crate::error::Result;

/// Model of thickness as a function of elapsed time
///
/// Time is expressed in days relative to the first observation, so
/// irregularly spaced inspections need no resampling.
pub trait TrendModel: Send {
    /// Fit the model to observations `values[i]` taken at `days[i]`
    fn fit(&mut self, days: &[f64], values: &[f64]) -> Result<()>;

    /// Predict values at arbitrary elapsed-day positions
    fn predict_at(&self, days: &[f64]) -> Result<Vec<f64>>;

    /// Check if the model has been fitted
    fn is_fitted(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictionError;

    /// Mock implementation: straight line through first and last point
    struct ChordModel {
        line: Option<(f64, f64)>,
    }

    impl TrendModel for ChordModel {
        fn fit(&mut self, days: &[f64], values: &[f64]) -> Result<()> {
            if days.len() < 2 || days.len() != values.len() {
                return Err(PredictionError::InsufficientData {
                    required: 2,
                    actual: days.len().min(values.len()),
                });
            }
            let span = days[days.len() - 1] - days[0];
            if span <= 0.0 {
                return Err(PredictionError::NumericalError("zero time span".to_string()));
            }
            let slope = (values[values.len() - 1] - values[0]) / span;
            self.line = Some((values[0] - slope * days[0], slope));
            Ok(())
        }

        fn predict_at(&self, days: &[f64]) -> Result<Vec<f64>> {
            let (intercept, slope) = self.line.ok_or(PredictionError::NotFitted)?;
            Ok(days.iter().map(|d| intercept + slope * d).collect())
        }

        fn is_fitted(&self) -> bool {
            self.line.is_some()
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = ChordModel { line: None };
        assert!(!model.is_fitted());
        assert_eq!(model.predict_at(&[1.0]), Err(PredictionError::NotFitted));
    }

    #[test]
    fn test_fit_then_predict() {
        let mut model = ChordModel { line: None };
        model.fit(&[0.0, 365.0, 730.0], &[20.0, 19.8, 19.6]).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict_at(&[1095.0]).unwrap();
        assert!((forecast[0] - 19.4).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_time_span_is_an_error() {
        let mut model = ChordModel { line: None };
        let result = model.fit(&[10.0, 10.0], &[20.0, 19.0]);
        assert!(matches!(result, Err(PredictionError::NumericalError(_))));
    }

    #[test]
    fn test_trait_object_usage() {
        let mut model: Box<dyn TrendModel> = Box::new(ChordModel { line: None });
        model.fit(&[0.0, 1.0], &[1.0, 2.0]).unwrap();
        assert_eq!(model.predict_at(&[2.0]).unwrap(), vec![3.0]);
    }
}
