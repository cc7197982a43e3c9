//! Measurement and normalized series models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_unit() -> String {
    "mm".to_string()
}

/// Historical wall-thickness measurement supplied by the caller
///
/// The unit is informational only; values are treated as millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Calendar date of the inspection
    pub date: NaiveDate,
    /// Measured wall thickness
    pub value: f64,
    /// Unit label as reported by the inspection
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl Measurement {
    /// Create a measurement in millimetres
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            unit: default_unit(),
        }
    }
}

/// One admissible observation in a [`NormalizedSeries`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Time-ordered history restricted to the pipe's service life
///
/// Recomputed for every request, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    points: Vec<SeriesPoint>,
}

impl NormalizedSeries {
    /// Build a series from points that are already filtered and sorted
    pub fn from_sorted(points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date <= w[1].date));
        Self { points }
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observations in ascending date order
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Measured values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Date of the earliest observation
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Date of the latest observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Days elapsed since the first observation, one entry per point
    pub fn elapsed_days(&self) -> Vec<f64> {
        match self.first_date() {
            Some(origin) => self
                .points
                .iter()
                .map(|p| (p.date - origin).num_days() as f64)
                .collect(),
            None => Vec::new(),
        }
    }
}
