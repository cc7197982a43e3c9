//! History normalization
//!
//! Turns the caller's raw measurement list into the time-ordered series the
//! forecasters consume.

use chrono::{Datelike, NaiveDate};
use pipelife_spi::{Measurement, NormalizedSeries, PredictionError, Result, SeriesPoint};

/// First day of the pipe's production year
///
/// The production year is `reference.year() - age_years`; measurements taken
/// before 1 January of that year predate the pipe and are discarded.
pub fn production_date(age_years: u32, reference: NaiveDate) -> Result<NaiveDate> {
    let year = i32::try_from(age_years)
        .ok()
        .and_then(|age| reference.year().checked_sub(age))
        .ok_or_else(|| {
            PredictionError::InvalidData(format!("age of {} years is out of range", age_years))
        })?;

    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        PredictionError::InvalidData(format!("production year {} is not a valid date", year))
    })
}

/// Filter and sort measurements into a [`NormalizedSeries`]
///
/// Measurements dated before the production date are dropped, the rest are
/// sorted by date. The sort is stable and duplicates are kept.
pub fn normalize_history(
    measurements: &[Measurement],
    age_years: u32,
    reference: NaiveDate,
) -> Result<NormalizedSeries> {
    if measurements.is_empty() {
        return Ok(NormalizedSeries::default());
    }

    let produced = production_date(age_years, reference)?;

    let mut points: Vec<SeriesPoint> = measurements
        .iter()
        .filter(|m| m.date >= produced)
        .map(|m| SeriesPoint {
            date: m.date,
            value: m.value,
        })
        .collect();
    points.sort_by_key(|p| p.date);

    Ok(NormalizedSeries::from_sorted(points))
}
