//! Failure probability and status classification

use pipelife_spi::{PipeStatus, RiskThresholds};

/// Uncertainties at or below this are treated as exact predictions
pub const MIN_UNCERTAINTY: f64 = 0.001;

/// Abramowitz-Stegun approximation of the error function
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Probability that the thickness falls below the critical threshold
///
/// The prediction is treated as normally distributed with `uncertainty` as
/// its standard deviation. Near-zero uncertainty degenerates to a step
/// function returning exactly `1.0` or `0.0`; otherwise the result is clamped
/// to `[0, max_failure_probability]`.
pub fn failure_probability(thickness: f64, uncertainty: f64, thresholds: &RiskThresholds) -> f64 {
    if uncertainty <= MIN_UNCERTAINTY {
        return if thickness < thresholds.critical_thickness {
            1.0
        } else {
            0.0
        };
    }

    let z = (thresholds.critical_thickness - thickness) / uncertainty;
    let prob = 0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2));
    prob.clamp(0.0, thresholds.max_failure_probability)
}

/// Status for an unrounded probability and thickness, Critical first
pub fn classify(probability: f64, thickness: f64, thresholds: &RiskThresholds) -> PipeStatus {
    if probability >= thresholds.critical_probability || thickness < thresholds.critical_thickness
    {
        PipeStatus::Critical
    } else if probability >= thresholds.warning_probability
        || thickness < thresholds.warning_thickness
    {
        PipeStatus::Warning
    } else {
        PipeStatus::Ok
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
