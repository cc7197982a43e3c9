//! Changepoint-aware trend forecasting
//!
//! Fits an additive piecewise-linear trend to irregularly spaced
//! observations. Candidate changepoints sit at evenly spaced observations in
//! the early part of the history; slope changes at those points carry a
//! Laplace prior, so the fit is an L1-penalised least-squares problem. With a
//! small prior scale most slope changes shrink to zero and short, noisy
//! histories extrapolate as a near-straight line. No periodic components are
//! modelled.

use pipelife_spi::{
    ForecastFailure, ForecastOutcome, ForecastPoints, Forecaster, NormalizedSeries,
    PredictionError, PredictorConfig, Result, TrendConfig, TrendModel, HORIZON_YEARS,
};

/// Piecewise-linear trend with automatically placed changepoints
///
/// Internally time is rescaled to `[0, 1]` over the observed span and values
/// are divided by their largest magnitude.
#[derive(Debug, Clone)]
pub struct ChangepointTrend {
    config: TrendConfig,
    origin: f64,
    span: f64,
    value_scale: f64,
    offset: f64,
    slope: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    iterations: usize,
    converged: bool,
    fitted: bool,
}

impl ChangepointTrend {
    pub fn new(config: TrendConfig) -> Self {
        Self {
            config,
            origin: 0.0,
            span: 1.0,
            value_scale: 1.0,
            offset: 0.0,
            slope: 0.0,
            changepoints: Vec::new(),
            deltas: Vec::new(),
            iterations: 0,
            converged: false,
            fitted: false,
        }
    }

    /// Changepoint locations in elapsed days
    pub fn changepoints(&self) -> Vec<f64> {
        self.changepoints
            .iter()
            .map(|c| self.origin + c * self.span)
            .collect()
    }

    /// Slope changes at each changepoint, in value units per day
    pub fn deltas(&self) -> Vec<f64> {
        self.deltas
            .iter()
            .map(|d| d * self.value_scale / self.span)
            .collect()
    }

    /// Slope at the end of the history, in value units per day
    pub fn final_slope(&self) -> f64 {
        (self.slope + self.deltas.iter().sum::<f64>()) * self.value_scale / self.span
    }

    /// Solver iterations used by the last fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the last fit met the tolerance before the iteration cap
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn scaled_value(&self, s: f64) -> f64 {
        let bends: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(c, d)| d * hinge(s, *c))
            .sum();
        self.offset + self.slope * s + bends
    }
}

fn hinge(s: f64, changepoint: f64) -> f64 {
    (s - changepoint).max(0.0)
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

/// Least-squares line `z ≈ m + k·s`, returned as `(m, k)`
fn fit_line(s: &[f64], z: &[f64]) -> Result<(f64, f64)> {
    let n = s.len() as f64;
    let mean_s = s.iter().sum::<f64>() / n;
    let mean_z = z.iter().sum::<f64>() / n;

    let sxx: f64 = s.iter().map(|x| (x - mean_s).powi(2)).sum();
    if sxx < 1e-12 {
        return Err(PredictionError::NumericalError(
            "Singular matrix in trend regression".to_string(),
        ));
    }
    let sxz: f64 = s
        .iter()
        .zip(z)
        .map(|(x, y)| (x - mean_s) * (y - mean_z))
        .sum();

    let k = sxz / sxx;
    Ok((mean_z - k * mean_s, k))
}

/// Evenly spaced changepoints within the first `range` of the history
///
/// Mirrors the usual placement: `floor(n * range)` leading observations are
/// eligible, at most `max_count` of them, never the first one.
pub fn place_changepoints(scaled_times: &[f64], max_count: usize, range: f64) -> Vec<f64> {
    let eligible = (scaled_times.len() as f64 * range).floor() as usize;
    let count = max_count.min(eligible.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last = (eligible - 1) as f64;
    (1..=count)
        .map(|j| {
            let idx = (j as f64 * last / count as f64).round() as usize;
            scaled_times[idx.min(scaled_times.len() - 1)]
        })
        .collect()
}

struct Solution {
    coefficients: Vec<f64>,
    iterations: usize,
    converged: bool,
}

/// Accelerated proximal gradient for `0.5·‖z − Uβ‖² + Σ wₖ·|βₖ|`
///
/// Momentum is reset whenever a step would raise the objective, so the
/// current iterate is always the best one seen. Stops once the objective
/// moves by no more than `tolerance` relative to its value.
struct ProximalSolver<'a> {
    basis: &'a [Vec<f64>],
    target: &'a [f64],
    penalties: &'a [f64],
}

impl ProximalSolver<'_> {
    fn residuals(&self, beta: &[f64]) -> Vec<f64> {
        let mut r = self.target.to_vec();
        for (column, &b) in self.basis.iter().zip(beta) {
            if b != 0.0 {
                for (ri, h) in r.iter_mut().zip(column) {
                    *ri -= b * h;
                }
            }
        }
        r
    }

    fn objective(&self, beta: &[f64]) -> f64 {
        let fit = 0.5 * self.residuals(beta).iter().map(|r| r * r).sum::<f64>();
        let penalty: f64 = beta
            .iter()
            .zip(self.penalties)
            .map(|(b, w)| w * b.abs())
            .sum();
        fit + penalty
    }

    fn gradient(&self, beta: &[f64]) -> Vec<f64> {
        let r = self.residuals(beta);
        self.basis
            .iter()
            .map(|column| -column.iter().zip(&r).map(|(h, ri)| h * ri).sum::<f64>())
            .collect()
    }

    /// Largest eigenvalue of `UᵀU` by power iteration, capped by the trace
    fn lipschitz(&self) -> f64 {
        let trace: f64 = self
            .basis
            .iter()
            .map(|column| column.iter().map(|h| h * h).sum::<f64>())
            .sum();
        let p = self.basis.len();
        let mut v = vec![1.0 / (p as f64).sqrt(); p];
        let mut estimate = trace;

        for _ in 0..100 {
            let mut uv = vec![0.0; self.target.len()];
            for (column, &vk) in self.basis.iter().zip(&v) {
                for (u, h) in uv.iter_mut().zip(column) {
                    *u += vk * h;
                }
            }
            let w: Vec<f64> = self
                .basis
                .iter()
                .map(|column| column.iter().zip(&uv).map(|(h, u)| h * u).sum::<f64>())
                .collect();
            let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm < 1e-300 {
                break;
            }
            estimate = norm;
            v = w.iter().map(|x| x / norm).collect();
        }

        (estimate * 1.01).min(trace).max(1e-12)
    }

    fn solve(&self, start: Vec<f64>, max_iterations: usize, tolerance: f64) -> Solution {
        let mut step = 1.0 / self.lipschitz();
        let mut beta = start;
        let mut objective = self.objective(&beta);
        let mut momentum = beta.clone();
        let mut t: f64 = 1.0;
        let mut restarted = false;

        for iteration in 1..=max_iterations {
            let grad = self.gradient(&momentum);
            let candidate: Vec<f64> = momentum
                .iter()
                .zip(&grad)
                .zip(self.penalties)
                .map(|((m, g), w)| soft_threshold(m - step * g, step * w))
                .collect();
            let candidate_objective = self.objective(&candidate);
            let decrease = objective - candidate_objective;

            if decrease.abs() <= tolerance * objective.abs().max(1e-12) {
                if decrease > 0.0 {
                    beta = candidate;
                }
                return Solution {
                    coefficients: beta,
                    iterations: iteration,
                    converged: true,
                };
            }

            if !(decrease > 0.0) {
                // A plain step that still climbs means the step is too long.
                if restarted {
                    step *= 0.5;
                }
                restarted = true;
                momentum = beta.clone();
                t = 1.0;
                continue;
            }
            restarted = false;

            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let ratio = (t - 1.0) / t_next;
            momentum = candidate
                .iter()
                .zip(&beta)
                .map(|(c, b)| c + ratio * (c - b))
                .collect();
            t = t_next;
            beta = candidate;
            objective = candidate_objective;
        }

        Solution {
            coefficients: beta,
            iterations: max_iterations,
            converged: false,
        }
    }
}

impl TrendModel for ChangepointTrend {
    fn fit(&mut self, days: &[f64], values: &[f64]) -> Result<()> {
        if days.len() != values.len() {
            return Err(PredictionError::InvalidData(format!(
                "{} timestamps for {} values",
                days.len(),
                values.len()
            )));
        }
        if days.len() < 2 {
            return Err(PredictionError::InsufficientData {
                required: 2,
                actual: days.len(),
            });
        }
        if days.iter().chain(values).any(|x| !x.is_finite()) {
            return Err(PredictionError::InvalidData(
                "non-finite observation".to_string(),
            ));
        }

        self.fitted = false;

        let origin = days.iter().cloned().fold(f64::INFINITY, f64::min);
        let end = days.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = end - origin;
        if span <= 0.0 {
            return Err(PredictionError::NumericalError(
                "observations span zero days".to_string(),
            ));
        }

        let value_scale = match values.iter().map(|v| v.abs()).fold(0.0, f64::max) {
            m if m > 0.0 => m,
            _ => 1.0,
        };

        let s: Vec<f64> = days.iter().map(|d| (d - origin) / span).collect();
        let y: Vec<f64> = values.iter().map(|v| v / value_scale).collect();

        let changepoints = place_changepoints(
            &s,
            self.config.n_changepoints,
            self.config.changepoint_range,
        );
        // Intercept, time, then one hinge per changepoint. Columns are scaled
        // to unit norm so one gradient step length suits all of them.
        let mut columns: Vec<Vec<f64>> = vec![vec![1.0; s.len()], s.clone()];
        columns.extend(
            changepoints
                .iter()
                .map(|&c| s.iter().map(|&t| hinge(t, c)).collect::<Vec<f64>>()),
        );
        let norms: Vec<f64> = columns
            .iter()
            .map(|col| col.iter().map(|h| h * h).sum::<f64>().sqrt())
            .collect();
        let basis: Vec<Vec<f64>> = columns
            .iter()
            .zip(&norms)
            .map(|(col, &norm)| {
                if norm < 1e-12 {
                    vec![0.0; col.len()]
                } else {
                    col.iter().map(|h| h / norm).collect()
                }
            })
            .collect();

        // Start from the straight-line fit; its residual variance sets the
        // penalty as noise variance over prior scale.
        let (line_offset, line_slope) = fit_line(&s, &y)?;
        let noise_var = s
            .iter()
            .zip(&y)
            .map(|(t, v)| (v - line_offset - line_slope * t).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        let lambda = noise_var.max(1e-12) / self.config.changepoint_prior_scale;

        // `lambda * |delta|` expressed on the unit-norm coefficient
        let penalties: Vec<f64> = norms
            .iter()
            .enumerate()
            .map(|(k, &norm)| if k < 2 || norm < 1e-12 { 0.0 } else { lambda / norm })
            .collect();

        let mut start = vec![0.0; basis.len()];
        start[0] = line_offset * norms[0];
        start[1] = line_slope * norms[1];

        let solution = if changepoints.is_empty() {
            Solution {
                coefficients: start,
                iterations: 0,
                converged: true,
            }
        } else {
            ProximalSolver {
                basis: &basis,
                target: &y,
                penalties: &penalties,
            }
            .solve(start, self.config.max_iterations, self.config.tolerance)
        };

        if !solution.converged {
            tracing::debug!(
                iterations = solution.iterations,
                "trend fit reached the iteration cap, keeping the best iterate"
            );
        }

        let unscale = |k: usize| {
            if norms[k] < 1e-12 {
                0.0
            } else {
                solution.coefficients[k] / norms[k]
            }
        };
        let offset = unscale(0);
        let slope = unscale(1);
        let deltas: Vec<f64> = (2..basis.len()).map(unscale).collect();

        if !(offset.is_finite() && slope.is_finite() && deltas.iter().all(|d| d.is_finite())) {
            return Err(PredictionError::NumericalError(
                "trend coefficients diverged".to_string(),
            ));
        }

        self.origin = origin;
        self.span = span;
        self.value_scale = value_scale;
        self.offset = offset;
        self.slope = slope;
        self.changepoints = changepoints;
        self.deltas = deltas;
        self.iterations = solution.iterations;
        self.converged = solution.converged;
        self.fitted = true;
        Ok(())
    }

    fn predict_at(&self, days: &[f64]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(PredictionError::NotFitted);
        }

        let predictions: Vec<f64> = days
            .iter()
            .map(|d| self.scaled_value((d - self.origin) / self.span) * self.value_scale)
            .collect();

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(PredictionError::NumericalError(
                "non-finite trend prediction".to_string(),
            ));
        }
        Ok(predictions)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Trend forecaster over a normalized series
///
/// Future points are spaced `step_days` apart from the last observation and
/// keyed by `current_age + k` for `k = 1..=5`.
#[derive(Debug, Clone)]
pub struct TrendForecaster {
    config: TrendConfig,
    min_points: usize,
    floor: f64,
}

impl TrendForecaster {
    pub fn new(config: TrendConfig, min_points: usize, floor: f64) -> Self {
        Self {
            config,
            min_points,
            floor,
        }
    }

    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new(
            config.trend.clone(),
            config.tiers.trend_only_min_points,
            config.thresholds.min_thickness,
        )
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::from_config(&PredictorConfig::default())
    }
}

impl Forecaster for TrendForecaster {
    fn name(&self) -> &str {
        "trend"
    }

    fn forecast(&self, series: &NormalizedSeries, current_age: u32) -> ForecastOutcome {
        if series.len() < self.min_points.max(2) {
            return Err(ForecastFailure::InsufficientData {
                required: self.min_points.max(2),
                actual: series.len(),
            });
        }

        let days = series.elapsed_days();
        let values = series.values();

        let mut model = ChangepointTrend::new(self.config.clone());
        model
            .fit(&days, &values)
            .map_err(ForecastFailure::from_fit_error)?;

        tracing::debug!(
            points = series.len(),
            changepoints = model.changepoints.len(),
            iterations = model.iterations(),
            converged = model.converged(),
            "trend model fitted"
        );

        let last = days.last().copied().unwrap_or_default();
        let future: Vec<f64> = (1..=HORIZON_YEARS)
            .map(|k| last + (self.config.step_days * k as i64) as f64)
            .collect();

        let predicted = model
            .predict_at(&future)
            .map_err(ForecastFailure::from_predict_error)?;

        Ok((1..=HORIZON_YEARS)
            .zip(predicted)
            .map(|(k, thickness)| (current_age + k, thickness.max(self.floor)))
            .collect())
    }
}
