//! Single-layer LSTM with a linear read-out
//!
//! Parameters are stored in one flat vector so the optimizer can treat them
//! uniformly. Layout, for hidden size `H` and gate order input, forget,
//! cell, output:
//!
//! | block      | length  |
//! |------------|---------|
//! | `w_ih`     | `4H`    |
//! | `w_hh`     | `4H·H` (row-major, one row per gate unit) |
//! | `bias`     | `4H`    |
//! | `w_out`    | `H`     |
//! | `b_out`    | `1`     |

use pipelife_spi::{PredictionError, Result, SequenceModel};
use rand::Rng;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Activations of one time step, kept for back-propagation
#[derive(Debug, Clone)]
pub struct StepCache {
    x: f64,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    input: Vec<f64>,
    forget: Vec<f64>,
    cell: Vec<f64>,
    output: Vec<f64>,
    tanh_c: Vec<f64>,
    h: Vec<f64>,
    c: Vec<f64>,
}

/// LSTM over scalar inputs predicting the next scalar
#[derive(Debug, Clone)]
pub struct LstmNetwork {
    hidden: usize,
    params: Vec<f64>,
}

impl LstmNetwork {
    /// Initialise every weight from `U(-1/√H, 1/√H)`
    pub fn new<R: Rng + ?Sized>(hidden: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (hidden as f64).sqrt();
        let count = Self::param_count_for(hidden);
        let params = (0..count).map(|_| rng.gen_range(-bound..bound)).collect();
        Self { hidden, params }
    }

    fn param_count_for(hidden: usize) -> usize {
        4 * hidden + 4 * hidden * hidden + 4 * hidden + hidden + 1
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    fn w_hh_offset(&self) -> usize {
        4 * self.hidden
    }

    fn bias_offset(&self) -> usize {
        self.w_hh_offset() + 4 * self.hidden * self.hidden
    }

    fn w_out_offset(&self) -> usize {
        self.bias_offset() + 4 * self.hidden
    }

    fn b_out_offset(&self) -> usize {
        self.w_out_offset() + self.hidden
    }

    fn step(&self, x: f64, h_prev: &[f64], c_prev: &[f64]) -> StepCache {
        let h = self.hidden;
        let w_ih = &self.params[..4 * h];
        let w_hh = &self.params[self.w_hh_offset()..self.bias_offset()];
        let bias = &self.params[self.bias_offset()..self.w_out_offset()];

        let z: Vec<f64> = (0..4 * h)
            .map(|r| {
                let recurrent: f64 = w_hh[r * h..(r + 1) * h]
                    .iter()
                    .zip(h_prev)
                    .map(|(w, hp)| w * hp)
                    .sum();
                w_ih[r] * x + recurrent + bias[r]
            })
            .collect();

        let input: Vec<f64> = z[..h].iter().map(|&v| sigmoid(v)).collect();
        let forget: Vec<f64> = z[h..2 * h].iter().map(|&v| sigmoid(v)).collect();
        let cell: Vec<f64> = z[2 * h..3 * h].iter().map(|v| v.tanh()).collect();
        let output: Vec<f64> = z[3 * h..].iter().map(|&v| sigmoid(v)).collect();

        let c: Vec<f64> = (0..h)
            .map(|k| forget[k] * c_prev[k] + input[k] * cell[k])
            .collect();
        let tanh_c: Vec<f64> = c.iter().map(|v| v.tanh()).collect();
        let h_next: Vec<f64> = (0..h).map(|k| output[k] * tanh_c[k]).collect();

        StepCache {
            x,
            h_prev: h_prev.to_vec(),
            c_prev: c_prev.to_vec(),
            input,
            forget,
            cell,
            output,
            tanh_c,
            h: h_next,
            c,
        }
    }

    fn read_out(&self, h: &[f64]) -> f64 {
        let w_out = &self.params[self.w_out_offset()..self.b_out_offset()];
        let dot: f64 = w_out.iter().zip(h).map(|(w, v)| w * v).sum();
        dot + self.params[self.b_out_offset()]
    }

    /// Run the window and return the prediction with per-step activations
    pub fn forward_trace(&self, window: &[f64]) -> (f64, Vec<StepCache>) {
        let mut h = vec![0.0; self.hidden];
        let mut c = vec![0.0; self.hidden];
        let mut trace = Vec::with_capacity(window.len());

        for &x in window {
            let cache = self.step(x, &h, &c);
            h.clone_from(&cache.h);
            c.clone_from(&cache.c);
            trace.push(cache);
        }

        (self.read_out(&h), trace)
    }

    pub fn forward(&self, window: &[f64]) -> f64 {
        self.forward_trace(window).0
    }

    /// Accumulate into `grads` the gradient of the loss given `dy = dL/dŷ`
    pub fn backward(&self, trace: &[StepCache], dy: f64, grads: &mut [f64]) {
        let h = self.hidden;
        let Some(last) = trace.last() else {
            return;
        };

        let w_hh = self.w_hh_offset();
        let bias = self.bias_offset();
        let w_out = self.w_out_offset();

        for k in 0..h {
            grads[w_out + k] += dy * last.h[k];
        }
        grads[self.b_out_offset()] += dy;

        let mut dh: Vec<f64> = self.params[w_out..w_out + h]
            .iter()
            .map(|w| w * dy)
            .collect();
        let mut dc = vec![0.0; h];
        let mut dz = vec![0.0; 4 * h];

        for step in trace.iter().rev() {
            for k in 0..h {
                let d_output = dh[k] * step.tanh_c[k];
                let dc_k = dc[k] + dh[k] * step.output[k] * (1.0 - step.tanh_c[k].powi(2));

                let d_input = dc_k * step.cell[k];
                let d_cell = dc_k * step.input[k];
                let d_forget = dc_k * step.c_prev[k];

                dz[k] = d_input * step.input[k] * (1.0 - step.input[k]);
                dz[h + k] = d_forget * step.forget[k] * (1.0 - step.forget[k]);
                dz[2 * h + k] = d_cell * (1.0 - step.cell[k].powi(2));
                dz[3 * h + k] = d_output * step.output[k] * (1.0 - step.output[k]);

                dc[k] = dc_k * step.forget[k];
            }

            for (r, &g) in dz.iter().enumerate() {
                grads[r] += g * step.x;
                grads[bias + r] += g;
                let row = w_hh + r * h;
                for (k, hp) in step.h_prev.iter().enumerate() {
                    grads[row + k] += g * hp;
                }
            }

            for (k, d) in dh.iter_mut().enumerate() {
                *d = dz
                    .iter()
                    .enumerate()
                    .map(|(r, g)| self.params[w_hh + r * h + k] * g)
                    .sum();
            }
        }
    }
}

impl SequenceModel for LstmNetwork {
    fn predict_next(&self, window: &[f64]) -> Result<f64> {
        if window.is_empty() {
            return Err(PredictionError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let y = self.forward(window);
        if !y.is_finite() {
            return Err(PredictionError::NumericalError(
                "non-finite sequence prediction".to_string(),
            ));
        }
        Ok(y)
    }
}
