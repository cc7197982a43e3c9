//! Adam optimizer over a flat parameter vector

/// Adaptive moment estimation with bias correction
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Vec<f64>,
    v: Vec<f64>,
    t: i32,
}

impl Adam {
    pub fn new(n_params: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: vec![0.0; n_params],
            v: vec![0.0; n_params],
            t: 0,
        }
    }

    /// Apply one update in place
    pub fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(), self.m.len());

        self.t += 1;
        let correction1 = 1.0 - self.beta1.powi(self.t);
        let correction2 = 1.0 - self.beta2.powi(self.t);

        for (((p, g), m), v) in params
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(2, 0.01);
        let mut params = vec![1.0, -1.0];
        adam.step(&mut params, &[4.0, -0.5]);

        assert!((params[0] - 0.99).abs() < 1e-6);
        assert!((params[1] + 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::new(1, 0.1);
        let mut x = vec![3.0];
        for _ in 0..500 {
            let grad = vec![2.0 * (x[0] - 1.0)];
            adam.step(&mut x, &grad);
        }
        assert!((x[0] - 1.0).abs() < 5e-2);
    }
}
