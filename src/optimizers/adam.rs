//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction.

use crate::optimizers::{Optimizer, UpdateRanges};
use crate::tensor::{Element, ParameterSet};

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// parameter = parameter - α * m_hat / (√v_hat + ε)
/// ```
///
/// where t is the 1-based iteration count. The powers `β^t` are computed by
/// [`Adam::power`], which yields 0 instead of NaN or infinity, so a
/// pathological `t` can only make the correction factor 1.
///
/// For complex tensors the same formulas run in complex arithmetic: the
/// squared gradient is `g·g` and the square root is the principal branch.
/// The decay rates stay real.
///
/// # Fields
///
/// * `learning_rate` - The step size for parameter updates (α)
/// * `beta1` - Exponential decay rate for first moment estimates (typically 0.9)
/// * `beta2` - Exponential decay rate for second moment estimates (typically 0.999)
/// * `epsilon` - Small constant for numerical stability (typically 1e-8)
/// * `t` - Iterations performed so far
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: usize,
}

impl Default for Adam {
    /// Hyperparameters from the Adam paper: α = 0.001, β1 = 0.9, β2 = 0.999, ε = 1e-8.
    fn default() -> Self {
        Self::new(0.001, 0.9, 0.999, 1e-8)
    }
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use occam::optimizers::Adam;
    ///
    /// let optimizer = Adam::new(0.3, 0.9, 0.999, 1e-8);
    /// assert_eq!(optimizer.learning_rate(), 0.3);
    /// assert_eq!(optimizer.iteration(), 0);
    /// ```
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }

    /// Iterations performed so far; the next step uses `iteration() + 1`.
    pub fn iteration(&self) -> usize {
        self.t
    }

    /// Resumes counting from `t`.
    pub fn set_iteration(&mut self, t: usize) {
        self.t = t;
    }

    /// `beta^t`, or 0 when the result is NaN or infinite.
    pub fn power(beta: f64, t: usize) -> f64 {
        let y = beta.powf(t as f64);
        if y.is_finite() {
            y
        } else {
            0.0
        }
    }

    /// Bias correction denominators `(1 - β1^t, 1 - β2^t)` for iteration `t`.
    pub fn bias_corrections(&self, t: usize) -> (f64, f64) {
        (
            1.0 - Self::power(self.beta1, t),
            1.0 - Self::power(self.beta2, t),
        )
    }
}

impl<T: Element> Optimizer<T> for Adam {
    fn step_ranges(&mut self, params: &mut ParameterSet<T>, ranges: &UpdateRanges) {
        self.t = self.t.saturating_add(1);
        let (correction1, correction2) = self.bias_corrections(self.t);

        let one = T::one();
        let (beta1, beta2) = (T::from_f64(self.beta1), T::from_f64(self.beta2));
        let (correction1, correction2) = (T::from_f64(correction1), T::from_f64(correction2));
        let learning_rate = T::from_f64(self.learning_rate);
        let epsilon = T::from_f64(self.epsilon);

        for (tensor, moments) in params.trainable_mut() {
            for i in ranges.range_for(&tensor.name, tensor.len()) {
                let g = tensor.gradient[i];
                let m = beta1 * moments.m[i] + (one - beta1) * g;
                let v = beta2 * moments.v[i] + (one - beta2) * g * g;
                moments.m[i] = m;
                moments.v[i] = v;

                let m_hat = m / correction1;
                let v_hat = v / correction2;
                tensor.values[i] -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            }
        }
    }

    fn reset(&mut self, params: &mut ParameterSet<T>) {
        self.t = 0;
        params.reset_moments();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Shape;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        // With bias correction the first step is lr * g / |g|.
        let mut params = ParameterSet::<f64>::new();
        let w = params.add("w", Shape::new(2, 1)).unwrap();
        params.get_mut(w).gradient = vec![0.5, -2.0];

        let mut adam = Adam::new(0.01, 0.9, 0.999, 1e-8);
        adam.step(&mut params);

        assert_relative_eq!(params.get(w).values[0], -0.01, epsilon = 1e-6);
        assert_relative_eq!(params.get(w).values[1], 0.01, epsilon = 1e-6);
        assert_eq!(adam.iteration(), 1);
    }

    #[test]
    fn test_inputs_are_not_updated() {
        let mut params = ParameterSet::<f32>::new();
        let x = params.add_input("input", Shape::new(2, 1)).unwrap();
        params.get_mut(x).gradient = vec![1.0, 1.0];

        let mut adam = Adam::default();
        adam.step(&mut params);

        assert_eq!(params.get(x).values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_power_overflow_is_zero() {
        assert_eq!(Adam::power(1.5, 10_000), 0.0);
        assert_relative_eq!(Adam::power(0.9, 2), 0.81, epsilon = 1e-12);
    }

    #[test]
    fn test_iteration_counter_saturates() {
        let mut params = ParameterSet::<f64>::new();
        let w = params.add("w", Shape::new(1, 1)).unwrap();
        params.get_mut(w).gradient = vec![1.0];

        let mut adam = Adam::default();
        adam.set_iteration(usize::MAX);
        adam.step(&mut params);

        assert_eq!(adam.iteration(), usize::MAX);
        assert!(params.get(w).values[0].is_finite());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut params = ParameterSet::<f64>::new();
        let w = params.add("w", Shape::new(1, 1)).unwrap();
        params.get_mut(w).gradient = vec![1.0];

        let mut adam = Adam::default();
        adam.step(&mut params);
        Optimizer::<f64>::reset(&mut adam, &mut params);

        assert_eq!(adam.iteration(), 0);
        assert_eq!(params.moments(w).unwrap().m, vec![0.0]);
    }
}
