//! Softmax-family nonlinearities.
//!
//! Both operators normalize each row of `width` elements onto the probability
//! simplex:
//!
//! - [`Softmax`]: `exp(x - max·S) / Σ exp(x - max·S)`, with `S = 1 - 1e-300`
//! - [`SphericalSoftmax`]: `(x² + ε) / Σ (x² + ε)`, no exponentials
//!
//! Backward rules use only the diagonal of each Jacobian. For the exponential
//! softmax that is `c·(1 - c)`, for the spherical one `2x·(Σ - x² - ε) / Σ²`.
//! Cross terms between elements of a row are dropped.

use super::UnaryOp;
use crate::tensor::{Element, Shape};
use serde::Deserialize;

/// Scale applied to the row maximum before it is subtracted.
pub const SOFTMAX_SCALE: f64 = 1.0 - 1e-300;

/// Numerically stable exponential softmax over rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Softmax;

impl<T: Element> UnaryOp<T> for Softmax {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn forward(&self, input: &[T], shape: Shape, output: &mut [T]) {
        let width = shape.width;
        for (row, out) in input.chunks_exact(width).zip(output.chunks_exact_mut(width)) {
            let mut max = f64::NEG_INFINITY;
            for &x in row {
                if x.re() > max {
                    max = x.re();
                }
            }
            let shift = T::from_f64(max * SOFTMAX_SCALE);

            let mut sum = T::zero();
            for (o, &x) in out.iter_mut().zip(row) {
                *o = (x - shift).exp();
                sum += *o;
            }
            for o in out.iter_mut() {
                *o = *o / sum;
            }
        }
    }

    fn backward(
        &self,
        _input: &[T],
        output: &[T],
        grad_output: &[T],
        _shape: Shape,
        grad_input: &mut [T],
    ) {
        for ((gi, &g), &c) in grad_input.iter_mut().zip(grad_output).zip(output) {
            *gi += g * (c - c * c);
        }
    }
}

/// Square-based softmax over rows, real or complex.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalSoftmax {
    /// Offset added to every squared element.
    pub epsilon: f64,
}

impl SphericalSoftmax {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl<T: Element> UnaryOp<T> for SphericalSoftmax {
    fn name(&self) -> &'static str {
        "spherical_softmax"
    }

    fn forward(&self, input: &[T], shape: Shape, output: &mut [T]) {
        let width = shape.width;
        let epsilon = T::from_f64(self.epsilon);
        for (row, out) in input.chunks_exact(width).zip(output.chunks_exact_mut(width)) {
            let mut sum = T::zero();
            for (o, &x) in out.iter_mut().zip(row) {
                *o = x * x + epsilon;
                sum += *o;
            }
            for o in out.iter_mut() {
                *o = *o / sum;
            }
        }
    }

    fn backward(
        &self,
        input: &[T],
        _output: &[T],
        grad_output: &[T],
        shape: Shape,
        grad_input: &mut [T],
    ) {
        let width = shape.width;
        let epsilon = T::from_f64(self.epsilon);
        let two = T::from_f64(2.0);
        for ((row, g), gi) in input
            .chunks_exact(width)
            .zip(grad_output.chunks_exact(width))
            .zip(grad_input.chunks_exact_mut(width))
        {
            let mut sum = T::zero();
            for &x in row {
                sum += x * x + epsilon;
            }
            let denominator = sum * sum;
            for ((d, &gk), &x) in gi.iter_mut().zip(g).zip(row) {
                *d += gk * two * x * (sum - (x * x + epsilon)) / denominator;
            }
        }
    }
}

/// Which softmax an experiment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftmaxKind {
    Exponential,
    Spherical,
}

impl SoftmaxKind {
    /// Boxed operator for this kind.
    pub fn op<T: Element>(self) -> Box<dyn UnaryOp<T>> {
        match self {
            SoftmaxKind::Exponential => Box::new(Softmax),
            SoftmaxKind::Spherical => Box::new(SphericalSoftmax::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let input = [1.0f64, 2.0, 3.0, -1.0, 0.0, -2.0];
        let mut output = [0.0f64; 6];
        Softmax.forward(&input, Shape::new(3, 2), &mut output);

        for row in output.chunks(3) {
            assert_relative_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
        // Second row has its maximum exactly at zero.
        assert!(output[4] > output[3] && output[3] > output[5]);
    }

    #[test]
    fn test_spherical_softmax_matches_squares() {
        let input = [1.0f64, -2.0];
        let mut output = [0.0f64; 2];
        SphericalSoftmax::default().forward(&input, Shape::new(2, 1), &mut output);
        assert_relative_eq!(output[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(output[1], 0.8, epsilon = 1e-12);
    }
}
