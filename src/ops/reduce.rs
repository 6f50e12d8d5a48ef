//! Entropy, cross-entropy and scalar reductions.
//!
//! Entropy and cross-entropy reduce each row of `width` elements to one
//! value, so a `[width, count]` operand yields a `[1, count]` result.

use crate::tensor::Element;

/// `out[r] = -Σ p ln p` over row `r`.
pub fn entropy_forward<T: Element>(p: &[T], width: usize, out: &mut [T]) {
    for (row, o) in p.chunks_exact(width).zip(out.iter_mut()) {
        let mut sum = T::zero();
        for &x in row {
            sum += x * x.ln();
        }
        *o = -sum;
    }
}

pub fn entropy_backward<T: Element>(p: &[T], width: usize, grad: &[T], grad_p: &mut [T]) {
    for ((row, d), &g) in p
        .chunks_exact(width)
        .zip(grad_p.chunks_exact_mut(width))
        .zip(grad)
    {
        for (dk, &x) in d.iter_mut().zip(row) {
            *dk -= g * (x.ln() + T::one());
        }
    }
}

/// `out[r] = -Σ t ln p` over row `r`.
pub fn cross_entropy_forward<T: Element>(p: &[T], target: &[T], width: usize, out: &mut [T]) {
    for ((row, trow), o) in p
        .chunks_exact(width)
        .zip(target.chunks_exact(width))
        .zip(out.iter_mut())
    {
        let mut sum = T::zero();
        for (&x, &t) in row.iter().zip(trow) {
            sum += t * x.ln();
        }
        *o = -sum;
    }
}

pub fn cross_entropy_backward<T: Element>(
    p: &[T],
    target: &[T],
    width: usize,
    grad: &[T],
    grad_p: &mut [T],
    grad_target: &mut [T],
) {
    for (r, &g) in grad.iter().enumerate() {
        for k in r * width..(r + 1) * width {
            grad_p[k] -= g * target[k] / p[k];
            grad_target[k] -= g * p[k].ln();
        }
    }
}

pub fn sum_forward<T: Element>(input: &[T]) -> T {
    let mut sum = T::zero();
    for &x in input {
        sum += x;
    }
    sum
}

pub fn sum_backward<T: Element>(grad: T, grad_input: &mut [T]) {
    for d in grad_input.iter_mut() {
        *d += grad;
    }
}

pub fn avg_forward<T: Element>(input: &[T]) -> T {
    sum_forward(input) / T::from_f64(input.len() as f64)
}

pub fn avg_backward<T: Element>(grad: T, grad_input: &mut [T]) {
    let share = grad / T::from_f64(grad_input.len() as f64);
    sum_backward(share, grad_input);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_row_entropy_is_log_width() {
        let p = [0.25f64; 8];
        let mut out = [0.0f64; 2];
        entropy_forward(&p, 4, &mut out);
        assert_relative_eq!(out[0], 4.0f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(out[1], 4.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_avg_backward_divides_by_count() {
        let mut grad = [0.0f64; 4];
        avg_backward(1.0, &mut grad);
        assert_eq!(grad, [0.25; 4]);
    }
}
