//! Numeric element types stored in tensors.
//!
//! The engine runs on `f32` for the real-valued experiments, `f64` for
//! gradient checking, and `Complex64` (complex128) for the complex
//! spherical-softmax experiments. Everything an operator or the optimizer
//! needs from a number lives on [`Element`].

use num_complex::Complex64;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A scalar that can flow through the expression graph.
pub trait Element:
    Copy
    + Debug
    + PartialEq
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Send
    + Sync
    + 'static
{
    /// Tag written into weight files.
    const TAG: u8;
    /// Encoded size in bytes.
    const BYTES: usize;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_f64(value: f64) -> Self;

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sqrt(self) -> Self;

    /// Real part, used to order elements (row maxima, attention ranking).
    fn re(self) -> f64;
    /// Value reported for a cost: the number itself for reals, the modulus
    /// for complex numbers.
    fn report(self) -> f64;
    fn is_finite(self) -> bool;

    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;

    /// `out[i * a_rows + j] = dot(b.row(i), a.row(j))` for rows of length `width`.
    fn dot_rows(a: &[Self], b: &[Self], width: usize, out: &mut [Self]) {
        for (bv, row) in b.chunks_exact(width).zip(out.chunks_mut(a.len() / width)) {
            for (av, cell) in a.chunks_exact(width).zip(row.iter_mut()) {
                let mut sum = Self::zero();
                for (&x, &y) in av.iter().zip(bv) {
                    sum += x * y;
                }
                *cell = sum;
            }
        }
    }

    /// Accumulates the gradients of [`Element::dot_rows`] into `grad_a` and `grad_b`.
    fn dot_rows_backward(
        a: &[Self],
        b: &[Self],
        width: usize,
        grad: &[Self],
        grad_a: &mut [Self],
        grad_b: &mut [Self],
    ) {
        let a_rows = a.len() / width;
        for (i, (bv, bd)) in b
            .chunks_exact(width)
            .zip(grad_b.chunks_mut(width))
            .enumerate()
        {
            for (j, (av, ad)) in a
                .chunks_exact(width)
                .zip(grad_a.chunks_mut(width))
                .enumerate()
            {
                let g = grad[i * a_rows + j];
                for k in 0..width {
                    ad[k] += g * bv[k];
                    bd[k] += g * av[k];
                }
            }
        }
    }
}

impl Element for f32 {
    const TAG: u8 = 1;
    const BYTES: usize = 4;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn exp(self) -> Self {
        // Exponentiate in double precision before narrowing.
        f64::exp(self as f64) as f32
    }

    fn ln(self) -> Self {
        f64::ln(self as f64) as f32
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn re(self) -> f64 {
        self as f64
    }

    fn report(self) -> f64 {
        self as f64
    }

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        f32::from_le_bytes(buf)
    }

    #[cfg(feature = "blas")]
    fn dot_rows(a: &[Self], b: &[Self], width: usize, out: &mut [Self]) {
        let (a_rows, b_rows) = (a.len() / width, b.len() / width);
        crate::ops::gemm::sgemm_wrapper(
            b_rows, a_rows, width, b, width, a, width, out, a_rows, false, true, 1.0, 0.0,
        );
    }

    #[cfg(feature = "blas")]
    fn dot_rows_backward(
        a: &[Self],
        b: &[Self],
        width: usize,
        grad: &[Self],
        grad_a: &mut [Self],
        grad_b: &mut [Self],
    ) {
        let (a_rows, b_rows) = (a.len() / width, b.len() / width);
        // grad_a += gradᵀ · b
        crate::ops::gemm::sgemm_wrapper(
            a_rows, width, b_rows, grad, a_rows, b, width, grad_a, width, true, false, 1.0, 1.0,
        );
        // grad_b += grad · a
        crate::ops::gemm::sgemm_wrapper(
            b_rows, width, a_rows, grad, a_rows, a, width, grad_b, width, false, false, 1.0, 1.0,
        );
    }
}

impl Element for f64 {
    const TAG: u8 = 2;
    const BYTES: usize = 8;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn re(self) -> f64 {
        self
    }

    fn report(self) -> f64 {
        self
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(buf)
    }
}

impl Element for Complex64 {
    const TAG: u8 = 3;
    const BYTES: usize = 16;

    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }

    fn one() -> Self {
        Complex64::new(1.0, 0.0)
    }

    fn from_f64(value: f64) -> Self {
        Complex64::new(value, 0.0)
    }

    fn exp(self) -> Self {
        Complex64::exp(self)
    }

    fn ln(self) -> Self {
        Complex64::ln(self)
    }

    fn sqrt(self) -> Self {
        Complex64::sqrt(self)
    }

    fn re(self) -> f64 {
        self.re
    }

    fn report(self) -> f64 {
        self.norm()
    }

    fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.re.to_le_bytes());
        out.extend_from_slice(&self.im.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Complex64::new(f64::read_le(&bytes[..8]), f64::read_le(&bytes[8..16]))
    }
}
