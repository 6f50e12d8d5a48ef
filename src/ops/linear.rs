//! Structural kernels: multiply, transpose, elementwise, concat and slice.
//!
//! Backward kernels accumulate into zero-initialized buffers supplied by the
//! graph, one per operand.

use crate::graph::SliceBounds;
use crate::tensor::{Element, Shape};

/// `out[i][j] = dot(b.row(i), a.row(j))`; both operands share `width`.
pub fn mul_forward<T: Element>(a: &[T], b: &[T], width: usize, out: &mut [T]) {
    T::dot_rows(a, b, width, out);
}

pub fn mul_backward<T: Element>(
    a: &[T],
    b: &[T],
    width: usize,
    grad: &[T],
    grad_a: &mut [T],
    grad_b: &mut [T],
) {
    T::dot_rows_backward(a, b, width, grad, grad_a, grad_b);
}

/// Transposes `input` of shape `shape` into `out` of shape `shape.transposed()`.
pub fn transpose_forward<T: Element>(input: &[T], shape: Shape, out: &mut [T]) {
    let (width, count) = (shape.width, shape.count);
    for r in 0..count {
        for c in 0..width {
            out[c * count + r] = input[r * width + c];
        }
    }
}

/// `shape` is the operand shape, not the output shape.
pub fn transpose_backward<T: Element>(grad: &[T], shape: Shape, grad_input: &mut [T]) {
    let (width, count) = (shape.width, shape.count);
    for r in 0..count {
        for c in 0..width {
            grad_input[r * width + c] += grad[c * count + r];
        }
    }
}

pub fn add_forward<T: Element>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x + y;
    }
}

pub fn add_backward<T: Element>(grad: &[T], grad_a: &mut [T], grad_b: &mut [T]) {
    for ((da, db), &g) in grad_a.iter_mut().zip(grad_b.iter_mut()).zip(grad) {
        *da += g;
        *db += g;
    }
}

pub fn hadamard_forward<T: Element>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x * y;
    }
}

pub fn hadamard_backward<T: Element>(
    a: &[T],
    b: &[T],
    grad: &[T],
    grad_a: &mut [T],
    grad_b: &mut [T],
) {
    for i in 0..grad.len() {
        grad_a[i] += grad[i] * b[i];
        grad_b[i] += grad[i] * a[i];
    }
}

/// Appends each row of `b` to the matching row of `a`.
pub fn concat_forward<T: Element>(a: &[T], a_width: usize, b: &[T], b_width: usize, out: &mut [T]) {
    let rows = a.chunks_exact(a_width).zip(b.chunks_exact(b_width));
    for ((ar, br), or) in rows.zip(out.chunks_exact_mut(a_width + b_width)) {
        or[..a_width].copy_from_slice(ar);
        or[a_width..].copy_from_slice(br);
    }
}

pub fn concat_backward<T: Element>(
    grad: &[T],
    a_width: usize,
    b_width: usize,
    grad_a: &mut [T],
    grad_b: &mut [T],
) {
    let rows = grad_a.chunks_exact_mut(a_width).zip(grad_b.chunks_exact_mut(b_width));
    for ((da, db), g) in rows.zip(grad.chunks_exact(a_width + b_width)) {
        for (d, &x) in da.iter_mut().zip(&g[..a_width]) {
            *d += x;
        }
        for (d, &x) in db.iter_mut().zip(&g[a_width..]) {
            *d += x;
        }
    }
}

pub fn slice_forward<T: Element>(input: &[T], bounds: SliceBounds, out: &mut [T]) {
    out.copy_from_slice(&input[bounds.begin..bounds.end]);
}

/// `grad_range` covers only `[bounds.begin, bounds.end)` of the operand.
pub fn slice_backward<T: Element>(grad: &[T], grad_range: &mut [T]) {
    for (d, &g) in grad_range.iter_mut().zip(grad) {
        *d += g;
    }
}
