//! BLAS-backed matrix multiply for `f32` tensors.

use cblas::{sgemm, Layout, Transpose};

/// Row-major `c = alpha·op(a)·op(b) + beta·c`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sgemm_wrapper(
    m: usize,
    n: usize,
    k: usize,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    c: &mut [f32],
    ldc: usize,
    transpose_a: bool,
    transpose_b: bool,
    alpha: f32,
    beta: f32,
) {
    let trans_a = if transpose_a {
        Transpose::Ordinary
    } else {
        Transpose::None
    };
    let trans_b = if transpose_b {
        Transpose::Ordinary
    } else {
        Transpose::None
    };

    // SAFETY: slice lengths match the dimensions computed by the callers in
    // `tensor::element`, which derive m, n, k from the same buffers.
    unsafe {
        sgemm(
            Layout::RowMajor,
            trans_a,
            trans_b,
            m as i32,
            n as i32,
            k as i32,
            alpha,
            a,
            lda as i32,
            b,
            ldb as i32,
            beta,
            c,
            ldc as i32,
        );
    }
}
