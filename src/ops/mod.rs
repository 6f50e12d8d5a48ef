//! Primitive operators of the expression graph.
//!
//! Every operator owns both halves of its rule: a forward kernel computing the
//! output from the operands, and a backward kernel accumulating the incoming
//! gradient into the operands' gradient buffers. The graph only schedules
//! kernels; it never differentiates anything itself.
//!
//! Structural operators (multiply, transpose, concatenation, slicing,
//! reductions) are fixed kernels in [`linear`] and [`reduce`]. Elementwise
//! nonlinearities go through the [`UnaryOp`] trait, which is also the hook
//! for user-defined operators.

#[cfg(feature = "blas")]
pub mod gemm;
pub mod linear;
pub mod reduce;
pub mod softmax;

pub use softmax::{Softmax, SoftmaxKind, SphericalSoftmax, SOFTMAX_SCALE};

use crate::error::Result;
use crate::tensor::{Element, Shape};

/// A single-operand differentiable operator.
///
/// Implementations provide a forward rule and its Jacobian-vector product.
/// Both receive whole tensors so that row-wise operators (the softmax family)
/// can normalize per row.
///
/// # Example
///
/// ```
/// use occam::ops::UnaryOp;
/// use occam::tensor::Shape;
///
/// struct Square;
///
/// impl UnaryOp<f64> for Square {
///     fn name(&self) -> &'static str {
///         "square"
///     }
///
///     fn forward(&self, input: &[f64], _shape: Shape, output: &mut [f64]) {
///         for (o, &x) in output.iter_mut().zip(input) {
///             *o = x * x;
///         }
///     }
///
///     fn backward(
///         &self,
///         input: &[f64],
///         _output: &[f64],
///         grad_output: &[f64],
///         _shape: Shape,
///         grad_input: &mut [f64],
///     ) {
///         for ((gi, &g), &x) in grad_input.iter_mut().zip(grad_output).zip(input) {
///             *gi += g * 2.0 * x;
///         }
///     }
/// }
/// ```
pub trait UnaryOp<T: Element> {
    /// Short name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Output shape for an operand of shape `input`. Defaults to the same shape.
    fn output_shape(&self, input: Shape) -> Result<Shape> {
        Ok(input)
    }

    /// Computes `output` from `input`; `shape` is the operand shape.
    fn forward(&self, input: &[T], shape: Shape, output: &mut [T]);

    /// Accumulates `grad_output` pulled back through the operator into `grad_input`.
    ///
    /// `grad_input` must be added to, never overwritten.
    fn backward(
        &self,
        input: &[T],
        output: &[T],
        grad_output: &[T],
        shape: Shape,
        grad_input: &mut [T],
    );
}
