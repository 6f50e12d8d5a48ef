//! Expression graph and reverse-mode autodiff engine.
//!
//! A [`Graph`] is an arena of operator applications. Nodes are appended in
//! construction order and may only reference earlier nodes, so the arena
//! order is already a topological order: forward evaluation walks it front to
//! back, backward propagation walks it back to front.
//!
//! Leaves refer to entries of a [`ParameterSet`] that the caller owns. The
//! graph reads leaf values during [`Graph::forward`] and accumulates leaf
//! gradients into the set during [`Graph::backward`]; it never stores copies
//! of parameters.
//!
//! Shapes are checked when a node is built. Once a graph exists, evaluation
//! can only fail on bookkeeping errors (wrong parameter set, bad slice
//! bindings), never on arithmetic: NaN and infinity flow through untouched
//! and are left for the training loop to detect.
//!
//! # Example
//!
//! ```
//! use occam::graph::{Bindings, Graph};
//! use occam::tensor::{ParameterSet, Shape};
//!
//! let mut params = ParameterSet::<f64>::new();
//! let w = params.add("w", Shape::new(2, 1)).unwrap();
//! params.get_mut(w).values = vec![1.0, 2.0];
//!
//! let mut graph = Graph::new();
//! let leaf = graph.leaf(&params, w).unwrap();
//! let squared = graph.hadamard(leaf, leaf).unwrap();
//! let cost = graph.sum(squared).unwrap();
//!
//! let total = graph.gradient(cost, &mut params, &Bindings::new()).unwrap();
//! assert_eq!(total, 5.0);
//! assert_eq!(params.get(w).gradient, vec![2.0, 4.0]);
//! ```

use crate::error::{Error, Result};
use crate::ops::{linear, reduce, Softmax, SphericalSoftmax, UnaryOp};
use crate::tensor::{Element, ParamId, ParameterSet, Shape};

/// Handle to a node of a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Half-open range `[begin, end)` over the flat storage of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub begin: usize,
    pub end: usize,
}

impl SliceBounds {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// The `row`-th block of `width` elements.
    pub fn row(row: usize, width: usize) -> Self {
        Self {
            begin: row * width,
            end: (row + 1) * width,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-pass configuration handed to [`Graph::forward`].
///
/// Slice nodes keep the bounds they were built with unless a binding for
/// that node is supplied here. Bindings may move a slice but not resize it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    slices: Vec<(NodeId, SliceBounds)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Bindings::bind`].
    pub fn slice(mut self, node: NodeId, bounds: SliceBounds) -> Self {
        self.bind(node, bounds);
        self
    }

    pub fn bind(&mut self, node: NodeId, bounds: SliceBounds) {
        match self.slices.iter_mut().find(|(n, _)| *n == node) {
            Some(entry) => entry.1 = bounds,
            None => self.slices.push((node, bounds)),
        }
    }

    fn bounds(&self, node: NodeId) -> Option<SliceBounds> {
        self.slices
            .iter()
            .find(|(n, _)| *n == node)
            .map(|&(_, bounds)| bounds)
    }
}

enum Op<T: Element> {
    Leaf(ParamId),
    Mul(NodeId, NodeId),
    Transpose(NodeId),
    Add(NodeId, NodeId),
    Hadamard(NodeId, NodeId),
    Concat(NodeId, NodeId),
    /// `bounds` is the construction window; `last` is the window resolved by
    /// the most recent forward pass and is only read by backward.
    Slice {
        input: NodeId,
        bounds: SliceBounds,
        last: SliceBounds,
    },
    Entropy(NodeId),
    CrossEntropy {
        predicted: NodeId,
        target: NodeId,
    },
    Sum(NodeId),
    Avg(NodeId),
    Unary {
        input: NodeId,
        op: Box<dyn UnaryOp<T>>,
    },
}

struct Node<T: Element> {
    op: Op<T>,
    shape: Shape,
    /// Empty for leaves, whose buffers live in the parameter set.
    values: Vec<T>,
    gradient: Vec<T>,
}

/// Gradient flowing into `target[offset..offset + grad.len()]`.
struct Contribution<T> {
    target: NodeId,
    offset: usize,
    grad: Vec<T>,
}

impl<T> Contribution<T> {
    fn whole(target: NodeId, grad: Vec<T>) -> Self {
        Self {
            target,
            offset: 0,
            grad,
        }
    }
}

/// Arena of operator applications over one parameter set.
pub struct Graph<T: Element> {
    nodes: Vec<Node<T>>,
    evaluated: Option<NodeId>,
}

impl<T: Element> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Graph<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            evaluated: None,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Output shape of `id`.
    pub fn shape(&self, id: NodeId) -> Result<Shape> {
        self.node(id).map(|n| n.shape)
    }

    fn node(&self, id: NodeId) -> Result<&Node<T>> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id.0))
    }

    fn push(&mut self, op: Op<T>, shape: Shape) -> NodeId {
        let (values, gradient) = match op {
            Op::Leaf(_) => (Vec::new(), Vec::new()),
            _ => (vec![T::zero(); shape.len()], vec![T::zero(); shape.len()]),
        };
        self.nodes.push(Node {
            op,
            shape,
            values,
            gradient,
        });
        self.evaluated = None;
        NodeId(self.nodes.len() - 1)
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Leaf reading entry `id` of `params`.
    pub fn leaf(&mut self, params: &ParameterSet<T>, id: ParamId) -> Result<NodeId> {
        if !params.contains(id) {
            return Err(Error::UnknownParameter(format!("#{}", id.index())));
        }
        let shape = params.get(id).shape();
        Ok(self.push(Op::Leaf(id), shape))
    }

    /// Leaf reading the entry called `name`.
    pub fn param(&mut self, params: &ParameterSet<T>, name: &str) -> Result<NodeId> {
        let id = params.id(name)?;
        self.leaf(params, id)
    }

    /// Row-wise dot products: `[w, n] × [w, m] -> [n, m]`.
    ///
    /// Row `i` of the result holds the dot products of row `i` of `b` with
    /// every row of `a`.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (sa, sb) = (self.shape(a)?, self.shape(b)?);
        if sa.width != sb.width {
            return Err(Error::shape_mismatch("mul", sa, sb));
        }
        Ok(self.push(Op::Mul(a, b), Shape::new(sa.count, sb.count)))
    }

    pub fn transpose(&mut self, a: NodeId) -> Result<NodeId> {
        let shape = self.shape(a)?.transposed();
        Ok(self.push(Op::Transpose(a), shape))
    }

    /// Elementwise sum of two tensors of identical shape.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let shape = self.same_shape("add", a, b)?;
        Ok(self.push(Op::Add(a, b), shape))
    }

    /// Elementwise product of two tensors of identical shape.
    pub fn hadamard(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let shape = self.same_shape("hadamard", a, b)?;
        Ok(self.push(Op::Hadamard(a, b), shape))
    }

    fn same_shape(&self, op: &'static str, a: NodeId, b: NodeId) -> Result<Shape> {
        let (sa, sb) = (self.shape(a)?, self.shape(b)?);
        if sa != sb {
            return Err(Error::shape_mismatch(op, sa, sb));
        }
        Ok(sa)
    }

    /// Stacks `b` after `a` along the width axis; counts must match.
    pub fn concat(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (sa, sb) = (self.shape(a)?, self.shape(b)?);
        if sa.count != sb.count {
            return Err(Error::shape_mismatch("concat", sa, sb));
        }
        Ok(self.push(Op::Concat(a, b), Shape::new(sa.width + sb.width, sa.count)))
    }

    /// Flat sub-range of `a`, producing a `[bounds.len(), 1]` tensor.
    ///
    /// `bounds` is the default window; [`Bindings`] can move it per pass.
    pub fn slice(&mut self, a: NodeId, bounds: SliceBounds) -> Result<NodeId> {
        let len = self.shape(a)?.len();
        check_bounds(bounds, len, bounds.len())?;
        Ok(self.push(
            Op::Slice {
                input: a,
                bounds,
                last: bounds,
            },
            Shape::new(bounds.len(), 1),
        ))
    }

    /// Self-entropy of each row: `[w, n] -> [1, n]`.
    pub fn entropy(&mut self, a: NodeId) -> Result<NodeId> {
        let shape = self.shape(a)?;
        Ok(self.push(Op::Entropy(a), Shape::new(1, shape.count)))
    }

    /// Cross-entropy of each row of `predicted` against `target`.
    pub fn cross_entropy(&mut self, predicted: NodeId, target: NodeId) -> Result<NodeId> {
        let shape = self.same_shape("cross_entropy", predicted, target)?;
        Ok(self.push(
            Op::CrossEntropy { predicted, target },
            Shape::new(1, shape.count),
        ))
    }

    pub fn sum(&mut self, a: NodeId) -> Result<NodeId> {
        self.shape(a)?;
        Ok(self.push(Op::Sum(a), Shape::scalar()))
    }

    pub fn avg(&mut self, a: NodeId) -> Result<NodeId> {
        self.shape(a)?;
        Ok(self.push(Op::Avg(a), Shape::scalar()))
    }

    /// Applies a custom single-operand operator.
    pub fn unary(&mut self, a: NodeId, op: Box<dyn UnaryOp<T>>) -> Result<NodeId> {
        let shape = op.output_shape(self.shape(a)?)?;
        Ok(self.push(Op::Unary { input: a, op }, shape))
    }

    pub fn softmax(&mut self, a: NodeId) -> Result<NodeId> {
        self.unary(a, Box::new(Softmax))
    }

    pub fn spherical_softmax(&mut self, a: NodeId) -> Result<NodeId> {
        self.unary(a, Box::new(SphericalSoftmax::default()))
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Marks every node `root` depends on.
    fn reachable(&self, root: NodeId) -> Vec<bool> {
        let mut reach = vec![false; root.0 + 1];
        reach[root.0] = true;
        for i in (0..=root.0).rev() {
            if !reach[i] {
                continue;
            }
            for operand in operands(&self.nodes[i].op) {
                reach[operand.0] = true;
            }
        }
        reach
    }

    /// Evaluates every node `root` depends on and returns the root's values.
    ///
    /// Fails if a leaf no longer matches `params` or a slice binding is out of
    /// range. Non-finite results are returned as they are.
    pub fn forward<'a>(
        &'a mut self,
        root: NodeId,
        params: &'a ParameterSet<T>,
        bindings: &Bindings,
    ) -> Result<&'a [T]> {
        self.node(root)?;
        self.evaluated = None;
        let reach = self.reachable(root);

        for (i, _) in reach.iter().enumerate().filter(|&(_, &r)| r) {
            let (done, rest) = self.nodes.split_at_mut(i);
            let node = &mut rest[0];
            let values = |id: NodeId| operand_values(done, params, id);
            let shape_of = |id: NodeId| done[id.0].shape;

            match &mut node.op {
                Op::Leaf(pid) => {
                    if !params.contains(*pid) {
                        return Err(Error::UnknownParameter(format!("#{}", pid.index())));
                    }
                    let actual = params.get(*pid).shape();
                    if actual != node.shape {
                        return Err(Error::shape_mismatch("leaf", node.shape, actual));
                    }
                }
                Op::Mul(a, b) => {
                    linear::mul_forward(values(*a), values(*b), shape_of(*a).width, &mut node.values)
                }
                Op::Transpose(a) => {
                    linear::transpose_forward(values(*a), shape_of(*a), &mut node.values)
                }
                Op::Add(a, b) => linear::add_forward(values(*a), values(*b), &mut node.values),
                Op::Hadamard(a, b) => {
                    linear::hadamard_forward(values(*a), values(*b), &mut node.values)
                }
                Op::Concat(a, b) => linear::concat_forward(
                    values(*a),
                    shape_of(*a).width,
                    values(*b),
                    shape_of(*b).width,
                    &mut node.values,
                ),
                Op::Slice {
                    input,
                    bounds,
                    last,
                } => {
                    let bound = bindings.bounds(NodeId(i)).unwrap_or(*bounds);
                    check_bounds(bound, shape_of(*input).len(), node.shape.width)?;
                    *last = bound;
                    linear::slice_forward(values(*input), bound, &mut node.values)
                }
                Op::Entropy(a) => {
                    reduce::entropy_forward(values(*a), shape_of(*a).width, &mut node.values)
                }
                Op::CrossEntropy { predicted, target } => reduce::cross_entropy_forward(
                    values(*predicted),
                    values(*target),
                    shape_of(*predicted).width,
                    &mut node.values,
                ),
                Op::Sum(a) => node.values[0] = reduce::sum_forward(values(*a)),
                Op::Avg(a) => node.values[0] = reduce::avg_forward(values(*a)),
                Op::Unary { input, op } => {
                    op.forward(values(*input), shape_of(*input), &mut node.values)
                }
            }
        }

        self.evaluated = Some(root);
        Ok(operand_values(&self.nodes, params, root))
    }

    /// Values of `id` as computed by the last forward pass.
    pub fn values<'a>(&'a self, id: NodeId, params: &'a ParameterSet<T>) -> Result<&'a [T]> {
        self.node(id)?;
        if self.evaluated.is_none() {
            return Err(Error::NotEvaluated(id.0));
        }
        Ok(operand_values(&self.nodes, params, id))
    }

    /// Gradient accumulated at an interior node by the last backward pass.
    pub fn node_gradient(&self, id: NodeId) -> Result<&[T]> {
        Ok(&self.node(id)?.gradient)
    }

    /// Propagates a unit gradient from a scalar `root`.
    pub fn backward(&mut self, root: NodeId, params: &mut ParameterSet<T>) -> Result<()> {
        let len = self.shape(root)?.len();
        if len != 1 {
            return Err(Error::NonScalarRoot { len });
        }
        self.backward_with_seed(root, &[T::one()], params)
    }

    /// Propagates `seed` from `root` to every leaf it depends on.
    ///
    /// Interior gradients are reset first; leaf gradients in `params` are
    /// accumulated, so callers zero the set between iterations.
    pub fn backward_with_seed(
        &mut self,
        root: NodeId,
        seed: &[T],
        params: &mut ParameterSet<T>,
    ) -> Result<()> {
        let expected = self.shape(root)?.len();
        if self.evaluated != Some(root) {
            return Err(Error::NotEvaluated(root.0));
        }
        if seed.len() != expected {
            return Err(Error::SeedLength {
                expected,
                found: seed.len(),
            });
        }

        let reach = self.reachable(root);
        for (node, _) in self.nodes.iter_mut().zip(&reach).filter(|&(_, &r)| r) {
            node.gradient.iter_mut().for_each(|g| *g = T::zero());
        }
        self.accumulate(Contribution::whole(root, seed.to_vec()), params);

        for i in (0..=root.0).rev() {
            if !reach[i] {
                continue;
            }
            for contribution in self.contributions(i, params) {
                self.accumulate(contribution, params);
            }
        }
        Ok(())
    }

    /// Forward then backward from a scalar `root`; returns the cost.
    pub fn gradient(
        &mut self,
        root: NodeId,
        params: &mut ParameterSet<T>,
        bindings: &Bindings,
    ) -> Result<T> {
        let values = self.forward(root, params, bindings)?;
        if values.len() != 1 {
            return Err(Error::NonScalarRoot { len: values.len() });
        }
        let cost = values[0];
        self.backward(root, params)?;
        Ok(cost)
    }

    fn accumulate(&mut self, contribution: Contribution<T>, params: &mut ParameterSet<T>) {
        let Contribution {
            target,
            offset,
            grad,
        } = contribution;
        let node = &mut self.nodes[target.0];
        let buffer = match node.op {
            Op::Leaf(pid) => &mut params.get_mut(pid).gradient,
            _ => &mut node.gradient,
        };
        for (d, g) in buffer[offset..offset + grad.len()].iter_mut().zip(grad) {
            *d += g;
        }
    }

    /// Backward rule of node `i`, one contribution per operand.
    fn contributions(&self, i: usize, params: &ParameterSet<T>) -> Vec<Contribution<T>> {
        let node = &self.nodes[i];
        let grad = &node.gradient;
        let values = |id: NodeId| operand_values(&self.nodes, params, id);
        let shape_of = |id: NodeId| self.nodes[id.0].shape;
        let zeros = |id: NodeId| vec![T::zero(); shape_of(id).len()];

        match &node.op {
            Op::Leaf(_) => Vec::new(),
            Op::Mul(a, b) => {
                let (mut ga, mut gb) = (zeros(*a), zeros(*b));
                linear::mul_backward(
                    values(*a),
                    values(*b),
                    shape_of(*a).width,
                    grad,
                    &mut ga,
                    &mut gb,
                );
                vec![Contribution::whole(*a, ga), Contribution::whole(*b, gb)]
            }
            Op::Transpose(a) => {
                let mut ga = zeros(*a);
                linear::transpose_backward(grad, shape_of(*a), &mut ga);
                vec![Contribution::whole(*a, ga)]
            }
            Op::Add(a, b) => {
                let (mut ga, mut gb) = (zeros(*a), zeros(*b));
                linear::add_backward(grad, &mut ga, &mut gb);
                vec![Contribution::whole(*a, ga), Contribution::whole(*b, gb)]
            }
            Op::Hadamard(a, b) => {
                let (mut ga, mut gb) = (zeros(*a), zeros(*b));
                linear::hadamard_backward(values(*a), values(*b), grad, &mut ga, &mut gb);
                vec![Contribution::whole(*a, ga), Contribution::whole(*b, gb)]
            }
            Op::Concat(a, b) => {
                let (mut ga, mut gb) = (zeros(*a), zeros(*b));
                linear::concat_backward(
                    grad,
                    shape_of(*a).width,
                    shape_of(*b).width,
                    &mut ga,
                    &mut gb,
                );
                vec![Contribution::whole(*a, ga), Contribution::whole(*b, gb)]
            }
            Op::Slice { input, last, .. } => {
                let mut range = vec![T::zero(); last.len()];
                linear::slice_backward(grad, &mut range);
                vec![Contribution {
                    target: *input,
                    offset: last.begin,
                    grad: range,
                }]
            }
            Op::Entropy(a) => {
                let mut ga = zeros(*a);
                reduce::entropy_backward(values(*a), shape_of(*a).width, grad, &mut ga);
                vec![Contribution::whole(*a, ga)]
            }
            Op::CrossEntropy { predicted, target } => {
                let (mut gp, mut gt) = (zeros(*predicted), zeros(*target));
                reduce::cross_entropy_backward(
                    values(*predicted),
                    values(*target),
                    shape_of(*predicted).width,
                    grad,
                    &mut gp,
                    &mut gt,
                );
                vec![
                    Contribution::whole(*predicted, gp),
                    Contribution::whole(*target, gt),
                ]
            }
            Op::Sum(a) => {
                let mut ga = zeros(*a);
                reduce::sum_backward(grad[0], &mut ga);
                vec![Contribution::whole(*a, ga)]
            }
            Op::Avg(a) => {
                let mut ga = zeros(*a);
                reduce::avg_backward(grad[0], &mut ga);
                vec![Contribution::whole(*a, ga)]
            }
            Op::Unary { input, op } => {
                let mut ga = zeros(*input);
                op.backward(
                    values(*input),
                    &node.values,
                    grad,
                    shape_of(*input),
                    &mut ga,
                );
                vec![Contribution::whole(*input, ga)]
            }
        }
    }
}

fn operands<T: Element>(op: &Op<T>) -> Vec<NodeId> {
    match op {
        Op::Leaf(_) => Vec::new(),
        Op::Mul(a, b) | Op::Add(a, b) | Op::Hadamard(a, b) | Op::Concat(a, b) => vec![*a, *b],
        Op::CrossEntropy { predicted, target } => vec![*predicted, *target],
        Op::Transpose(a) | Op::Entropy(a) | Op::Sum(a) | Op::Avg(a) => vec![*a],
        Op::Slice { input, .. } | Op::Unary { input, .. } => vec![*input],
    }
}

fn operand_values<'a, T: Element>(
    nodes: &'a [Node<T>],
    params: &'a ParameterSet<T>,
    id: NodeId,
) -> &'a [T] {
    match nodes[id.0].op {
        Op::Leaf(pid) => &params.get(pid).values,
        _ => &nodes[id.0].values,
    }
}

fn check_bounds(bounds: SliceBounds, len: usize, width: usize) -> Result<()> {
    if bounds.is_empty() || bounds.end > len || bounds.len() != width {
        return Err(Error::SliceOutOfRange {
            begin: bounds.begin,
            end: bounds.end,
            len,
            width,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(name: &str, shape: Shape, values: Vec<f64>) -> (ParameterSet<f64>, ParamId) {
        let mut params = ParameterSet::new();
        let id = params.add(name, shape).unwrap();
        params.get_mut(id).values = values;
        (params, id)
    }

    #[test]
    fn test_mul_shape_follows_row_dot_products() {
        let mut params = ParameterSet::<f32>::new();
        let points = params.add("points", Shape::new(4, 150)).unwrap();
        let input = params.add_input("input", Shape::new(4, 1)).unwrap();
        let mut graph = Graph::new();
        let p = graph.leaf(&params, points).unwrap();
        let x = graph.leaf(&params, input).unwrap();
        let l1 = graph.mul(p, x).unwrap();
        assert_eq!(graph.shape(l1).unwrap(), Shape::new(150, 1));
    }

    #[test]
    fn test_mul_width_mismatch_fails_at_construction() {
        let mut params = ParameterSet::<f32>::new();
        let a = params.add("a", Shape::new(4, 2)).unwrap();
        let b = params.add("b", Shape::new(3, 2)).unwrap();
        let mut graph = Graph::new();
        let (a, b) = (graph.leaf(&params, a).unwrap(), graph.leaf(&params, b).unwrap());
        assert!(matches!(graph.mul(a, b), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_backward_requires_forward() {
        let (mut params, w) = set_with("w", Shape::new(2, 1), vec![1.0, 2.0]);
        let mut graph = Graph::new();
        let leaf = graph.leaf(&params, w).unwrap();
        let cost = graph.sum(leaf).unwrap();
        assert!(matches!(
            graph.backward(cost, &mut params),
            Err(Error::NotEvaluated(_))
        ));
    }

    #[test]
    fn test_shared_operand_accumulates_both_paths() {
        let (mut params, w) = set_with("w", Shape::new(3, 1), vec![1.0, -2.0, 3.0]);
        let mut graph = Graph::new();
        let leaf = graph.leaf(&params, w).unwrap();
        let dot = graph.mul(leaf, leaf).unwrap();
        let cost = graph.sum(dot).unwrap();

        let total = graph.gradient(cost, &mut params, &Bindings::new()).unwrap();
        assert_eq!(total, 14.0);
        assert_eq!(params.get(w).gradient, vec![2.0, -4.0, 6.0]);
    }

    #[test]
    fn test_unreached_nodes_are_not_evaluated() {
        let (mut params, w) = set_with("w", Shape::new(2, 1), vec![0.5, 0.5]);
        let mut graph = Graph::new();
        let leaf = graph.leaf(&params, w).unwrap();
        let entropy = graph.entropy(leaf).unwrap();
        let _unused = graph.avg(entropy).unwrap();
        let cost = graph.sum(leaf).unwrap();

        graph.gradient(cost, &mut params, &Bindings::new()).unwrap();
        assert_eq!(params.get(w).gradient, vec![1.0, 1.0]);
        assert_eq!(graph.node_gradient(entropy).unwrap(), &[0.0]);
    }

    #[test]
    fn test_binding_cannot_resize_slice() {
        let (params, w) = set_with("w", Shape::new(6, 1), vec![0.0; 6]);
        let mut graph = Graph::new();
        let leaf = graph.leaf(&params, w).unwrap();
        let slice = graph.slice(leaf, SliceBounds::new(0, 2)).unwrap();
        let bindings = Bindings::new().slice(slice, SliceBounds::new(2, 5));
        assert!(matches!(
            graph.forward(slice, &params, &bindings),
            Err(Error::SliceOutOfRange { .. })
        ));
    }
}
