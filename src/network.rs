//! Attention networks built on the expression graph.
//!
//! Every network owns a set of learned point vectors, `points`, of shape
//! `[width, length]`. A query attends over the points through a softmax of
//! dot products, the attention-weighted sum of points goes through a second
//! softmax, and the cost is the self-entropy of that distribution.
//! Minimizing it pulls the points towards configurations in which every
//! query lands decisively near a few of them.
//!
//! | Builder | Query | Cost |
//! |---|---|---|
//! | [`Network::clustering`] | one input sample | entropy |
//! | [`Network::self_attention`] | the points themselves | summed entropy |
//! | [`Network::batch`] | every sample at once | mean entropy |
//! | [`Network::positional`] | symbol vector ++ position row | entropy |

use crate::error::{Error, Result};
use crate::graph::{Bindings, Graph, NodeId, SliceBounds};
use crate::ops::SoftmaxKind;
use crate::optimizers::{Optimizer, UpdateRanges};
use crate::tensor::{Element, ParamId, ParameterSet, Shape, Tensor};
use crate::training::{Feed, Pass, Trainer, TrainingReport};
use crate::utils::rng::SeededRng;

/// Name of the learned point vectors.
pub const POINTS: &str = "points";
/// Name of the input entry.
pub const INPUT: &str = "input";
/// Name of the position embedding in [`Network::positional`].
pub const POSITIONS: &str = "positions";

/// A graph, its parameters and the nodes worth inspecting.
pub struct Network<T: Element> {
    pub graph: Graph<T>,
    pub params: ParameterSet<T>,
    pub points: ParamId,
    /// `None` when the points attend over themselves.
    pub input: Option<ParamId>,
    /// First attention layer: weights over the points.
    pub l1: NodeId,
    /// Second attention layer: distribution whose entropy is minimized.
    pub l2: NodeId,
    pub cost: NodeId,
    /// Position slice of [`Network::positional`].
    pub slice: Option<NodeId>,
}

impl<T: Element> Network<T> {
    /// `length` points of `width` features attending over one input sample.
    pub fn clustering(width: usize, length: usize, softmax: SoftmaxKind) -> Result<Self> {
        let mut params = ParameterSet::new();
        let points = params.add(POINTS, Shape::new(width, length))?;
        let input = params.add_input(INPUT, Shape::new(width, 1))?;

        let mut graph = Graph::new();
        let p = graph.leaf(&params, points)?;
        let x = graph.leaf(&params, input)?;
        let scores = graph.mul(p, x)?;
        let l1 = graph.unary(scores, softmax.op())?;
        let pt = graph.transpose(p)?;
        let weighted = graph.mul(l1, pt)?;
        let weighted = graph.transpose(weighted)?;
        let l2 = graph.unary(weighted, softmax.op())?;
        let cost = graph.entropy(l2)?;

        Ok(Self {
            graph,
            params,
            points,
            input: Some(input),
            l1,
            l2,
            cost,
            slice: None,
        })
    }

    /// Points attending over themselves; no input.
    pub fn self_attention(width: usize, length: usize, softmax: SoftmaxKind) -> Result<Self> {
        let mut params = ParameterSet::new();
        let points = params.add(POINTS, Shape::new(width, length))?;

        let mut graph = Graph::new();
        let p = graph.leaf(&params, points)?;
        let scores = graph.mul(p, p)?;
        let l1 = graph.unary(scores, softmax.op())?;
        let pt = graph.transpose(p)?;
        let weighted = graph.mul(pt, l1)?;
        let l2 = graph.unary(weighted, softmax.op())?;
        let entropy = graph.entropy(l2)?;
        let cost = graph.sum(entropy)?;

        Ok(Self {
            graph,
            params,
            points,
            input: None,
            l1,
            l2,
            cost,
            slice: None,
        })
    }

    /// One point per sample, all `samples` inputs attended at once.
    ///
    /// The input entry has shape `[width, samples]`; load it with
    /// [`crate::data::flatten`].
    pub fn batch(width: usize, samples: usize, softmax: SoftmaxKind) -> Result<Self> {
        let mut params = ParameterSet::new();
        let points = params.add(POINTS, Shape::new(width, samples))?;
        let input = params.add_input(INPUT, Shape::new(width, samples))?;

        let mut graph = Graph::new();
        let p = graph.leaf(&params, points)?;
        let x = graph.leaf(&params, input)?;
        let scores = graph.mul(p, x)?;
        let l1 = graph.unary(scores, softmax.op())?;
        let pt = graph.transpose(p)?;
        let weighted = graph.mul(l1, pt)?;
        let weighted = graph.transpose(weighted)?;
        let l2 = graph.unary(weighted, softmax.op())?;
        let entropy = graph.entropy(l2)?;
        let cost = graph.avg(entropy)?;

        Ok(Self {
            graph,
            params,
            points,
            input: Some(input),
            l1,
            l2,
            cost,
            slice: None,
        })
    }

    /// Points attending over a symbol vector concatenated with one row of a
    /// learned position embedding.
    ///
    /// The input entry holds the symbol (`[symbol_width, 1]`), the embedding
    /// is `[position_width, positions]`. Use [`Network::position_pass`] to
    /// select the row for an iteration.
    pub fn positional(
        symbol_width: usize,
        position_width: usize,
        length: usize,
        positions: usize,
        softmax: SoftmaxKind,
    ) -> Result<Self> {
        let mut params = ParameterSet::new();
        let points = params.add(POINTS, Shape::new(symbol_width + position_width, length))?;
        let embedding = params.add(POSITIONS, Shape::new(position_width, positions))?;
        let input = params.add_input(INPUT, Shape::new(symbol_width, 1))?;

        let mut graph = Graph::new();
        let p = graph.leaf(&params, points)?;
        let symbol = graph.leaf(&params, input)?;
        let rows = graph.leaf(&params, embedding)?;
        let position = graph.slice(rows, SliceBounds::row(0, position_width))?;
        let query = graph.concat(symbol, position)?;
        let scores = graph.mul(p, query)?;
        let l1 = graph.unary(scores, softmax.op())?;
        let pt = graph.transpose(p)?;
        let weighted = graph.mul(pt, l1)?;
        let l2 = graph.unary(weighted, softmax.op())?;
        let cost = graph.entropy(l2)?;

        Ok(Self {
            graph,
            params,
            points,
            input: Some(input),
            l1,
            l2,
            cost,
            slice: Some(position),
        })
    }

    /// Selects position row `position` for the forward pass and restricts
    /// the embedding update to that row.
    pub fn position_pass(&self, position: usize) -> Result<Pass> {
        let slice = self
            .slice
            .ok_or_else(|| Error::UnknownParameter(POSITIONS.to_string()))?;
        let width = self.graph.shape(slice)?.width;
        let bounds = SliceBounds::row(position, width);
        Ok(Pass {
            bindings: Bindings::new().slice(slice, bounds),
            ranges: UpdateRanges::new().restrict(POSITIONS, bounds.begin..bounds.end),
        })
    }

    pub fn points(&self) -> &Tensor<T> {
        self.params.get(self.points)
    }

    /// Copies `features` into the input entry.
    pub fn load_sample(&mut self, features: &[f64]) -> Result<()> {
        let input = self
            .input
            .ok_or_else(|| Error::UnknownParameter(INPUT.to_string()))?;
        self.params.get_mut(input).assign(features)
    }

    /// Cost for `features` without touching any gradient.
    pub fn entropy_of(&mut self, features: &[f64], bindings: &Bindings) -> Result<T> {
        if self.input.is_some() {
            self.load_sample(features)?;
        }
        let values = self.graph.forward(self.cost, &self.params, bindings)?;
        Ok(values[0])
    }

    /// First-layer attention over the points for `features`.
    pub fn attention(&mut self, features: &[f64], bindings: &Bindings) -> Result<Vec<T>> {
        if self.input.is_some() {
            self.load_sample(features)?;
        }
        Ok(self
            .graph
            .forward(self.l1, &self.params, bindings)?
            .to_vec())
    }

    /// Runs `trainer` over this network's cost.
    pub fn train<O, F>(
        &mut self,
        trainer: &mut Trainer<O>,
        feed: &mut F,
        rng: &mut SeededRng,
    ) -> Result<TrainingReport>
    where
        O: Optimizer<T>,
        F: Feed<T>,
    {
        trainer.run(&mut self.graph, self.cost, &mut self.params, feed, rng)
    }
}
