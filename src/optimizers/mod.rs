//! Optimizer abstractions for parameter updates
//!
//! An optimizer consumes the gradients left in a [`ParameterSet`] by a
//! backward pass and updates every trainable entry in place. Moment buffers
//! belong to the parameter set, so the optimizer itself only carries its
//! hyperparameters and the iteration counter.
//!
//! # Example
//!
//! ```ignore
//! use occam::optimizers::{Adam, Optimizer};
//!
//! let mut optimizer = Adam::default();
//!
//! // after graph.gradient(cost, &mut params, &bindings)?
//! optimizer.step(&mut params);
//! params.zero();
//! ```

pub mod adam;

pub use adam::Adam;

use crate::tensor::{Element, ParameterSet};
use std::ops::Range;

/// Per-parameter index ranges restricting an update.
///
/// Entries not listed here are updated over their whole length. This is how
/// sparse updates are expressed: a position embedding of which only one row
/// took part in the forward pass gets only that row updated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRanges {
    ranges: Vec<(String, Range<usize>)>,
}

impl UpdateRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the update of `name` to `range`.
    pub fn restrict(mut self, name: &str, range: Range<usize>) -> Self {
        self.ranges.retain(|(n, _)| n != name);
        self.ranges.push((name.to_string(), range));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range to update for a tensor called `name` with `len` elements.
    pub fn range_for(&self, name: &str, len: usize) -> Range<usize> {
        match self.ranges.iter().find(|(n, _)| n == name) {
            Some((_, range)) => range.start.min(len)..range.end.min(len),
            None => 0..len,
        }
    }
}

/// Core trait for optimizers.
pub trait Optimizer<T: Element> {
    /// Updates every trainable entry of `params`, restricted by `ranges`.
    ///
    /// Advances the iteration counter by one.
    fn step_ranges(&mut self, params: &mut ParameterSet<T>, ranges: &UpdateRanges);

    /// Updates every trainable entry of `params` over its full length.
    fn step(&mut self, params: &mut ParameterSet<T>) {
        self.step_ranges(params, &UpdateRanges::default());
    }

    /// Restarts the iteration counter and clears the moment estimates.
    fn reset(&mut self, params: &mut ParameterSet<T>);
}
