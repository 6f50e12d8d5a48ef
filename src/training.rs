//! Training loop.
//!
//! One iteration runs, strictly in order:
//!
//! 1. the [`Feed`] loads the next example into the parameter set
//! 2. forward and backward pass through the cost
//! 3. divergence check on the loss and every gradient
//! 4. optimizer step
//! 5. gradients are zeroed
//! 6. `(iteration, loss)` is recorded
//!
//! A non-finite loss or gradient stops the loop before the optimizer step,
//! so parameters are never written with values derived from NaN.

use crate::data::Sample;
use crate::error::{Error, Result};
use crate::graph::{Bindings, Graph, NodeId};
use crate::optimizers::{Optimizer, UpdateRanges};
use crate::tensor::{Element, ParameterSet};
use crate::utils::rng::SeededRng;
use log::{debug, error, info};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Per-iteration configuration produced by a [`Feed`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pass {
    /// Slice windows for the forward pass.
    pub bindings: Bindings,
    /// Restrictions for the optimizer step.
    pub ranges: UpdateRanges,
}

/// Source of training examples.
///
/// `load` writes the next example into the input entries of `params` and
/// returns what the forward pass and optimizer step need to know about it.
/// Closures with the same signature implement this trait.
pub trait Feed<T: Element> {
    fn load(&mut self, params: &mut ParameterSet<T>, rng: &mut SeededRng) -> Result<Pass>;
}

impl<T, F> Feed<T> for F
where
    T: Element,
    F: FnMut(&mut ParameterSet<T>, &mut SeededRng) -> Result<Pass>,
{
    fn load(&mut self, params: &mut ParameterSet<T>, rng: &mut SeededRng) -> Result<Pass> {
        self(params, rng)
    }
}

/// Feed for graphs without inputs, such as points attending over themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeed;

impl<T: Element> Feed<T> for NoFeed {
    fn load(&mut self, _params: &mut ParameterSet<T>, _rng: &mut SeededRng) -> Result<Pass> {
        Ok(Pass::default())
    }
}

/// How examples are drawn from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Sampling {
    /// One uniform draw per iteration.
    #[serde(rename = "random")]
    WithReplacement,
    /// Every sample once per sweep, reshuffled before each sweep.
    #[serde(rename = "sweep")]
    Shuffled,
}

/// Loads samples from a dataset into an input entry.
pub struct SampleFeed<'a> {
    samples: &'a [Sample],
    input: &'a str,
    sampling: Sampling,
    order: Vec<usize>,
    cursor: usize,
    last: Option<usize>,
}

impl<'a> SampleFeed<'a> {
    /// Feeds `samples` into the entry called `input`.
    pub fn new(samples: &'a [Sample], input: &'a str, sampling: Sampling) -> Self {
        Self {
            samples,
            input,
            sampling,
            order: (0..samples.len()).collect(),
            cursor: samples.len(),
            last: None,
        }
    }

    /// Index of the sample loaded by the last call to `load`.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    fn next_index(&mut self, rng: &mut SeededRng) -> usize {
        match self.sampling {
            Sampling::WithReplacement => rng.gen_usize(self.samples.len()),
            Sampling::Shuffled => {
                if self.cursor >= self.order.len() {
                    rng.shuffle_usize(&mut self.order);
                    self.cursor = 0;
                }
                let index = self.order[self.cursor];
                self.cursor += 1;
                index
            }
        }
    }
}

impl<T: Element> Feed<T> for SampleFeed<'_> {
    fn load(&mut self, params: &mut ParameterSet<T>, rng: &mut SeededRng) -> Result<Pass> {
        if self.samples.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let index = self.next_index(rng);
        let id = params.id(self.input)?;
        params.get_mut(id).assign(&self.samples[index].features)?;
        self.last = Some(index);
        Ok(Pass::default())
    }
}

/// Lifecycle of a [`Trainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Idle,
    Running,
    /// Iteration budget reached.
    Exhausted,
    /// A non-finite loss or gradient was observed.
    Diverged,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Exhausted,
    Diverged { iteration: usize, loss: f64 },
}

/// Result of [`Trainer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub outcome: Outcome,
    /// `(iteration, loss)` for every completed iteration.
    pub history: Vec<(usize, f64)>,
}

impl TrainingReport {
    pub fn diverged(&self) -> bool {
        matches!(self.outcome, Outcome::Diverged { .. })
    }

    pub fn initial_loss(&self) -> Option<f64> {
        self.history.first().map(|&(_, loss)| loss)
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|&(_, loss)| loss)
    }

    /// Mean loss over the last `window` iterations.
    pub fn trailing_mean(&self, window: usize) -> Option<f64> {
        let window = window.min(self.history.len());
        if window == 0 {
            return None;
        }
        let tail = &self.history[self.history.len() - window..];
        Some(tail.iter().map(|&(_, loss)| loss).sum::<f64>() / window as f64)
    }
}

/// Runs the optimizer over a cost for a fixed iteration budget.
pub struct Trainer<O> {
    optimizer: O,
    iterations: usize,
    state: TrainingState,
}

impl<O> Trainer<O> {
    pub fn new(optimizer: O, iterations: usize) -> Self {
        Self {
            optimizer,
            iterations,
            state: TrainingState::Idle,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }

    /// Trains `params` by minimizing the scalar `cost`.
    ///
    /// Errors from the feed or the graph abort the run. Divergence is not an
    /// error; it is reported through [`Outcome::Diverged`] with the offending
    /// iteration, and the parameters keep the values of the previous step.
    pub fn run<T, F>(
        &mut self,
        graph: &mut Graph<T>,
        cost: NodeId,
        params: &mut ParameterSet<T>,
        feed: &mut F,
        rng: &mut SeededRng,
    ) -> Result<TrainingReport>
    where
        T: Element,
        O: Optimizer<T>,
        F: Feed<T>,
    {
        info!(
            "training {} iterations over {} tensors",
            self.iterations,
            params.len()
        );
        self.state = TrainingState::Running;
        let mut history = Vec::with_capacity(self.iterations);

        for iteration in 1..=self.iterations {
            let start = Instant::now();
            let pass = feed.load(params, rng)?;
            let total = graph.gradient(cost, params, &pass.bindings)?;

            if !total.is_finite() || !params.gradients_finite() {
                error!("iteration {} diverged with loss {:?}", iteration, total);
                params.zero();
                self.state = TrainingState::Diverged;
                return Ok(TrainingReport {
                    outcome: Outcome::Diverged {
                        iteration,
                        loss: total.report(),
                    },
                    history,
                });
            }

            self.optimizer.step_ranges(params, &pass.ranges);
            params.zero();

            let loss = total.report();
            history.push((iteration, loss));
            debug!("{} {} {:?}", iteration, loss, start.elapsed());
        }

        self.state = TrainingState::Exhausted;
        info!(
            "finished after {} iterations, final loss {:?}",
            history.len(),
            history.last().map(|&(_, loss)| loss)
        );
        Ok(TrainingReport {
            outcome: Outcome::Exhausted,
            history,
        })
    }
}

/// Writes one `iteration loss` line per history entry.
pub fn write_history(path: impl AsRef<Path>, history: &[(usize, f64)]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for &(iteration, loss) in history {
        writeln!(writer, "{} {}", iteration, loss)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Shape;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(vec![i as f64, 0.0], None))
            .collect()
    }

    #[test]
    fn test_shuffled_feed_visits_every_sample_per_sweep() {
        let data = samples(5);
        let mut params = ParameterSet::<f64>::new();
        params.add_input("input", Shape::new(2, 1)).unwrap();
        let mut rng = SeededRng::new(1);
        let mut feed = SampleFeed::new(&data, "input", Sampling::Shuffled);

        let mut seen = Vec::new();
        for _ in 0..5 {
            Feed::<f64>::load(&mut feed, &mut params, &mut rng).unwrap();
            seen.push(feed.last().unwrap());
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let data: Vec<Sample> = Vec::new();
        let mut params = ParameterSet::<f32>::new();
        params.add_input("input", Shape::new(2, 1)).unwrap();
        let mut feed = SampleFeed::new(&data, "input", Sampling::WithReplacement);
        let result = Feed::<f32>::load(&mut feed, &mut params, &mut SeededRng::new(1));
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_trailing_mean() {
        let report = TrainingReport {
            outcome: Outcome::Exhausted,
            history: vec![(1, 4.0), (2, 2.0), (3, 1.0)],
        };
        assert_eq!(report.trailing_mean(2), Some(1.5));
        assert_eq!(report.initial_loss(), Some(4.0));
        assert_eq!(report.final_loss(), Some(1.0));
    }
}
