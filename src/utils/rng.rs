//! Seeded random number generator for reproducible runs.
//!
//! Every run owns its generator and threads it by `&mut` through model
//! construction and the training loop, so two runs in the same process never
//! share a stream.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Deterministic generator wrapping [`StdRng`].
pub struct SeededRng {
    inner: StdRng,
}

impl SeededRng {
    /// Create a new RNG from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Standard normal sample.
    pub fn normal(&mut self) -> f64 {
        self.inner.sample(StandardNormal)
    }

    /// Integer sample in [0, upper).
    pub fn gen_usize(&mut self, upper: usize) -> usize {
        if upper == 0 {
            0
        } else {
            self.inner.gen_range(0..upper)
        }
    }

    /// Fisher-Yates shuffle for usize slices.
    pub fn shuffle_usize(&mut self, data: &mut [usize]) {
        if data.len() <= 1 {
            return;
        }
        for i in (1..data.len()).rev() {
            let j = self.gen_usize(i + 1);
            data.swap(i, j);
        }
    }
}
