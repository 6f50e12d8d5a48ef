//! Shared utilities
//!
//! Random number generation used by initialization, sampling and the
//! synthetic data generator.

pub mod rng;

pub use rng::SeededRng;
