//! Occam: attention-style unsupervised clustering
//!
//! A small reverse-mode autodiff engine over rank-2 tensors, together with
//! the attention networks that minimize the self-entropy of their output
//! and the Adam training loop that drives them.
//!
//! # Modules
//!
//! - `tensor`: Shapes, tensors, the numeric `Element` trait and parameter sets
//! - `ops`: Forward and backward kernels (multiply, softmax, entropy, ...)
//! - `graph`: Expression graph with two-phase forward/backward evaluation
//! - `optimizers`: Optimizer trait and Adam with sparse update ranges
//! - `training`: Training loop, feeds and loss history
//! - `network`: Attention network builders
//! - `data`: Samples and synthetic datasets
//! - `analysis`: Nearest-neighbour agreement over attention rankings
//! - `persist`: Binary weight files
//! - `config`: Training configuration structures
//! - `utils`: Seeded random number generation

#[cfg(feature = "blas")]
extern crate blas_src;

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod network;
pub mod ops;
pub mod optimizers;
pub mod persist;
pub mod tensor;
pub mod training;
pub mod utils;

pub use error::{Error, Result};
