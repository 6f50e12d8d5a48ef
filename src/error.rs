//! Error type for graph construction, evaluation and weight persistence.
//!
//! Shape problems are reported while the graph is being built so that a
//! malformed model never reaches the training loop. Numeric divergence is
//! deliberately absent: non-finite values propagate through the graph and are
//! reported by the training loop as an outcome, not as an error.

use crate::tensor::Shape;
use thiserror::Error;

/// Errors raised by the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch in {op}: {left} vs {right}")]
    ShapeMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("tensor '{name}' has an empty dimension")]
    EmptyShape { name: String },

    #[error("parameter '{0}' is already registered")]
    DuplicateName(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("node {0} does not belong to this graph")]
    UnknownNode(usize),

    #[error("slice [{begin}, {end}) is out of range for length {len} or changes the slice width {width}")]
    SliceOutOfRange {
        begin: usize,
        end: usize,
        len: usize,
        width: usize,
    },

    #[error("node {0} has not been evaluated by a forward pass")]
    NotEvaluated(usize),

    #[error("backward needs a scalar root, found {len} elements")]
    NonScalarRoot { len: usize },

    #[error("seed gradient has {found} elements, expected {expected}")]
    SeedLength { expected: usize, found: usize },

    #[error("no samples to train on")]
    EmptyDataset,

    #[error("invalid weight file: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn shape_mismatch(op: &'static str, left: Shape, right: Shape) -> Self {
        Error::ShapeMismatch { op, left, right }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
