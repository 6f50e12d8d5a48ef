//! Tensor values and the parameter sets that own them.
//!
//! A [`Tensor`] is a named `[width, count]` buffer of values together with an
//! equally sized gradient buffer. Rows of `width` elements are stored one
//! after another, so row `r` occupies `values[r * width..(r + 1) * width]`.

pub mod element;
pub mod set;

pub use element::Element;
pub use set::{Init, ParamId, ParameterSet};

use crate::error::{Error, Result};
use std::fmt;

/// Two-dimensional tensor shape: `width` features by `count` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub width: usize,
    pub count: usize,
}

impl Shape {
    pub const fn new(width: usize, count: usize) -> Self {
        Self { width, count }
    }

    /// Shape of a single value.
    pub const fn scalar() -> Self {
        Self { width: 1, count: 1 }
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.width * self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape with the two dimensions swapped.
    pub const fn transposed(&self) -> Self {
        Self {
            width: self.count,
            count: self.width,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.width, self.count)
    }
}

/// A named buffer of values with its paired gradient buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Element> {
    pub name: String,
    shape: Shape,
    pub values: Vec<T>,
    pub gradient: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Allocates a zero-filled tensor.
    ///
    /// Fails with [`Error::EmptyShape`] if either dimension is zero.
    pub fn zeros(name: impl Into<String>, shape: Shape) -> Result<Self> {
        let name = name.into();
        if shape.is_empty() {
            return Err(Error::EmptyShape { name });
        }
        Ok(Self {
            name,
            shape,
            values: vec![T::zero(); shape.len()],
            gradient: vec![T::zero(); shape.len()],
        })
    }

    /// Builds a tensor from existing values.
    pub fn from_values(name: impl Into<String>, shape: Shape, values: Vec<T>) -> Result<Self> {
        let mut tensor = Self::zeros(name, shape)?;
        if values.len() != shape.len() {
            return Err(Error::shape_mismatch(
                "from_values",
                shape,
                Shape::new(values.len(), 1),
            ));
        }
        tensor.values = values;
        Ok(tensor)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values of row `r`.
    pub fn row(&self, r: usize) -> &[T] {
        &self.values[r * self.shape.width..(r + 1) * self.shape.width]
    }

    /// Resets the gradient buffer to zero.
    pub fn zero_gradient(&mut self) {
        self.gradient.iter_mut().for_each(|g| *g = T::zero());
    }

    /// Copies `values` into the tensor, converting from `f64`.
    pub fn assign(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.values.len() {
            return Err(Error::shape_mismatch(
                "assign",
                self.shape,
                Shape::new(values.len(), 1),
            ));
        }
        for (dst, &src) in self.values.iter_mut().zip(values) {
            *dst = T::from_f64(src);
        }
        Ok(())
    }
}
