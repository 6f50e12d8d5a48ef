//! Ordered, named collections of tensors.
//!
//! A [`ParameterSet`] holds both the trainable parameters of a network and
//! its pure inputs. Trainable entries carry the Adam first and second moment
//! buffers, allocated together with the tensor; inputs carry none and are
//! never touched by the optimizer.

use super::{Element, Shape, Tensor};
use crate::error::{Error, Result};
use crate::utils::rng::SeededRng;
use serde::Deserialize;
use std::collections::HashMap;

/// Handle to an entry of a [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub(crate) usize);

impl ParamId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Adam moment estimates for one trainable tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments<T: Element> {
    pub m: Vec<T>,
    pub v: Vec<T>,
}

impl<T: Element> Moments<T> {
    fn zeros(len: usize) -> Self {
        Self {
            m: vec![T::zero(); len],
            v: vec![T::zero(); len],
        }
    }

    fn reset(&mut self) {
        self.m.iter_mut().for_each(|x| *x = T::zero());
        self.v.iter_mut().for_each(|x| *x = T::zero());
    }
}

/// Weight initialization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Init {
    Zeros,
    /// Uniform in `[-1, 1]`.
    Uniform,
    /// Zero-mean normal scaled by `sqrt(2 / fan_in)`, with `fan_in` the tensor width.
    Kaiming,
}

#[derive(Debug, Clone)]
struct Entry<T: Element> {
    tensor: Tensor<T>,
    moments: Option<Moments<T>>,
}

/// Ordered mapping from name to tensor, in declaration order.
#[derive(Debug, Clone)]
pub struct ParameterSet<T: Element> {
    entries: Vec<Entry<T>>,
    index: HashMap<String, usize>,
}

impl<T: Element> Default for ParameterSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> ParameterSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers a trainable tensor with zeroed values and moments.
    pub fn add(&mut self, name: &str, shape: Shape) -> Result<ParamId> {
        self.insert(name, shape, true)
    }

    /// Registers a non-trainable input tensor.
    pub fn add_input(&mut self, name: &str, shape: Shape) -> Result<ParamId> {
        self.insert(name, shape, false)
    }

    fn insert(&mut self, name: &str, shape: Shape, trainable: bool) -> Result<ParamId> {
        if self.index.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let tensor = Tensor::zeros(name, shape)?;
        let moments = trainable.then(|| Moments::zeros(shape.len()));
        let id = self.entries.len();
        self.entries.push(Entry { tensor, moments });
        self.index.insert(name.to_string(), id);
        Ok(ParamId(id))
    }

    /// Looks up an entry by name.
    pub fn id(&self, name: &str) -> Result<ParamId> {
        self.index
            .get(name)
            .map(|&i| ParamId(i))
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` refers to an entry of this set.
    pub fn contains(&self, id: ParamId) -> bool {
        id.0 < self.entries.len()
    }

    pub fn get(&self, id: ParamId) -> &Tensor<T> {
        &self.entries[id.0].tensor
    }

    pub fn get_mut(&mut self, id: ParamId) -> &mut Tensor<T> {
        &mut self.entries[id.0].tensor
    }

    pub fn by_name(&self, name: &str) -> Result<&Tensor<T>> {
        Ok(self.get(self.id(name)?))
    }

    pub fn is_trainable(&self, id: ParamId) -> bool {
        self.entries[id.0].moments.is_some()
    }

    pub fn moments(&self, id: ParamId) -> Option<&Moments<T>> {
        self.entries[id.0].moments.as_ref()
    }

    /// Handles in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = ParamId> {
        (0..self.entries.len()).map(ParamId)
    }

    /// Tensors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Tensor<T>> {
        self.entries.iter().map(|e| &e.tensor)
    }

    /// Trainable tensors with their moment buffers, in declaration order.
    pub fn trainable_mut(&mut self) -> impl Iterator<Item = (&mut Tensor<T>, &mut Moments<T>)> {
        self.entries
            .iter_mut()
            .filter_map(|e| e.moments.as_mut().map(|m| (&mut e.tensor, m)))
    }

    /// Resets every gradient buffer, inputs included.
    pub fn zero(&mut self) {
        for entry in &mut self.entries {
            entry.tensor.zero_gradient();
        }
    }

    /// Clears the optimizer state of every trainable entry.
    pub fn reset_moments(&mut self) {
        for moments in self.entries.iter_mut().filter_map(|e| e.moments.as_mut()) {
            moments.reset();
        }
    }

    /// True when no gradient holds NaN or infinity.
    pub fn gradients_finite(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.tensor.gradient.iter().all(|g| g.is_finite()))
    }

    /// Initializes every trainable entry with `init`.
    ///
    /// Bias-like entries, whose names start with `b`, are zero-initialized
    /// regardless of the policy. Inputs are left untouched.
    pub fn initialize(&mut self, init: Init, rng: &mut SeededRng) {
        for entry in &mut self.entries {
            if entry.moments.is_none() {
                continue;
            }
            let policy = if entry.tensor.name.starts_with('b') {
                Init::Zeros
            } else {
                init
            };
            fill(&mut entry.tensor, policy, rng);
        }
    }

    /// Initializes a single entry, trainable or not.
    pub fn initialize_entry(&mut self, id: ParamId, init: Init, rng: &mut SeededRng) {
        fill(&mut self.entries[id.0].tensor, init, rng);
    }
}

fn fill<T: Element>(tensor: &mut Tensor<T>, init: Init, rng: &mut SeededRng) {
    match init {
        Init::Zeros => tensor.values.iter_mut().for_each(|v| *v = T::zero()),
        Init::Uniform => {
            for v in tensor.values.iter_mut() {
                *v = T::from_f64(rng.gen_range_f64(-1.0, 1.0));
            }
        }
        Init::Kaiming => {
            let factor = (2.0 / tensor.shape().width as f64).sqrt();
            for v in tensor.values.iter_mut() {
                *v = T::from_f64(rng.normal() * factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments_only_for_trainable_entries() {
        let mut set = ParameterSet::<f32>::new();
        let points = set.add("points", Shape::new(4, 3)).unwrap();
        let input = set.add_input("input", Shape::new(4, 1)).unwrap();

        assert!(set.is_trainable(points));
        assert!(!set.is_trainable(input));
        assert_eq!(set.moments(points).unwrap().m.len(), 12);
        assert!(set.moments(input).is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut set = ParameterSet::<f32>::new();
        set.add("w", Shape::new(2, 2)).unwrap();
        assert!(matches!(
            set.add_input("w", Shape::new(2, 1)),
            Err(Error::DuplicateName(_))
        ));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut set = ParameterSet::<f64>::new();
        for name in ["w1", "b1", "w2"] {
            set.add(name, Shape::new(2, 2)).unwrap();
        }
        let names: Vec<&str> = set.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["w1", "b1", "w2"]);
    }

    #[test]
    fn test_bias_entries_zero_initialized() {
        let mut set = ParameterSet::<f64>::new();
        let w = set.add("weights", Shape::new(8, 8)).unwrap();
        let b = set.add("bias", Shape::new(8, 1)).unwrap();
        let mut rng = SeededRng::new(1);
        set.initialize(Init::Uniform, &mut rng);

        assert!(set.get(b).values.iter().all(|&v| v == 0.0));
        assert!(set.get(w).values.iter().any(|&v| v != 0.0));
        assert!(set.get(w).values.iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_zero_resets_all_gradients() {
        let mut set = ParameterSet::<f32>::new();
        let w = set.add("w", Shape::new(2, 1)).unwrap();
        let x = set.add_input("x", Shape::new(2, 1)).unwrap();
        set.get_mut(w).gradient = vec![1.0, 2.0];
        set.get_mut(x).gradient = vec![3.0, 4.0];
        set.zero();
        assert_eq!(set.get(w).gradient, vec![0.0, 0.0]);
        assert_eq!(set.get(x).gradient, vec![0.0, 0.0]);
    }
}
