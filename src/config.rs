//! Configuration structures for training runs
//!
//! Experiment binaries read an optional JSON file describing the optimizer,
//! the iteration budget and the model choices. Every field is optional; a
//! missing field takes the default documented on [`TrainingConfig`].

use crate::ops::SoftmaxKind;
use crate::optimizers::Adam;
use crate::tensor::Init;
use crate::training::Sampling;
use serde::Deserialize;
use std::error::Error;
use std::fs;

/// Configuration for one training run.
///
/// # Example
///
/// ```json
/// {
///   "learning_rate": 0.001,
///   "iterations": 8192,
///   "seed": 1,
///   "sampling": "random",
///   "softmax": "exponential",
///   "init": "uniform",
///   "normalize": false
/// }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    /// Adam step size (default 0.001)
    pub learning_rate: Option<f64>,

    /// Adam first moment decay (default 0.9)
    pub beta1: Option<f64>,

    /// Adam second moment decay (default 0.999)
    pub beta2: Option<f64>,

    /// Adam stability constant (default 1e-8)
    pub epsilon: Option<f64>,

    /// Iteration budget (default 8192)
    pub iterations: Option<usize>,

    /// Random seed (default 1)
    pub seed: Option<u64>,

    /// "random" (with replacement, default) or "sweep" (shuffled passes)
    pub sampling: Option<Sampling>,

    /// "exponential" (default) or "spherical"
    pub softmax: Option<SoftmaxKind>,

    /// "uniform" (default), "kaiming" or "zeros"
    pub init: Option<Init>,

    /// Scale every sample to unit length before training (default false)
    pub normalize: Option<bool>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: None,
            beta1: None,
            beta2: None,
            epsilon: None,
            iterations: None,
            seed: None,
            sampling: None,
            softmax: None,
            init: None,
            normalize: None,
        }
    }
}

impl TrainingConfig {
    pub fn iterations(&self) -> usize {
        self.iterations.unwrap_or(8 * 1024)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(1)
    }

    pub fn normalize(&self) -> bool {
        self.normalize.unwrap_or(false)
    }

    /// Optimizer with the configured hyperparameters.
    pub fn adam(&self) -> Adam {
        Adam::new(
            self.learning_rate.unwrap_or(0.001),
            self.beta1.unwrap_or(0.9),
            self.beta2.unwrap_or(0.999),
            self.epsilon.unwrap_or(1e-8),
        )
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling.unwrap_or(Sampling::WithReplacement)
    }

    pub fn softmax(&self) -> SoftmaxKind {
        self.softmax.unwrap_or(SoftmaxKind::Exponential)
    }

    pub fn init(&self) -> Init {
        self.init.unwrap_or(Init::Uniform)
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `TrainingConfig`.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use occam::config::load_config;
///
/// let cfg = load_config("config/clusters.json").unwrap();
/// assert_eq!(cfg.seed(), 1);
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads `path` when given, defaults otherwise.
pub fn config_from_args(path: Option<&str>) -> Result<TrainingConfig, Box<dyn Error>> {
    match path {
        Some(path) => load_config(path),
        None => Ok(TrainingConfig::default()),
    }
}

fn invalid(message: String) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    ))
}

fn validate_config(config: &TrainingConfig) -> Result<(), Box<dyn Error>> {
    if let Some(lr) = config.learning_rate {
        if !(lr > 0.0) {
            return Err(invalid("learning_rate must be positive".to_string()));
        }
    }

    for (name, value) in [("beta1", config.beta1), ("beta2", config.beta2)] {
        if let Some(beta) = value {
            if !(0.0..1.0).contains(&beta) {
                return Err(invalid(format!("{} must be in [0, 1)", name)));
            }
        }
    }

    if let Some(epsilon) = config.epsilon {
        if epsilon < 0.0 {
            return Err(invalid("epsilon must be non-negative".to_string()));
        }
    }

    if config.iterations == Some(0) {
        return Err(invalid("iterations must be positive".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.iterations(), 8192);
        assert_eq!(config.seed(), 1);
        assert_eq!(config.sampling(), Sampling::WithReplacement);
        assert_eq!(config.softmax(), SoftmaxKind::Exponential);
        assert_eq!(config.adam().learning_rate(), 0.001);
    }

    #[test]
    fn test_choices_parse_into_variants() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{ "sampling": "sweep", "softmax": "spherical", "init": "zeros" }"#,
        )
        .unwrap();
        assert_eq!(config.sampling(), Sampling::Shuffled);
        assert_eq!(config.softmax(), SoftmaxKind::Spherical);
        assert_eq!(config.init(), Init::Zeros);
    }

    #[test]
    fn test_unknown_choice_rejected_by_parser() {
        let result = serde_json::from_str::<TrainingConfig>(r#"{ "softmax": "sparsemax" }"#);
        assert!(result.is_err());
    }
}
