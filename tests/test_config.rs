//! Tests for training configuration parsing
//!
//! This file tests the config module including:
//! - Loading the shipped JSON config files
//! - Defaults for missing optional fields
//! - Conversions into optimizer, sampling, softmax and init values
//! - Handling invalid JSON, missing files and out-of-range values

use occam::config::{config_from_args, load_config, TrainingConfig};
use occam::ops::SoftmaxKind;
use occam::tensor::Init;
use occam::training::Sampling;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

fn load_temp(contents: &str) -> Result<TrainingConfig, Box<dyn std::error::Error>> {
    let file = write_temp_config(contents);
    load_config(file.path().to_str().unwrap())
}

// ============================================================================
// Shipped Config Tests
// ============================================================================

mod shipped_config_tests {
    use super::*;

    #[test]
    fn test_load_clusters_config() {
        let config = load_config("config/clusters.json").expect("Failed to load clusters config");

        assert_eq!(config.learning_rate, Some(0.001));
        assert_eq!(config.iterations(), 8192);
        assert_eq!(config.sampling(), Sampling::WithReplacement);
        assert_eq!(config.softmax(), SoftmaxKind::Exponential);
    }

    #[test]
    fn test_load_complex_config() {
        let config = load_config("config/complex.json").expect("Failed to load complex config");

        assert_eq!(config.softmax(), SoftmaxKind::Spherical);
        assert_eq!(config.iterations(), 1024);
        assert!((config.adam().learning_rate() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_all_shipped_configs_load() {
        for path in [
            "config/clusters.json",
            "config/self_attention.json",
            "config/complex.json",
            "config/positional.json",
        ] {
            assert!(load_config(path).is_ok(), "{} failed to load", path);
        }
    }
}

// ============================================================================
// Defaults and Conversion Tests
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_temp("{}").unwrap();

        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.iterations(), 8192);
        assert_eq!(config.seed(), 1);
        assert!(!config.normalize());
        assert_eq!(config.init(), Init::Uniform);
    }

    #[test]
    fn test_sweep_sampling() {
        let config = load_temp(r#"{ "sampling": "sweep" }"#).unwrap();
        assert_eq!(config.sampling(), Sampling::Shuffled);
    }

    #[test]
    fn test_kaiming_init() {
        let config = load_temp(r#"{ "init": "kaiming" }"#).unwrap();
        assert_eq!(config.init(), Init::Kaiming);
    }

    #[test]
    fn test_adam_hyperparameters() {
        let config = load_temp(
            r#"{
  "learning_rate": 0.01,
  "beta1": 0.8,
  "beta2": 0.99,
  "epsilon": 1e-6
}"#,
        )
        .unwrap();
        let adam = config.adam();

        assert!((adam.learning_rate() - 0.01).abs() < 1e-12);
        let (c1, c2) = adam.bias_corrections(1);
        assert!((c1 - 0.2).abs() < 1e-12);
        assert!((c2 - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_config_from_args_without_path() {
        let config = config_from_args(None).unwrap();
        assert_eq!(config, TrainingConfig::default());
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert!(load_config("nonexistent_config.json").is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(load_temp("{ not json").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(load_temp(r#"{ "scheduler_type": "constant" }"#).is_err());
    }

    #[test]
    fn test_invalid_softmax() {
        let err = load_temp(r#"{ "softmax": "sparsemax" }"#).unwrap_err();
        assert!(err.to_string().contains("sparsemax"));
    }

    #[test]
    fn test_invalid_sampling_and_init() {
        assert!(load_temp(r#"{ "sampling": "shuffled" }"#).is_err());
        assert!(load_temp(r#"{ "init": "xavier" }"#).is_err());
    }

    #[test]
    fn test_non_positive_learning_rate() {
        assert!(load_temp(r#"{ "learning_rate": 0.0 }"#).is_err());
        assert!(load_temp(r#"{ "learning_rate": -0.1 }"#).is_err());
    }

    #[test]
    fn test_beta_out_of_range() {
        assert!(load_temp(r#"{ "beta1": 1.0 }"#).is_err());
        assert!(load_temp(r#"{ "beta2": -0.5 }"#).is_err());
    }

    #[test]
    fn test_zero_iterations() {
        assert!(load_temp(r#"{ "iterations": 0 }"#).is_err());
    }
}
