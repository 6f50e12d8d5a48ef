//! Samples and the synthetic cluster generator used by the experiments.

use crate::utils::rng::SeededRng;

/// One fixed-length feature vector and an optional label.
///
/// Labels are only read by the analysis helpers, never by the numeric path.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f64>,
    pub label: Option<String>,
}

impl Sample {
    pub fn new(features: Vec<f64>, label: Option<String>) -> Self {
        Self { features, label }
    }
}

/// Gaussian clusters centred on the coordinate axes.
///
/// Class `k` is centred at `±scale` on axis `k % width`, negative for the
/// second pass over the axes, and each feature gets normal noise of standard
/// deviation `spread`. Samples are grouped by class, labels are
/// `"class-<k>"`.
pub fn synthetic_clusters(
    rng: &mut SeededRng,
    classes: usize,
    per_class: usize,
    width: usize,
    scale: f64,
    spread: f64,
) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(classes * per_class);
    for class in 0..classes {
        let axis = class % width.max(1);
        let sign = if (class / width.max(1)) % 2 == 0 {
            1.0
        } else {
            -1.0
        };
        for _ in 0..per_class {
            let features = (0..width)
                .map(|d| {
                    let centre = if d == axis { sign * scale } else { 0.0 };
                    centre + spread * rng.normal()
                })
                .collect();
            samples.push(Sample::new(features, Some(format!("class-{}", class))));
        }
    }
    samples
}

/// Scales every sample to unit Euclidean norm; zero vectors are left as is.
pub fn normalize(samples: &mut [Sample]) {
    for sample in samples.iter_mut() {
        let norm = sample.features.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            sample.features.iter_mut().for_each(|x| *x /= norm);
        }
    }
}

/// All features, sample after sample, as one flat buffer.
pub fn flatten(samples: &[Sample]) -> Vec<f64> {
    samples
        .iter()
        .flat_map(|s| s.features.iter().copied())
        .collect()
}

/// Labels in sample order, empty strings for unlabelled samples.
pub fn labels(samples: &[Sample]) -> Vec<String> {
    samples
        .iter()
        .map(|s| s.label.clone().unwrap_or_default())
        .collect()
}
