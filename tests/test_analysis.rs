// Tests for synthetic data generation and the nearest-neighbour agreement
// analysis over attention rankings.

use occam::analysis::{nearest_neighbor, nearest_neighbor_agreement, overlap, rank};
use occam::data::{self, Sample};
use occam::training::{Feed, SampleFeed, Sampling};
use occam::tensor::{ParameterSet, Shape};
use occam::utils::SeededRng;

// ============================================================================
// Data Tests
// ============================================================================

mod data_tests {
    use super::*;

    #[test]
    fn test_clusters_centred_on_axes() {
        let mut rng = SeededRng::new(1);
        let samples = data::synthetic_clusters(&mut rng, 3, 20, 4, 3.0, 0.1);
        assert_eq!(samples.len(), 60);

        for (class, group) in samples.chunks(20).enumerate() {
            let mean: f64 = group.iter().map(|s| s.features[class]).sum::<f64>() / 20.0;
            assert!((mean - 3.0).abs() < 0.2, "class {} mean {}", class, mean);
            assert!(group
                .iter()
                .all(|s| s.label.as_deref() == Some(format!("class-{}", class).as_str())));
        }
    }

    #[test]
    fn test_classes_beyond_width_use_negative_axis() {
        let mut rng = SeededRng::new(1);
        let samples = data::synthetic_clusters(&mut rng, 3, 1, 2, 5.0, 0.0);
        assert_eq!(samples[2].features, vec![-5.0, 0.0]);
    }

    #[test]
    fn test_flatten_and_labels() {
        let samples = vec![
            Sample::new(vec![1.0, 2.0], Some("a".to_string())),
            Sample::new(vec![3.0, 4.0], None),
        ];
        assert_eq!(data::flatten(&samples), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(data::labels(&samples), vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn test_normalize_leaves_zero_vectors() {
        let mut samples = vec![
            Sample::new(vec![3.0, 4.0], None),
            Sample::new(vec![0.0, 0.0], None),
        ];
        data::normalize(&mut samples);
        assert_eq!(samples[0].features, vec![0.6, 0.8]);
        assert_eq!(samples[1].features, vec![0.0, 0.0]);
    }

    #[test]
    fn test_sample_feed_loads_features() {
        let samples = vec![Sample::new(vec![1.0, 2.0], None)];
        let mut params = ParameterSet::<f32>::new();
        let input = params.add_input("input", Shape::new(2, 1)).unwrap();
        let mut feed = SampleFeed::new(&samples, "input", Sampling::WithReplacement);

        let pass = feed.load(&mut params, &mut SeededRng::new(1)).unwrap();
        assert!(pass.ranges.is_empty());
        assert_eq!(params.get(input).values, vec![1.0, 2.0]);
        assert_eq!(feed.last(), Some(0));
    }
}

// ============================================================================
// Analysis Tests
// ============================================================================

mod analysis_tests {
    use super::*;

    #[test]
    fn test_rank_orders_by_real_part() {
        assert_eq!(rank(&[0.1f32, 0.7, 0.2]), vec![1, 2, 0]);
    }

    #[test]
    fn test_overlap_counts_positions() {
        assert_eq!(overlap(&[0, 1, 2], &[0, 2, 1]), 1);
        assert_eq!(overlap(&[0, 1, 2], &[0, 1, 2]), 3);
    }

    #[test]
    fn test_nearest_neighbor_excludes_self() {
        let rankings = vec![vec![0, 1, 2], vec![2, 1, 0], vec![0, 1, 2]];
        assert_eq!(nearest_neighbor(&rankings, 0), Some(2));
        assert_eq!(nearest_neighbor(&rankings, 2), Some(0));
        assert_eq!(nearest_neighbor(&rankings[..1], 0), None);
    }

    #[test]
    fn test_agreement_fraction() {
        let rankings = vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 3, 2],
            vec![3, 2, 1, 0],
            vec![3, 2, 0, 1],
        ];
        let labels: Vec<String> = ["a", "a", "b", "a"].iter().map(|s| s.to_string()).collect();
        // 0 <-> 1 agree, 2 -> 3 disagrees, 3 -> 2 disagrees.
        assert_eq!(nearest_neighbor_agreement(&rankings, &labels), 0.5);
    }

    #[test]
    fn test_agreement_needs_two_samples() {
        assert_eq!(nearest_neighbor_agreement(&[vec![0]], &["a".to_string()]), 0.0);
    }
}
