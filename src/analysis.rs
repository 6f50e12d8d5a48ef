//! Nearest-neighbour label agreement over attention rankings.
//!
//! Each sample is summarized by the order in which it ranks the learned
//! points (highest attention first). Two samples are neighbours when their
//! rankings place the same point at the same position most often.

use crate::tensor::Element;
use std::cmp::Ordering;

/// Indices of `attention` sorted by descending value (real part).
pub fn rank<T: Element>(attention: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..attention.len()).collect();
    order.sort_by(|&a, &b| {
        attention[b]
            .re()
            .partial_cmp(&attention[a].re())
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Number of positions at which two rankings hold the same index.
pub fn overlap(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x == y).count()
}

/// Index of the ranking most similar to `rankings[i]`, excluding itself.
///
/// Ties go to the lowest index.
pub fn nearest_neighbor(rankings: &[Vec<usize>], i: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (j, other) in rankings.iter().enumerate() {
        if j == i {
            continue;
        }
        let score = overlap(&rankings[i], other);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((j, score));
        }
    }
    best.map(|(j, _)| j)
}

/// Fraction of samples whose nearest neighbour carries the same label.
pub fn nearest_neighbor_agreement(rankings: &[Vec<usize>], labels: &[String]) -> f64 {
    if rankings.len() < 2 {
        return 0.0;
    }
    let agreeing = (0..rankings.len())
        .filter(|&i| {
            nearest_neighbor(rankings, i).map_or(false, |j| labels.get(i) == labels.get(j))
        })
        .count();
    agreeing as f64 / rankings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_descending() {
        assert_eq!(rank(&[0.1f32, 0.7, 0.2]), vec![1, 2, 0]);
    }

    #[test]
    fn test_agreement_with_identical_rankings_per_label() {
        let rankings = vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 2, 3],
            vec![3, 2, 1, 0],
            vec![3, 2, 1, 0],
        ];
        let labels: Vec<String> = ["a", "a", "b", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(nearest_neighbor_agreement(&rankings, &labels), 1.0);
    }
}
