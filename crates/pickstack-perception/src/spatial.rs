//! K-d tree spatial index.
//!
//! Thin wrapper around kiddo's `ImmutableKdTree` exposing the two queries
//! the pipeline needs: k-nearest-neighbour index lookup (normal estimation)
//! and boundary-inclusive radius search (cluster growth).  The tree is built
//! once per cloud and stores `u32` indices back into it.

use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use std::num::NonZero;

use crate::cloud::PointCloud;

/// Spatial index over one [`PointCloud`].
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    num_points: usize,
}

impl KdTree {
    /// Build the index from a cloud.  Points are copied into a contiguous
    /// slice and handed to kiddo, which builds a balanced tree in one pass.
    pub fn build(cloud: &PointCloud) -> Self {
        if cloud.is_empty() {
            return Self {
                tree: ImmutableKdTree::new_from_slice(&[]),
                num_points: 0,
            };
        }

        let points: Vec<[f32; 3]> = cloud.iter_points().collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            num_points: cloud.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// Indices of the `k` points nearest to `query`, nearest first.
    ///
    /// Returns an empty vector when `k == 0`, the tree is empty, or the
    /// query contains non-finite values; when `k` exceeds the point count,
    /// every index is returned.
    pub fn knn_indices(&self, query: &[f32; 3], k: usize) -> Vec<usize> {
        if k == 0 || self.is_empty() || !query.iter().all(|v| v.is_finite()) {
            return Vec::new();
        }

        let k = NonZero::new(k).unwrap();
        self.tree
            .nearest_n::<SquaredEuclidean>(query, k)
            .iter()
            .map(|nn| nn.item as usize)
            .collect()
    }

    /// Indices of every point within `radius` (inclusive) of `query`,
    /// sorted ascending for deterministic output.
    ///
    /// kiddo's `within_unsorted` uses a strict `<` comparison; to keep
    /// points exactly on the boundary we widen the query by an epsilon and
    /// post-filter with `<=`.
    pub fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let widened = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, widened)
            .into_iter()
            .filter(|nn| nn.distance <= radius_sq)
            .map(|nn| nn.item as usize)
            .collect();

        indices.sort_unstable();
        indices
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::KdTree;
    use crate::cloud::PointCloud;
    use proptest::prelude::*;

    #[test]
    fn knn_returns_nearest_first() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 1.0, 2.0, 10.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        );
        let tree = KdTree::build(&cloud);
        let idx = tree.knn_indices(&[0.2, 0.0, 0.0], 2);
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn knn_empty_tree_and_zero_k() {
        let tree = KdTree::build(&PointCloud::new());
        assert!(tree.knn_indices(&[0.0, 0.0, 0.0], 5).is_empty());

        let cloud = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]);
        let tree = KdTree::build(&cloud);
        assert!(tree.knn_indices(&[0.0, 0.0, 0.0], 0).is_empty());
    }

    #[test]
    fn knn_nan_query_is_rejected() {
        let cloud = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]);
        let tree = KdTree::build(&cloud);
        assert!(tree.knn_indices(&[f32::NAN, 0.0, 0.0], 1).is_empty());
    }

    #[test]
    fn knn_k_larger_than_cloud_returns_all() {
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0, 2.0], vec![0.0; 3], vec![0.0; 3]);
        let tree = KdTree::build(&cloud);
        assert_eq!(tree.knn_indices(&[0.0, 0.0, 0.0], 100).len(), 3);
    }

    #[test]
    fn radius_search_includes_boundary() {
        let cloud = PointCloud::from_xyz(vec![1.0, 5.0], vec![0.0; 2], vec![0.0; 2]);
        let tree = KdTree::build(&cloud);
        let idx = tree.radius_search(&[0.0, 0.0, 0.0], 1.0);
        assert!(idx.contains(&0), "boundary point must be included: {idx:?}");
        assert!(!idx.contains(&1));
    }

    #[test]
    fn radius_search_rejects_bad_inputs() {
        let cloud = PointCloud::from_xyz(vec![0.0], vec![0.0], vec![0.0]);
        let tree = KdTree::build(&cloud);
        assert!(tree.radius_search(&[0.0, 0.0, 0.0], -1.0).is_empty());
        assert!(tree.radius_search(&[0.0, 0.0, 0.0], f32::NAN).is_empty());
        assert!(tree.radius_search(&[f32::NAN, 0.0, 0.0], 1.0).is_empty());
    }

    #[test]
    fn radius_search_output_is_sorted() {
        let cloud = PointCloud::from_xyz(
            vec![0.3, 0.1, 0.2, 0.4],
            vec![0.0; 4],
            vec![0.0; 4],
        );
        let tree = KdTree::build(&cloud);
        let idx = tree.radius_search(&[0.0, 0.0, 0.0], 1.0);
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn radius_search_results_are_within_radius(
            pts in prop::collection::vec(
                (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
                1..100
            ),
            radius in 0.1f32..5.0,
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let tree = KdTree::build(&cloud);
            for &i in &tree.radius_search(&[0.0, 0.0, 0.0], radius) {
                let (x, y, z) = pts[i];
                let dist = (x * x + y * y + z * z).sqrt();
                prop_assert!(dist <= radius + f32::EPSILON * 10.0);
            }
        }

        #[test]
        fn knn_returns_at_most_k(
            pts in prop::collection::vec(
                (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
                1..100
            ),
            k in 1usize..20,
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let tree = KdTree::build(&cloud);
            let idx = tree.knn_indices(&[0.0, 0.0, 0.0], k);
            prop_assert!(idx.len() <= k);
            prop_assert!(idx.len() <= pts.len());
        }
    }
}
