//! Euclidean cluster extraction.
//!
//! After table removal, whatever points remain belong to objects.  Points
//! closer than the distance threshold are treated as connected; each
//! connected component becomes one candidate object.
//!
//! # Example
//!
//! ```rust
//! use pickstack_perception::{extract_clusters, PointCloud};
//!
//! // Two pairs of points, 0.5 m apart.
//! let cloud = PointCloud::from_xyz(
//!     vec![0.0, 0.01, 0.5, 0.51],
//!     vec![0.0; 4],
//!     vec![0.0; 4],
//! );
//! let clusters = extract_clusters(&cloud, 0.02, 2, 100);
//! assert_eq!(clusters.len(), 2);
//! ```

use std::collections::VecDeque;

use tracing::debug;

use crate::cloud::PointCloud;
use crate::spatial::KdTree;

/// Group the plane-removed cloud into connected components under
/// `distance_threshold`, discarding components smaller than `min_size` or
/// larger than `max_size`.
///
/// Indices inside each cluster are sorted ascending and clusters are
/// returned largest first, but callers must not attach meaning to the
/// cluster order: it is a function of point order and traversal order, and
/// objects should only ever be selected by their own geometric or color
/// predicates.
pub fn extract_clusters(
    cloud: &PointCloud,
    distance_threshold: f32,
    min_size: usize,
    max_size: usize,
) -> Vec<Vec<usize>> {
    if cloud.is_empty() || distance_threshold <= 0.0 || min_size == 0 {
        return Vec::new();
    }

    let tree = KdTree::build(cloud);
    let n = cloud.len();
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }

        let mut cluster = Vec::new();
        let mut frontier = VecDeque::new();
        frontier.push_back(seed);
        visited[seed] = true;

        while let Some(current) = frontier.pop_front() {
            cluster.push(current);
            if cluster.len() > max_size {
                break;
            }

            let query = cloud.point(current);
            for neighbour in tree.radius_search(&query, distance_threshold) {
                if !visited[neighbour] {
                    visited[neighbour] = true;
                    frontier.push_back(neighbour);
                }
            }
        }

        if cluster.len() >= min_size && cluster.len() <= max_size {
            cluster.sort_unstable();
            clusters.push(cluster);
        }
    }

    clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
    debug!(points = n, clusters = clusters.len(), "cluster extraction");
    clusters
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
