//! Table-plane segmentation.
//!
//! A seeded RANSAC fit: sample three distinct points, fit the plane through
//! them, and score by inlier count.  When per-point normals are available
//! each inlier's vote is weighted by how well its normal agrees with the
//! candidate plane normal, which keeps noisy cube-edge points from dragging
//! the fit off the table surface.

use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::debug;

use crate::cloud::PointCloud;

// ────────────────────────────────────────────────────────────────────────────
// PlaneModel
// ────────────────────────────────────────────────────────────────────────────

/// A plane in Hessian normal form `n · x + d = 0` with `n` a unit vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneModel {
    pub normal: [f32; 3],
    pub d: f32,
}

impl PlaneModel {
    /// Absolute distance from `point` to the plane.
    #[inline]
    pub fn distance_to(&self, point: &[f32; 3]) -> f32 {
        (self.normal[0] * point[0]
            + self.normal[1] * point[1]
            + self.normal[2] * point[2]
            + self.d)
            .abs()
    }
}

impl Default for PlaneModel {
    fn default() -> Self {
        Self {
            normal: [0.0, 0.0, 1.0],
            d: 0.0,
        }
    }
}

/// Tuning knobs for the RANSAC fit; all externally configured.
#[derive(Debug, Clone, Copy)]
pub struct PlaneParams {
    /// Maximum point-to-plane distance for a point to count as an inlier.
    pub distance_threshold: f32,
    /// Number of random three-point samples to evaluate.
    pub iterations: usize,
    /// Weight in `[0, 1]` given to normal/plane agreement when scoring a
    /// candidate: `0` scores by plain inlier count, `1` purely by normal
    /// alignment.
    pub normal_weight: f32,
    /// RNG seed; a fixed seed keeps scan results reproducible.
    pub seed: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Segmentation
// ────────────────────────────────────────────────────────────────────────────

/// Fit the dominant plane and return its model plus inlier indices.
///
/// `normals` is the per-point normal field from
/// [`estimate_normals`][crate::normals::estimate_normals]; pass an empty
/// slice (or one of the wrong length) to score by plain inlier counting.
///
/// Fewer than three points cannot define a plane: the result is the default
/// model with an empty inlier set, not an error.
pub fn segment_plane(
    cloud: &PointCloud,
    normals: &[[f32; 3]],
    params: &PlaneParams,
) -> (PlaneModel, Vec<usize>) {
    let n = cloud.len();
    if n < 3 {
        return (PlaneModel::default(), Vec::new());
    }

    let points: Vec<[f32; 3]> = cloud.iter_points().collect();
    let normals = (normals.len() == n).then_some(normals);
    let weight = params.normal_weight.clamp(0.0, 1.0);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best_model = PlaneModel::default();
    let mut best_score = 0.0f64;
    let mut best_count = 0usize;

    for iter in 0..params.iterations {
        let Some((i0, i1, i2)) = sample_three_distinct(n, &mut rng) else {
            continue;
        };
        let Some(model) = plane_through(&points[i0], &points[i1], &points[i2]) else {
            continue;
        };

        let mut score = 0.0f64;
        let mut count = 0usize;
        for (j, p) in points.iter().enumerate() {
            if model.distance_to(p) > params.distance_threshold {
                continue;
            }
            count += 1;
            let agreement = match normals {
                Some(ns) => {
                    let dot = ns[j][0] * model.normal[0]
                        + ns[j][1] * model.normal[1]
                        + ns[j][2] * model.normal[2];
                    dot.abs() as f64
                }
                None => 1.0,
            };
            score += (1.0 - weight as f64) + weight as f64 * agreement;
        }

        if score > best_score {
            best_score = score;
            best_count = count;
            best_model = model;

            // Adaptive early termination once the inlier ratio makes the
            // remaining iterations statistically pointless.
            let w = best_count as f64 / n as f64;
            if w > 0.5 {
                let needed = (1.0 - 0.999f64).ln() / (1.0 - w.powi(3)).ln();
                if (iter as f64) > needed {
                    break;
                }
            }
        }
    }

    let inliers: Vec<usize> = (0..n)
        .filter(|&j| best_model.distance_to(&points[j]) <= params.distance_threshold)
        .collect();

    debug!(
        total = n,
        inliers = inliers.len(),
        normal = ?best_model.normal,
        "plane segmentation"
    );
    (best_model, inliers)
}

/// Return the complement of the plane inliers: the working cloud for the
/// clustering stage.  The plane points themselves are discarded.
pub fn remove_plane(cloud: &PointCloud, inliers: &[usize]) -> PointCloud {
    cloud.select_inverse(inliers)
}

fn sample_three_distinct(n: usize, rng: &mut StdRng) -> Option<(usize, usize, usize)> {
    if n < 3 {
        return None;
    }
    let i0 = rng.gen_range(0..n);
    let mut i1 = rng.gen_range(0..n);
    let mut attempts = 0;
    while i1 == i0 {
        if attempts > 100 {
            return None;
        }
        i1 = rng.gen_range(0..n);
        attempts += 1;
    }
    let mut i2 = rng.gen_range(0..n);
    attempts = 0;
    while i2 == i0 || i2 == i1 {
        if attempts > 100 {
            return None;
        }
        i2 = rng.gen_range(0..n);
        attempts += 1;
    }
    Some((i0, i1, i2))
}

/// Plane through three points, or `None` when they are collinear.
fn plane_through(p0: &[f32; 3], p1: &[f32; 3], p2: &[f32; 3]) -> Option<PlaneModel> {
    let v1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
    let v2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];

    let nx = v1[1] * v2[2] - v1[2] * v2[1];
    let ny = v1[2] * v2[0] - v1[0] * v2[2];
    let nz = v1[0] * v2[1] - v1[1] * v2[0];

    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len < 1e-10 {
        return None;
    }

    let normal = [nx / len, ny / len, nz / len];
    let d = -(normal[0] * p0[0] + normal[1] * p0[1] + normal[2] * p0[2]);
    Some(PlaneModel { normal, d })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
