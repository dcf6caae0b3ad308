//! Per-point surface normal estimation.
//!
//! For each point the `k` nearest neighbours are gathered, their covariance
//! matrix built, and the eigenvector of the smallest eigenvalue taken as the
//! local surface normal.  Normals are unit length and oriented toward the
//! sensor viewpoint so the table plane gets a consistent orientation
//! regardless of which side the fit lands on.

use crate::cloud::PointCloud;
use crate::spatial::KdTree;

/// Estimate one unit surface normal per point using k-NN covariance
/// analysis, oriented toward `viewpoint`.
///
/// Degenerate inputs (empty cloud, `k == 0`) yield an empty vector; a
/// neighbourhood whose covariance is rank-deficient falls back to the +Z
/// axis rather than failing.
pub fn estimate_normals(cloud: &PointCloud, k: usize, viewpoint: [f32; 3]) -> Vec<[f32; 3]> {
    if cloud.is_empty() || k == 0 {
        return Vec::new();
    }

    let tree = KdTree::build(cloud);
    let points: Vec<[f32; 3]> = cloud.iter_points().collect();

    points
        .iter()
        .map(|point| {
            let neighbours = tree.knn_indices(point, k);
            let mut normal = neighbourhood_normal(&points, &neighbours);

            // Flip toward the viewpoint.
            let to_view = [
                viewpoint[0] - point[0],
                viewpoint[1] - point[1],
                viewpoint[2] - point[2],
            ];
            let dot =
                normal[0] * to_view[0] + normal[1] * to_view[1] + normal[2] * to_view[2];
            if dot < 0.0 {
                normal = [-normal[0], -normal[1], -normal[2]];
            }
            normal
        })
        .collect()
}

/// Covariance of a neighbourhood packed as
/// `[c00, c01, c02, c11, c12, c22]`, then its smallest-eigenvalue
/// eigenvector.
fn neighbourhood_normal(points: &[[f32; 3]], neighbours: &[usize]) -> [f32; 3] {
    if neighbours.is_empty() {
        return [0.0, 0.0, 1.0];
    }

    let count = neighbours.len() as f32;
    let mut centroid = [0.0f32; 3];
    for &idx in neighbours {
        centroid[0] += points[idx][0];
        centroid[1] += points[idx][1];
        centroid[2] += points[idx][2];
    }
    centroid[0] /= count;
    centroid[1] /= count;
    centroid[2] /= count;

    let mut cov = [0.0f32; 6];
    for &idx in neighbours {
        let dx = points[idx][0] - centroid[0];
        let dy = points[idx][1] - centroid[1];
        let dz = points[idx][2] - centroid[2];
        cov[0] += dx * dx;
        cov[1] += dx * dy;
        cov[2] += dx * dz;
        cov[3] += dy * dy;
        cov[4] += dy * dz;
        cov[5] += dz * dz;
    }

    let mut n = smallest_eigenvector(&cov);
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-10 {
        n[0] /= len;
        n[1] /= len;
        n[2] /= len;
    }
    n
}

/// Eigenvector of the smallest eigenvalue of a symmetric 3×3 matrix packed
/// as `[a00, a01, a02, a11, a12, a22]`.
///
/// The eigenvalues come from Cardano's closed-form solution of the
/// characteristic polynomial; the eigenvector is the null-space direction of
/// `A - λI`, obtained as the cross product of two of its rows.  The
/// computation runs in f64 for numerical stability.
fn smallest_eigenvector(cov: &[f32; 6]) -> [f32; 3] {
    let [a00, a01, a02, a11, a12, a22] = cov.map(|v| v as f64);

    // Shift by the mean of the diagonal so the trace of B is zero.
    let m = (a00 + a11 + a22) / 3.0;
    let b00 = a00 - m;
    let b11 = a11 - m;
    let b22 = a22 - m;

    // Half the determinant of B and one sixth of its squared Frobenius norm.
    let q = (b00 * (b11 * b22 - a12 * a12) - a01 * (a01 * b22 - a12 * a02)
        + a02 * (a01 * a12 - b11 * a02))
        / 2.0;
    let p = (b00 * b00 + b11 * b11 + b22 * b22
        + 2.0 * (a01 * a01 + a02 * a02 + a12 * a12))
        / 6.0;
    let p = p.max(0.0);

    if p < 1e-30 {
        // Scalar multiple of identity: every direction is an eigenvector.
        return [0.0, 0.0, 1.0];
    }

    let phi = (q / (p * p.sqrt())).clamp(-1.0, 1.0).acos() / 3.0;
    let sqrt_p = p.sqrt();
    let eig_small = m + 2.0 * sqrt_p * (phi + 2.0 * std::f64::consts::FRAC_PI_3).cos();
    let eig_large = m + 2.0 * sqrt_p * phi.cos();
    let eig_mid = 3.0 * m - eig_small - eig_large;

    let lambda = if eig_small.abs() <= eig_mid.abs() && eig_small.abs() <= eig_large.abs() {
        eig_small
    } else if eig_mid.abs() <= eig_large.abs() {
        eig_mid
    } else {
        eig_large
    };

    // Rows of A - λI; any two independent rows cross to the eigenvector.
    let rows = [
        [a00 - lambda, a01, a02],
        [a01, a11 - lambda, a12],
        [a02, a12, a22 - lambda],
    ];
    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        let e = cross(&rows[i], &rows[j]);
        let len_sq = e[0] * e[0] + e[1] * e[1] + e[2] * e[2];
        if len_sq >= 1e-30 {
            let inv = 1.0 / len_sq.sqrt();
            return [(e[0] * inv) as f32, (e[1] * inv) as f32, (e[2] * inv) as f32];
        }
    }

    [0.0, 0.0, 1.0]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Grid on the z≈0 plane.  A tiny deterministic z perturbation keeps the
    /// k-d tree from degenerating on identical axis values.
    fn table_cloud(grid: usize, spacing: f32) -> PointCloud {
        let mut cloud = PointCloud::new();
        let mut idx = 0u32;
        for i in 0..grid {
            for j in 0..grid {
                cloud.push(
                    [i as f32 * spacing, j as f32 * spacing, idx as f32 * 1e-7],
                    None,
                );
                idx += 1;
            }
        }
        cloud
    }

    #[test]
    fn table_normals_point_up() {
        let cloud = table_cloud(10, 0.01);
        // Sensor above the table, as during a scan.
        let normals = estimate_normals(&cloud, 10, [0.05, 0.05, 0.5]);
        assert_eq!(normals.len(), cloud.len());
        for (i, n) in normals.iter().enumerate() {
            assert!(
                n[2] > 0.9,
                "normal {i} should face up toward the sensor, got {n:?}"
            );
        }
    }

    #[test]
    fn viewpoint_below_flips_normals() {
        let cloud = table_cloud(10, 0.01);
        let normals = estimate_normals(&cloud, 10, [0.05, 0.05, -0.5]);
        for n in &normals {
            assert!(n[2] < -0.9, "normal should face down, got {n:?}");
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let cloud = table_cloud(6, 0.01);
        let normals = estimate_normals(&cloud, 8, [0.0, 0.0, 1.0]);
        for n in &normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert_abs_diff_eq!(len, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn empty_cloud_and_zero_k_yield_empty() {
        assert!(estimate_normals(&PointCloud::new(), 10, [0.0; 3]).is_empty());

        let cloud = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]);
        assert!(estimate_normals(&cloud, 0, [0.0; 3]).is_empty());
    }

    #[test]
    fn single_point_does_not_panic() {
        let cloud = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]);
        let normals = estimate_normals(&cloud, 5, [0.0; 3]);
        assert_eq!(normals.len(), 1);
        let n = normals[0];
        assert!(n.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn smallest_eigenvector_of_flat_covariance() {
        // Covariance of a flat xy-distribution: variance in x and y, none
        // in z.  Smallest eigenvalue belongs to the z axis.
        let n = smallest_eigenvector(&[2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert!(n[2].abs() > 0.99, "expected ±z, got {n:?}");
    }

    #[test]
    fn smallest_eigenvector_of_degenerate_matrix() {
        let n = smallest_eigenvector(&[0.0; 6]);
        assert_eq!(n, [0.0, 0.0, 1.0]);
    }
}
