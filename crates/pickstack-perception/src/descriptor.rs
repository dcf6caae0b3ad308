//! Cube description: one record per detected cluster.
//!
//! The yaw estimate uses extreme-corner geometry and deliberately assumes an
//! axis-aligned rectangular cube resting flat on the mat: of the cluster's
//! max-x point and max-y point, whichever lies farther from the centroid in
//! the horizontal plane is taken as a corner, and the yaw is the `atan2` of
//! its offset, wrapped into `[-π/4, π/4)` because a cube is symmetric under
//! 90° rotation.  This is **not** a general orientation estimator; arbitrary
//! shapes need a minimum-bounding-box or principal-axis method instead.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use pickstack_types::{Rgba, StampedPoint};

use crate::cloud::PointCloud;

/// Everything the task layer needs to know about one detected cube.
/// Immutable once computed.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeDescriptor {
    /// Mean of the member points, in the cloud's declared frame.
    pub centroid: StampedPoint,
    /// Minimum corner of the axis-aligned bounding box.
    pub min: [f32; 3],
    /// Maximum corner of the axis-aligned bounding box.
    pub max: [f32; 3],
    /// Per-channel mean of the member colors.
    pub color: Rgba,
    /// Number of color samples behind `color`; zero for geometry-only
    /// clouds.  Kept so registry merging can re-average exactly.
    pub color_samples: usize,
    /// Estimated yaw about the vertical axis, wrapped to `[-π/4, π/4)`.
    pub yaw: f32,
}

/// Compute the descriptor of one cluster, or `None` for an empty cluster
/// (degenerate geometry is a no-op, not an error).
pub fn describe_cube(cloud: &PointCloud, cluster: &[usize]) -> Option<CubeDescriptor> {
    if cluster.is_empty() {
        return None;
    }

    let count = cluster.len() as f32;
    let mut sum = [0.0f32; 3];
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    // Track the full coordinates of the points achieving the x and y maxima.
    let mut max_x_pt = cloud.point(cluster[0]);
    let mut max_y_pt = cloud.point(cluster[0]);

    let mut color_sum = Rgba::default();
    let mut color_samples = 0usize;

    for &idx in cluster {
        let p = cloud.point(idx);
        for axis in 0..3 {
            sum[axis] += p[axis];
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
        if p[0] > max_x_pt[0] {
            max_x_pt = p;
        }
        if p[1] > max_y_pt[1] {
            max_y_pt = p;
        }
        if let Some(c) = cloud.color(idx) {
            color_sum.r += c.r;
            color_sum.g += c.g;
            color_sum.b += c.b;
            color_sum.a += c.a;
            color_samples += 1;
        }
    }

    let centroid = [sum[0] / count, sum[1] / count, sum[2] / count];
    let color = if color_samples > 0 {
        let n = color_samples as f32;
        Rgba::new(
            color_sum.r / n,
            color_sum.g / n,
            color_sum.b / n,
            color_sum.a / n,
        )
    } else {
        Rgba::default()
    };

    Some(CubeDescriptor {
        centroid: StampedPoint::new(centroid, cloud.frame_id.clone()),
        min,
        max,
        color,
        color_samples,
        yaw: corner_yaw(&centroid, &max_x_pt, &max_y_pt),
    })
}

/// Yaw from the farther of the two extreme corners.  Ties (both corners
/// equidistant from the centroid) resolve to the max-x corner.
fn corner_yaw(centroid: &[f32; 3], max_x_pt: &[f32; 3], max_y_pt: &[f32; 3]) -> f32 {
    let dist_xy = |p: &[f32; 3]| {
        let dx = p[0] - centroid[0];
        let dy = p[1] - centroid[1];
        dx * dx + dy * dy
    };

    let corner = if dist_xy(max_y_pt) > dist_xy(max_x_pt) {
        max_y_pt
    } else {
        max_x_pt
    };

    wrap_yaw((corner[1] - centroid[1]).atan2(corner[0] - centroid[0]))
}

/// Wrap an angle into the canonical `[-π/4, π/4)` range.
///
/// A cube looks identical under 90° rotations, so every yaw has four
/// equivalent values; this picks the one nearest zero.
pub fn wrap_yaw(angle: f32) -> f32 {
    let mut wrapped = angle.rem_euclid(FRAC_PI_2);
    if wrapped >= FRAC_PI_4 {
        wrapped -= FRAC_PI_2;
    }
    wrapped
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
