//! Cloud filter stages.
//!
//! Each filter takes the input cloud by reference and returns a new cloud in
//! the same frame.  An empty input is a degenerate success everywhere: the
//! result is simply an empty cloud, never an error.

use std::collections::HashMap;

use pickstack_types::{MatBounds, Rgba};
use tracing::debug;

use crate::cloud::PointCloud;

// ────────────────────────────────────────────────────────────────────────────
// Voxel grid
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    sx: f32,
    sy: f32,
    sz: f32,
    sr: f32,
    sg: f32,
    sb: f32,
    sa: f32,
    n: usize,
}

/// Downsample by averaging all points (and colors) that fall into the same
/// cubic voxel of side `leaf_size`.  Non-finite points are skipped; output
/// points are emitted in voxel-key order so the result is deterministic.
///
/// # Panics
///
/// Panics if `leaf_size` is not a positive finite number.
pub fn voxel_downsample(cloud: &PointCloud, leaf_size: f32) -> PointCloud {
    assert!(
        leaf_size.is_finite() && leaf_size > 0.0,
        "leaf_size must be > 0 and finite"
    );

    if cloud.is_empty() {
        return PointCloud::in_frame(cloud.frame_id.clone());
    }

    let mut bins: HashMap<(i32, i32, i32), VoxelAccum> = HashMap::new();
    for i in 0..cloud.len() {
        let [px, py, pz] = cloud.point(i);
        if !px.is_finite() || !py.is_finite() || !pz.is_finite() {
            continue;
        }

        let key = (
            (px / leaf_size).floor() as i32,
            (py / leaf_size).floor() as i32,
            (pz / leaf_size).floor() as i32,
        );

        let entry = bins.entry(key).or_default();
        entry.sx += px;
        entry.sy += py;
        entry.sz += pz;
        if let Some(c) = cloud.color(i) {
            entry.sr += c.r;
            entry.sg += c.g;
            entry.sb += c.b;
            entry.sa += c.a;
        }
        entry.n += 1;
    }

    let mut keys: Vec<(i32, i32, i32)> = bins.keys().copied().collect();
    keys.sort_unstable();

    let mut out = PointCloud::in_frame(cloud.frame_id.clone());
    let colored = cloud.colors.is_some();
    for key in keys {
        let a = &bins[&key];
        let denom = a.n as f32;
        let color = colored
            .then(|| Rgba::new(a.sr / denom, a.sg / denom, a.sb / denom, a.sa / denom));
        out.push([a.sx / denom, a.sy / denom, a.sz / denom], color);
    }

    debug!(before = cloud.len(), after = out.len(), "voxel downsample");
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Pass-through
// ────────────────────────────────────────────────────────────────────────────

/// Keep only the points whose x/y coordinates fall inside the work mat
/// rectangle.  Restricts attention to the mat before any heavier stage runs.
pub fn pass_through(cloud: &PointCloud, bounds: &MatBounds) -> PointCloud {
    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| {
            let [x, y, _] = cloud.point(i);
            x.is_finite() && y.is_finite() && bounds.contains(x, y)
        })
        .collect();

    debug!(before = cloud.len(), after = keep.len(), "pass-through");
    cloud.select(&keep)
}

// ────────────────────────────────────────────────────────────────────────────
// Conditional removal
// ────────────────────────────────────────────────────────────────────────────

/// Remove everything at or below `floor_height`: the mat surface and any
/// points leaking through it.  Keeps points with `z > floor_height`.
pub fn floor_filter(cloud: &PointCloud, floor_height: f32) -> PointCloud {
    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| {
            let z = cloud.z[i];
            z.is_finite() && z > floor_height
        })
        .collect();

    debug!(before = cloud.len(), after = keep.len(), "floor filter");
    cloud.select(&keep)
}

/// Keep only points whose RGB distance to `reference` is at most
/// `max_distance`.  A geometry-only cloud has nothing to match, so the
/// result is an empty cloud.
pub fn color_filter(cloud: &PointCloud, reference: Rgba, max_distance: f32) -> PointCloud {
    let Some(colors) = cloud.colors.as_ref() else {
        return PointCloud::in_frame(cloud.frame_id.clone());
    };

    let max_sq = max_distance * max_distance;
    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| colors[i].distance_sq_rgb(&reference) <= max_sq)
        .collect();

    debug!(before = cloud.len(), after = keep.len(), "color filter");
    cloud.select(&keep)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mat() -> MatBounds {
        MatBounds {
            x_min: 0.0,
            x_max: 1.0,
            y_min: -0.5,
            y_max: 0.5,
        }
    }

    #[test]
    fn voxel_empty_cloud_returns_empty() {
        let out = voxel_downsample(&PointCloud::in_frame("panda_link0"), 0.01);
        assert!(out.is_empty());
        assert_eq!(out.frame_id, "panda_link0");
    }

    #[test]
    fn voxel_averages_points_in_one_leaf() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 0.5, 0.0, 0.5],
            vec![0.0, 0.0, 0.5, 0.5],
            vec![0.0, 0.0, 0.0, 0.0],
        );
        let out = voxel_downsample(&cloud, 1.0);
        assert_eq!(out.len(), 1);
        assert!((out.x[0] - 0.25).abs() < 1e-6);
        assert!((out.y[0] - 0.25).abs() < 1e-6);
        assert_eq!(out.z[0], 0.0);
    }

    #[test]
    fn voxel_averages_colors() {
        let cloud = PointCloud::from_xyz(vec![0.1, 0.2], vec![0.1, 0.2], vec![0.0, 0.0])
            .with_colors(vec![
                Rgba::new(1.0, 0.0, 0.0, 1.0),
                Rgba::new(0.0, 1.0, 0.0, 1.0),
            ]);
        let out = voxel_downsample(&cloud, 1.0);
        assert_eq!(out.len(), 1);
        let c = out.color(0).unwrap();
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn voxel_skips_non_finite_points() {
        let cloud = PointCloud::from_xyz(
            vec![0.1, f32::NAN],
            vec![0.1, 0.0],
            vec![0.0, 0.0],
        );
        let out = voxel_downsample(&cloud, 1.0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn pass_through_keeps_mat_points() {
        let cloud = PointCloud::from_xyz(
            vec![0.5, 1.5, 0.5, -0.1],
            vec![0.0, 0.0, 0.8, 0.0],
            vec![0.0; 4],
        );
        let out = pass_through(&cloud, &mat());
        assert_eq!(out.len(), 1);
        assert_eq!(out.point(0), [0.5, 0.0, 0.0]);
    }

    #[test]
    fn pass_through_empty_cloud() {
        assert!(pass_through(&PointCloud::new(), &mat()).is_empty());
    }

    #[test]
    fn floor_filter_removes_surface_points() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.02, 0.05],
        );
        let out = floor_filter(&cloud, 0.02);
        // z must be strictly above the threshold
        assert_eq!(out.len(), 1);
        assert_eq!(out.z, vec![0.05]);
    }

    #[test]
    fn color_filter_keeps_matching_points() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2])
            .with_colors(vec![
                Rgba::new(0.95, 0.05, 0.0, 1.0),
                Rgba::new(0.0, 0.0, 1.0, 1.0),
            ]);
        let out = color_filter(&cloud, red, 0.2);
        assert_eq!(out.len(), 1);
        assert_eq!(out.x, vec![0.0]);
    }

    #[test]
    fn color_filter_on_geometry_only_cloud_is_empty() {
        let cloud = PointCloud::from_xyz(vec![0.0], vec![0.0], vec![0.0]);
        let out = color_filter(&cloud, Rgba::new(1.0, 0.0, 0.0, 1.0), 0.5);
        assert!(out.is_empty());
    }

    proptest! {
        #[test]
        fn voxel_never_increases_point_count(
            pts in prop::collection::vec(
                (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
                1..500
            ),
            leaf in 0.01f32..2.0,
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let out = voxel_downsample(&cloud, leaf);
            prop_assert!(out.len() <= cloud.len());
        }

        #[test]
        fn pass_through_result_stays_in_bounds(
            pts in prop::collection::vec(
                (-2.0f32..2.0, -2.0f32..2.0, -2.0f32..2.0),
                0..200
            ),
        ) {
            let bounds = mat();
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let out = pass_through(&cloud, &bounds);
            for i in 0..out.len() {
                prop_assert!(bounds.contains(out.x[i], out.y[i]));
            }
        }
    }
}
