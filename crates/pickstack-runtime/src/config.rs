//! Runtime configuration.
//!
//! Every threshold the pipeline and the grasp primitives use is externally
//! supplied: the structs below deserialise from a TOML file and can be
//! overridden per-field with `PICKSTACK_*` environment variables.  The
//! defaults describe the reference setup — a Panda arm over a 0.7 × 0.9 m
//! mat with 40 mm cubes.

use std::fs;
use std::path::Path;

use pickstack_types::{MatBounds, PickError};
use serde::{Deserialize, Serialize};

use pickstack_perception::PlaneParams;

// ────────────────────────────────────────────────────────────────────────────
// Perception
// ────────────────────────────────────────────────────────────────────────────

/// Thresholds for the filter → plane → cluster pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Voxel grid leaf size in metres.
    #[serde(default = "default_voxel_leaf_size")]
    pub voxel_leaf_size: f32,

    /// Work mat rectangle for the pass-through filter.
    #[serde(default = "default_mat_bounds")]
    pub mat_bounds: MatBounds,

    /// Height below which points are discarded as floor returns.  The mat
    /// surface sits at z = 0, so the default only cuts points leaking
    /// through it.
    #[serde(default = "default_floor_height")]
    pub floor_height: f32,

    /// Maximum RGB distance for the color filter.
    #[serde(default = "default_color_distance")]
    pub color_distance: f32,

    /// Neighbourhood size for normal estimation.
    #[serde(default = "default_normal_k")]
    pub normal_k: usize,

    /// Point-to-plane inlier threshold for the table fit.
    #[serde(default = "default_plane_distance_threshold")]
    pub plane_distance_threshold: f32,

    /// RANSAC iteration budget.
    #[serde(default = "default_plane_iterations")]
    pub plane_iterations: usize,

    /// Weight of normal/plane agreement in RANSAC scoring.
    #[serde(default = "default_plane_normal_weight")]
    pub plane_normal_weight: f32,

    /// RANSAC seed; fixed for reproducible scans.
    #[serde(default = "default_plane_seed")]
    pub plane_seed: u64,

    /// Euclidean connection distance for cluster growth.
    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f32,

    /// Clusters smaller than this are discarded as speckle.
    #[serde(default = "default_cluster_min_size")]
    pub cluster_min_size: usize,

    /// Clusters larger than this are discarded as mis-segmentation.
    #[serde(default = "default_cluster_max_size")]
    pub cluster_max_size: usize,

    /// Registry merge distance: centroids closer than this are the same
    /// physical object seen from two viewpoints.
    #[serde(default = "default_merge_tolerance")]
    pub merge_tolerance: f32,
}

impl PerceptionConfig {
    /// Bundle the plane-fit fields into the segmenter's parameter struct.
    pub fn plane_params(&self) -> PlaneParams {
        PlaneParams {
            distance_threshold: self.plane_distance_threshold,
            iterations: self.plane_iterations,
            normal_weight: self.plane_normal_weight,
            seed: self.plane_seed,
        }
    }
}

fn default_voxel_leaf_size() -> f32 {
    0.01
}
fn default_mat_bounds() -> MatBounds {
    MatBounds {
        x_min: 0.0,
        x_max: 0.7,
        y_min: -0.45,
        y_max: 0.45,
    }
}
fn default_floor_height() -> f32 {
    -0.02
}
fn default_color_distance() -> f32 {
    0.2
}
fn default_normal_k() -> usize {
    50
}
fn default_plane_distance_threshold() -> f32 {
    0.01
}
fn default_plane_iterations() -> usize {
    200
}
fn default_plane_normal_weight() -> f32 {
    0.1
}
fn default_plane_seed() -> u64 {
    42
}
fn default_cluster_distance() -> f32 {
    0.02
}
fn default_cluster_min_size() -> usize {
    50
}
fn default_cluster_max_size() -> usize {
    25_000
}
fn default_merge_tolerance() -> f32 {
    0.02
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            voxel_leaf_size: default_voxel_leaf_size(),
            mat_bounds: default_mat_bounds(),
            floor_height: default_floor_height(),
            color_distance: default_color_distance(),
            normal_k: default_normal_k(),
            plane_distance_threshold: default_plane_distance_threshold(),
            plane_iterations: default_plane_iterations(),
            plane_normal_weight: default_plane_normal_weight(),
            plane_seed: default_plane_seed(),
            cluster_distance: default_cluster_distance(),
            cluster_min_size: default_cluster_min_size(),
            cluster_max_size: default_cluster_max_size(),
            merge_tolerance: default_merge_tolerance(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scan
// ────────────────────────────────────────────────────────────────────────────

/// Viewpoint geometry for the scan passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Camera height above the mat at every viewpoint.
    #[serde(default = "default_scan_height")]
    pub scan_height: f32,

    /// X coordinate of the single front-mat viewpoint.
    #[serde(default = "default_front_x")]
    pub front_x: f32,

    /// Y coordinate of the single front-mat viewpoint.
    #[serde(default = "default_front_y")]
    pub front_y: f32,

    /// Rows of the whole-mat viewpoint grid.
    #[serde(default = "default_grid_rows")]
    pub grid_rows: usize,

    /// Columns of the whole-mat viewpoint grid.
    #[serde(default = "default_grid_cols")]
    pub grid_cols: usize,
}

fn default_scan_height() -> f32 {
    0.6
}
fn default_front_x() -> f32 {
    0.41
}
fn default_front_y() -> f32 {
    0.0
}
fn default_grid_rows() -> usize {
    2
}
fn default_grid_cols() -> usize {
    3
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_height: default_scan_height(),
            front_x: default_front_x(),
            front_y: default_front_y(),
            grid_rows: default_grid_rows(),
            grid_cols: default_grid_cols(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grasp
// ────────────────────────────────────────────────────────────────────────────

/// Constants of the pick/place primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraspConfig {
    /// Reference frame all task coordinates are expressed in.
    #[serde(default = "default_base_frame")]
    pub base_frame: String,

    /// Gripper finger separation when open, metres.
    #[serde(default = "default_gripper_open")]
    pub gripper_open: f32,

    /// Gripper finger separation when closed, metres.
    #[serde(default = "default_gripper_closed")]
    pub gripper_closed: f32,

    /// Vertical offset of the end effector above an object when grasping.
    #[serde(default = "default_z_offset")]
    pub z_offset: f32,

    /// Yaw added to every grasp so the fingers straddle the cube faces.
    #[serde(default = "default_angle_offset")]
    pub angle_offset: f32,

    /// Extra height of the approach/retreat waypoint above the grasp pose.
    #[serde(default = "default_approach_distance")]
    pub approach_distance: f32,

    /// Edge length of the cubes, metres.
    #[serde(default = "default_cube_size")]
    pub cube_size: f32,

    /// X/Y of the stack built by the same-color task.
    #[serde(default = "default_stack_location")]
    pub stack_location: [f32; 2],
}

fn default_base_frame() -> String {
    "panda_link0".to_string()
}
fn default_gripper_open() -> f32 {
    80e-3
}
fn default_gripper_closed() -> f32 {
    0.0
}
fn default_z_offset() -> f32 {
    0.125
}
fn default_angle_offset() -> f32 {
    std::f32::consts::FRAC_PI_4
}
fn default_approach_distance() -> f32 {
    0.1
}
fn default_cube_size() -> f32 {
    0.04
}
fn default_stack_location() -> [f32; 2] {
    [0.45, -0.35]
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            base_frame: default_base_frame(),
            gripper_open: default_gripper_open(),
            gripper_closed: default_gripper_closed(),
            z_offset: default_z_offset(),
            angle_offset: default_angle_offset(),
            approach_distance: default_approach_distance(),
            cube_size: default_cube_size(),
            stack_location: default_stack_location(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PickstackConfig
// ────────────────────────────────────────────────────────────────────────────

/// Root configuration for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickstackConfig {
    #[serde(default)]
    pub perception: PerceptionConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub grasp: GraspConfig,
}

impl PickstackConfig {
    /// Load the configuration from a TOML file, applying environment
    /// overrides.  A missing file yields `Ok(None)` so callers can fall
    /// back to the defaults.
    pub fn load_from(path: &Path) -> Result<Option<Self>, PickError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|e| {
            PickError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut cfg: Self = toml::from_str(&raw)
            .map_err(|e| PickError::Config(format!("failed to parse config: {e}")))?;
        cfg.apply_env_overrides();
        Ok(Some(cfg))
    }

    /// Apply `PICKSTACK_*` environment variable overrides.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `PICKSTACK_BASE_FRAME` | `grasp.base_frame` |
    /// | `PICKSTACK_VOXEL_LEAF_SIZE` | `perception.voxel_leaf_size` |
    /// | `PICKSTACK_SCAN_HEIGHT` | `scan.scan_height` |
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PICKSTACK_BASE_FRAME") {
            self.grasp.base_frame = v;
        }
        if let Ok(v) = std::env::var("PICKSTACK_VOXEL_LEAF_SIZE")
            && let Ok(leaf) = v.parse::<f32>()
        {
            self.perception.voxel_leaf_size = leaf;
        }
        if let Ok(v) = std::env::var("PICKSTACK_SCAN_HEIGHT")
            && let Ok(height) = v.parse::<f32>()
        {
            self.scan.scan_height = height;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
