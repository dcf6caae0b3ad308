//! Scan orchestration: viewpoints, per-capture pipeline, aggregation.
//!
//! A scan pass drives the arm to a sequence of viewpoints; after each
//! completed move exactly one capture is taken and pushed through the
//! perception pipeline, and the resulting cube descriptors are merged into
//! a deduplicated world-frame [`ObjectRegistry`].
//!
//! All scan state lives in a [`ScanContext`] created fresh at every task
//! entry point.  That construction is the reset guarantee: a task cannot
//! observe descriptors left over from a previous invocation, because the
//! context holding them no longer exists.

use pickstack_hal::{DepthCamera, MotionController};
use pickstack_perception::{
    describe_cube, estimate_normals, extract_clusters, floor_filter, pass_through,
    remove_plane, segment_plane, voxel_downsample, wrap_yaw, CubeDescriptor, PointCloud,
};
use pickstack_types::{distance, PickError, Pose, Rgba};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PickstackConfig;

// ────────────────────────────────────────────────────────────────────────────
// Viewpoints
// ────────────────────────────────────────────────────────────────────────────

/// One named arm pose a capture is taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    pub name: String,
    pub pose: Pose,
}

impl Viewpoint {
    fn above(name: impl Into<String>, x: f32, y: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            pose: Pose::facing_down([x, y, height], 0.0),
        }
    }
}

/// The single front-of-mat viewpoint used by pick-place and detect.
pub fn front_mat_viewpoints(config: &PickstackConfig) -> Vec<Viewpoint> {
    let scan = &config.scan;
    vec![Viewpoint::above(
        "front_mat",
        scan.front_x,
        scan.front_y,
        scan.scan_height,
    )]
}

/// A row-major grid of viewpoints covering the whole mat, used by the
/// stacking task.  Grid cells are centred inside the mat bounds so the
/// outermost viewpoints do not hang over the edge.
pub fn entire_mat_viewpoints(config: &PickstackConfig) -> Vec<Viewpoint> {
    let mat = &config.perception.mat_bounds;
    let scan = &config.scan;
    let rows = scan.grid_rows.max(1);
    let cols = scan.grid_cols.max(1);

    let dx = (mat.x_max - mat.x_min) / rows as f32;
    let dy = (mat.y_max - mat.y_min) / cols as f32;

    let mut viewpoints = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let x = mat.x_min + dx * (r as f32 + 0.5);
            let y = mat.y_min + dy * (c as f32 + 0.5);
            viewpoints.push(Viewpoint::above(
                format!("mat_{r}_{c}"),
                x,
                y,
                scan.scan_height,
            ));
        }
    }
    viewpoints
}

// ────────────────────────────────────────────────────────────────────────────
// ScanRecord / ObjectRegistry / ScanContext
// ────────────────────────────────────────────────────────────────────────────

/// Raw per-capture results accumulated over one scan pass.
#[derive(Debug, Clone, Default)]
pub struct ScanRecord {
    /// Every descriptor produced during the pass, in capture order.
    pub descriptors: Vec<CubeDescriptor>,
    /// Number of captures processed, including empty ones.
    pub captures: usize,
}

impl ScanRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
        self.captures = 0;
    }
}

/// One deduplicated physical object, merged across viewpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Stable identity, kept across merges.
    pub id: Uuid,
    /// World-frame centroid, observation-weighted.
    pub position: [f32; 3],
    pub min: [f32; 3],
    pub max: [f32; 3],
    /// Averaged color over every contributing point sample.
    pub color: Rgba,
    pub color_samples: usize,
    pub yaw: f32,
    /// How many descriptors were merged into this entry.
    pub observations: usize,
}

/// Deduplicated world-frame object list.
///
/// A descriptor whose centroid lies within the merge tolerance of an
/// existing entry is the same physical object seen again: its position is
/// folded into the running mean and its color re-averaged from the combined
/// sample counts.  Anything farther away becomes a new entry.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    entries: Vec<RegistryEntry>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge one descriptor into the registry under `tolerance`.
    pub fn merge(&mut self, desc: &CubeDescriptor, tolerance: f32) {
        let existing = self
            .entries
            .iter_mut()
            .find(|e| distance(&e.position, &desc.centroid.point) < tolerance);

        match existing {
            Some(entry) => {
                let prev = entry.observations as f32;
                let total = prev + 1.0;
                for axis in 0..3 {
                    entry.position[axis] =
                        (entry.position[axis] * prev + desc.centroid.point[axis]) / total;
                    entry.min[axis] = entry.min[axis].min(desc.min[axis]);
                    entry.max[axis] = entry.max[axis].max(desc.max[axis]);
                }

                // Re-average color from the combined per-point sample
                // counts, so two viewpoints with unequal coverage still
                // produce the mean over all points.
                let combined = entry.color_samples + desc.color_samples;
                if combined > 0 {
                    let w_old = entry.color_samples as f32;
                    let w_new = desc.color_samples as f32;
                    let inv = 1.0 / combined as f32;
                    entry.color = Rgba::new(
                        (entry.color.r * w_old + desc.color.r * w_new) * inv,
                        (entry.color.g * w_old + desc.color.g * w_new) * inv,
                        (entry.color.b * w_old + desc.color.b * w_new) * inv,
                        (entry.color.a * w_old + desc.color.a * w_new) * inv,
                    );
                    entry.color_samples = combined;
                }

                entry.yaw = wrap_yaw((entry.yaw * prev + desc.yaw) / total);
                entry.observations += 1;
                debug!(id = %entry.id, observations = entry.observations, "merged observation");
            }
            None => {
                self.entries.push(RegistryEntry {
                    id: Uuid::new_v4(),
                    position: desc.centroid.point,
                    min: desc.min,
                    max: desc.max,
                    color: desc.color,
                    color_samples: desc.color_samples,
                    yaw: desc.yaw,
                    observations: 1,
                });
            }
        }
    }
}

/// All mutable scan state for one task invocation.
///
/// Constructed empty at every task entry point; stale data from a previous
/// task cannot leak in because nothing persists between contexts.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    pub record: ScanRecord,
    pub registry: ObjectRegistry,
}

impl ScanContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the context for explicit mid-task reuse.
    pub fn clear(&mut self) {
        self.record.clear();
        self.registry.clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ScanOrchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Progress of the current scan pass, exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    MovingToViewpoint,
    Capturing,
    Aggregating,
    Done,
}

/// Drives one scan pass: move, capture, aggregate, repeat.
///
/// Moves and captures are blocking request/response calls on the HAL
/// traits, so a capture is only ever requested after its viewpoint move has
/// completed; the frame/viewpoint association needs no callback wiring.
pub struct ScanOrchestrator<'a, M: MotionController, C: DepthCamera> {
    arm: &'a mut M,
    camera: &'a mut C,
    config: &'a PickstackConfig,
    state: ScanState,
}

impl<'a, M: MotionController, C: DepthCamera> ScanOrchestrator<'a, M, C> {
    pub fn new(arm: &'a mut M, camera: &'a mut C, config: &'a PickstackConfig) -> Self {
        Self {
            arm,
            camera,
            config,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run one full scan pass over `viewpoints`, accumulating into `ctx`.
    ///
    /// A failed move aborts the remaining viewpoints and surfaces the
    /// error; a capture with zero detected clusters is a valid empty
    /// observation and the pass continues.
    pub fn scan(
        &mut self,
        ctx: &mut ScanContext,
        viewpoints: &[Viewpoint],
    ) -> Result<(), PickError> {
        for viewpoint in viewpoints {
            self.state = ScanState::MovingToViewpoint;
            if let Err(e) = self.arm.move_to(&viewpoint.pose) {
                warn!(viewpoint = %viewpoint.name, error = %e, "move failed, aborting scan");
                self.state = ScanState::Idle;
                return Err(e);
            }

            self.state = ScanState::Capturing;
            let cloud = self.camera.capture()?;

            self.state = ScanState::Aggregating;
            let found = self.process_capture(ctx, &cloud, viewpoint.pose.position);
            info!(
                viewpoint = %viewpoint.name,
                clusters = found,
                registry = ctx.registry.len(),
                "viewpoint processed"
            );
        }

        self.state = ScanState::Done;
        Ok(())
    }

    /// Run the filter → plane → cluster → describe pipeline on one capture
    /// and fold the results into `ctx`.  Returns the number of clusters
    /// described.
    pub fn process_capture(
        &self,
        ctx: &mut ScanContext,
        cloud: &PointCloud,
        sensor: [f32; 3],
    ) -> usize {
        let p = &self.config.perception;

        let working = voxel_downsample(cloud, p.voxel_leaf_size);
        let working = pass_through(&working, &p.mat_bounds);
        let working = floor_filter(&working, p.floor_height);

        ctx.record.captures += 1;
        if working.is_empty() {
            debug!("capture empty after filtering");
            return 0;
        }

        let normals = estimate_normals(&working, p.normal_k, sensor);
        let (_, inliers) = segment_plane(&working, &normals, &p.plane_params());
        let objects = remove_plane(&working, &inliers);

        let clusters = extract_clusters(
            &objects,
            p.cluster_distance,
            p.cluster_min_size,
            p.cluster_max_size,
        );

        let mut found = 0;
        for cluster in &clusters {
            if let Some(desc) = describe_cube(&objects, cluster) {
                ctx.registry.merge(&desc, p.merge_tolerance);
                ctx.record.descriptors.push(desc);
                found += 1;
            }
        }
        found
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
