//! Task strategies.
//!
//! Three strategies share the scan/aggregate/dedupe pipeline and differ only
//! in selection and action policy: fixed pick-place, detect-and-report, and
//! same-color stacking.  Every strategy builds its own fresh [`ScanContext`]
//! before the first capture, and any failed sub-action aborts the remaining
//! sequence; success is only reported when every constituent move, grip,
//! and place succeeded.

use chrono::Utc;
use pickstack_hal::{DepthCamera, MotionController, PlanningScene};
use pickstack_types::{
    DetectRequest, DetectResponse, ObjectReport, PaletteColor, PickError, PickPlaceRequest,
    PickPlaceResponse, Pose, StackRequest, StackResponse,
};
use tracing::{info, warn};

use crate::config::PickstackConfig;
use crate::scan::{
    entire_mat_viewpoints, front_mat_viewpoints, RegistryEntry, ScanContext, ScanOrchestrator,
};

/// Name of the attached collision box representing the cube in the gripper.
const CARRIED_OBJECT: &str = "carried_cube";

/// Executes task requests against the external collaborators.
///
/// Borrows the arm, scene, and camera exclusively for its lifetime: at most
/// one task runs at a time and all scan state is owned by that task's call
/// chain.
pub struct TaskExecutor<'a, M, S, C>
where
    M: MotionController,
    S: PlanningScene,
    C: DepthCamera,
{
    arm: &'a mut M,
    scene: &'a mut S,
    camera: &'a mut C,
    config: &'a PickstackConfig,
}

impl<'a, M, S, C> TaskExecutor<'a, M, S, C>
where
    M: MotionController,
    S: PlanningScene,
    C: DepthCamera,
{
    pub fn new(
        arm: &'a mut M,
        scene: &'a mut S,
        camera: &'a mut C,
        config: &'a PickstackConfig,
    ) -> Self {
        Self {
            arm,
            scene,
            camera,
            config,
        }
    }

    // ── Strategies ──────────────────────────────────────────────────────────

    /// Pick the cube nearest the requested location and place it at the
    /// goal.
    pub fn pick_and_place(
        &mut self,
        req: &PickPlaceRequest,
    ) -> Result<PickPlaceResponse, PickError> {
        info!(pick = ?req.pick_location, goal = ?req.goal_location, "pick-and-place task");

        let mut ctx = ScanContext::new();
        ScanOrchestrator::new(self.arm, self.camera, self.config)
            .scan(&mut ctx, &front_mat_viewpoints(self.config))?;

        let target = nearest_entry(ctx.registry.entries(), &req.pick_location)
            .ok_or(PickError::NothingDetected)?
            .clone();
        info!(id = %target.id, position = ?target.position, "selected pick target");

        self.pick(target.position, target.yaw)?;
        self.place(req.goal_location, 0.0)?;

        Ok(PickPlaceResponse { success: true })
    }

    /// Scan, classify, and report without manipulation.  An empty table is
    /// a successful empty response.
    pub fn detect(&mut self, _req: &DetectRequest) -> Result<DetectResponse, PickError> {
        info!("detect task");

        let mut ctx = ScanContext::new();
        ScanOrchestrator::new(self.arm, self.camera, self.config)
            .scan(&mut ctx, &front_mat_viewpoints(self.config))?;

        let objects = ctx
            .registry
            .entries()
            .iter()
            .map(|entry| ObjectReport {
                id: entry.id,
                position: entry.position,
                color: PaletteColor::classify(entry.color),
                observed_at: Utc::now(),
            })
            .collect();

        Ok(DetectResponse { objects })
    }

    /// Scan the whole mat and stack every cube of the requested color at
    /// the configured stack location, one cube height higher per cube.
    pub fn stack_same_color(&mut self, req: &StackRequest) -> Result<StackResponse, PickError> {
        info!(color = %req.color, "same-color stacking task");

        let mut ctx = ScanContext::new();
        ScanOrchestrator::new(self.arm, self.camera, self.config)
            .scan(&mut ctx, &entire_mat_viewpoints(self.config))?;

        let (targets, obstacles): (Vec<RegistryEntry>, Vec<RegistryEntry>) = ctx
            .registry
            .entries()
            .iter()
            .cloned()
            .partition(|entry| PaletteColor::classify(entry.color) == req.color);

        if targets.is_empty() {
            warn!(color = %req.color, "no cubes of requested color on the mat");
            return Err(PickError::NothingDetected);
        }

        let cube = self.config.grasp.cube_size;
        let [stack_x, stack_y] = self.config.grasp.stack_location;

        // Everything we are not going to move is an obstacle the external
        // planner must route around.
        for (i, entry) in obstacles.iter().enumerate() {
            self.scene.add_box(
                &format!("obstacle_{i}"),
                [entry.position[0], entry.position[1], cube * 0.5],
                [cube, cube, cube],
                entry.yaw,
            )?;
        }

        let mut stack_height = 0.0f32;
        let mut stacked = 0usize;
        for entry in &targets {
            info!(id = %entry.id, stacked, "picking cube for stack");
            self.pick(entry.position, entry.yaw)?;
            self.place([stack_x, stack_y, stack_height], 0.0)?;

            // The deposited cube becomes a static collision object at its
            // level in the stack.
            self.scene.add_box(
                &format!("stacked_{stacked}"),
                [stack_x, stack_y, stack_height + cube * 0.5],
                [cube, cube, cube],
                0.0,
            )?;

            stack_height += cube;
            stacked += 1;
        }

        info!(stacked, "stack complete");
        Ok(StackResponse {
            success: true,
            cubes_stacked: stacked,
        })
    }

    // ── Pick/place primitives ───────────────────────────────────────────────

    /// Grasp the object at `position`: approach from above, open, descend,
    /// close, attach the carried-cube collision box, retreat.
    fn pick(&mut self, position: [f32; 3], yaw: f32) -> Result<(), PickError> {
        let g = &self.config.grasp;
        let grasp_yaw = yaw + g.angle_offset;
        let grasp_z = position[2] + g.z_offset;

        let approach = Pose::facing_down(
            [position[0], position[1], grasp_z + g.approach_distance],
            grasp_yaw,
        );
        let grasp = Pose::facing_down([position[0], position[1], grasp_z], grasp_yaw);

        self.arm.move_to(&approach)?;
        self.arm.set_gripper(g.gripper_open)?;
        self.arm.move_to(&grasp)?;
        self.arm.set_gripper(g.gripper_closed)?;
        self.scene.add_attached_box(
            CARRIED_OBJECT,
            position,
            [g.cube_size, g.cube_size, g.cube_size],
            yaw,
        )?;
        self.arm.move_to(&approach)?;
        Ok(())
    }

    /// Release the carried object at `position`: approach from above,
    /// descend, open, detach the carried-cube collision box, retreat.
    fn place(&mut self, position: [f32; 3], yaw: f32) -> Result<(), PickError> {
        let g = &self.config.grasp;
        let drop_yaw = yaw + g.angle_offset;
        let drop_z = position[2] + g.z_offset;

        let approach = Pose::facing_down(
            [position[0], position[1], drop_z + g.approach_distance],
            drop_yaw,
        );
        let drop = Pose::facing_down([position[0], position[1], drop_z], drop_yaw);

        self.arm.move_to(&approach)?;
        self.arm.move_to(&drop)?;
        self.arm.set_gripper(g.gripper_open)?;
        self.scene.remove_object(CARRIED_OBJECT)?;
        self.arm.move_to(&approach)?;
        Ok(())
    }
}

/// Registry entry nearest to `location` in the horizontal plane.
fn nearest_entry<'e>(
    entries: &'e [RegistryEntry],
    location: &[f32; 3],
) -> Option<&'e RegistryEntry> {
    entries.iter().min_by(|a, b| {
        let da = xy_distance_sq(&a.position, location);
        let db = xy_distance_sq(&b.position, location);
        da.total_cmp(&db)
    })
}

fn xy_distance_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
