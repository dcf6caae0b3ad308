//! In-process simulation drivers for CI/CD testing without hardware.
//!
//! [`SimArm`] and [`SimScene`] record every command they receive so tests
//! can assert on exact call sequences; [`SimTable`] renders a synthetic
//! tabletop scene (mat plane plus colored cubes as dense point grids) and
//! serves it as camera captures.  Together they let the full scan/pick stack
//! run headless.
//!
//! # Example
//!
//! ```rust
//! use pickstack_hal::sim::{SimArm, SimTable};
//! use pickstack_hal::{DepthCamera, MotionController};
//! use pickstack_types::{MatBounds, Pose, Rgba};
//!
//! let mut arm = SimArm::new();
//! arm.move_to(&Pose::facing_down([0.4, 0.0, 0.5], 0.0)).unwrap();
//! assert_eq!(arm.moves.len(), 1);
//!
//! let mat = MatBounds { x_min: 0.0, x_max: 0.8, y_min: -0.45, y_max: 0.45 };
//! let mut camera = SimTable::new("panda_link0", mat)
//!     .with_cube([0.3, 0.1], 0.04, Rgba::new(1.0, 0.0, 0.0, 1.0));
//! let cloud = camera.capture().unwrap();
//! assert!(!cloud.is_empty());
//! ```

use pickstack_perception::PointCloud;
use pickstack_types::{MatBounds, PickError, Pose, Rgba};
use tracing::debug;

use crate::camera::DepthCamera;
use crate::motion::MotionController;
use crate::scene::PlanningScene;

// ────────────────────────────────────────────────────────────────────────────
// SimArm
// ────────────────────────────────────────────────────────────────────────────

/// A simulated arm that records every commanded pose and gripper width.
///
/// By default every command succeeds; [`fail_after_moves`][Self::fail_after_moves]
/// scripts a failure so tests can exercise abort paths.
#[derive(Debug, Default)]
pub struct SimArm {
    /// Every pose passed to `move_to`, in order.
    pub moves: Vec<Pose>,
    /// Every width passed to `set_gripper`, in order.
    pub gripper_widths: Vec<f32>,
    fail_after_moves: Option<usize>,
}

impl SimArm {
    /// Create an arm that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a failure: the first `n` moves succeed, every later move
    /// returns [`PickError::ActionFailed`].  Gripper commands still succeed.
    pub fn fail_after_moves(mut self, n: usize) -> Self {
        self.fail_after_moves = Some(n);
        self
    }
}

impl MotionController for SimArm {
    fn move_to(&mut self, target: &Pose) -> Result<(), PickError> {
        if let Some(limit) = self.fail_after_moves {
            if self.moves.len() >= limit {
                return Err(PickError::action(
                    "move_to",
                    format!("scripted failure after {limit} moves"),
                ));
            }
        }
        debug!(position = ?target.position, "sim arm move");
        self.moves.push(*target);
        Ok(())
    }

    fn set_gripper(&mut self, width_m: f32) -> Result<(), PickError> {
        self.gripper_widths.push(width_m);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimScene
// ────────────────────────────────────────────────────────────────────────────

/// One collision box as recorded by [`SimScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBox {
    pub name: String,
    pub center: [f32; 3],
    pub dimensions: [f32; 3],
    pub yaw: f32,
}

/// A simulated planning scene that records add/attach/remove calls.
#[derive(Debug, Default)]
pub struct SimScene {
    /// Static boxes currently in the scene.
    pub boxes: Vec<SceneBox>,
    /// Boxes currently attached to the end effector.
    pub attached: Vec<SceneBox>,
    /// Every name ever passed to `remove_object`, in order.
    pub removed: Vec<String>,
}

impl SimScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a static or attached box with `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.boxes.iter().any(|b| b.name == name)
            || self.attached.iter().any(|b| b.name == name)
    }
}

impl PlanningScene for SimScene {
    fn add_box(
        &mut self,
        name: &str,
        center: [f32; 3],
        dimensions: [f32; 3],
        yaw: f32,
    ) -> Result<(), PickError> {
        self.boxes.retain(|b| b.name != name);
        self.boxes.push(SceneBox {
            name: name.to_string(),
            center,
            dimensions,
            yaw,
        });
        Ok(())
    }

    fn add_attached_box(
        &mut self,
        name: &str,
        center: [f32; 3],
        dimensions: [f32; 3],
        yaw: f32,
    ) -> Result<(), PickError> {
        self.attached.retain(|b| b.name != name);
        self.attached.push(SceneBox {
            name: name.to_string(),
            center,
            dimensions,
            yaw,
        });
        Ok(())
    }

    fn remove_object(&mut self, name: &str) -> Result<(), PickError> {
        self.boxes.retain(|b| b.name != name);
        self.attached.retain(|b| b.name != name);
        self.removed.push(name.to_string());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimTable
// ────────────────────────────────────────────────────────────────────────────

/// One synthetic cube resting on the mat.
#[derive(Debug, Clone, Copy)]
struct SimCube {
    center_xy: [f32; 2],
    size: f32,
    color: Rgba,
}

/// A simulated depth camera serving a fixed tabletop scene.
///
/// Every capture renders the same world-frame cloud: the mat surface at
/// `z = 0` as a grid of grey points, plus the top and side faces of each
/// configured cube.  Rendering is deterministic so test scans are exactly
/// repeatable.
#[derive(Debug)]
pub struct SimTable {
    frame_id: String,
    mat: MatBounds,
    /// Grid spacing of the rendered mat surface.
    mat_step: f32,
    cubes: Vec<SimCube>,
}

impl SimTable {
    /// Create an empty table covering `mat`, reported in `frame_id`.
    pub fn new(frame_id: impl Into<String>, mat: MatBounds) -> Self {
        Self {
            frame_id: frame_id.into(),
            mat,
            mat_step: 0.01,
            cubes: Vec::new(),
        }
    }

    /// Place a cube of side `size` with its base centred at `center_xy` on
    /// the mat.
    pub fn with_cube(mut self, center_xy: [f32; 2], size: f32, color: Rgba) -> Self {
        self.cubes.push(SimCube {
            center_xy,
            size,
            color,
        });
        self
    }

    fn render(&self) -> PointCloud {
        let mut cloud = PointCloud::in_frame(self.frame_id.clone());
        let mat_grey = Rgba::new(0.4, 0.4, 0.4, 1.0);

        // Tiny deterministic per-point z jitter.  A real camera never
        // reports thousands of points at bit-identical heights, and the
        // spatial index degenerates on large runs of identical axis values.
        let mut salt = 0u32;
        let mut jitter = move || {
            salt = salt.wrapping_add(1);
            salt as f32 * 1e-7
        };

        // Mat surface.
        let mut x = self.mat.x_min;
        while x <= self.mat.x_max {
            let mut y = self.mat.y_min;
            while y <= self.mat.y_max {
                cloud.push([x, y, jitter()], Some(mat_grey));
                y += self.mat_step;
            }
            x += self.mat_step;
        }

        // Cube faces: top plus the four sides, sampled at an eighth of the
        // cube edge.
        for cube in &self.cubes {
            let [cx, cy] = cube.center_xy;
            let half = cube.size * 0.5;
            let step = cube.size / 8.0;

            let mut u = -half;
            while u <= half {
                let mut v = -half;
                while v <= half {
                    // Top face.
                    cloud.push([cx + u, cy + v, cube.size + jitter()], Some(cube.color));
                    // Sides; v spans height here.
                    let h = v + half;
                    if h > 0.0 {
                        cloud.push([cx - half, cy + u, h + jitter()], Some(cube.color));
                        cloud.push([cx + half, cy + u, h + jitter()], Some(cube.color));
                        cloud.push([cx + u, cy - half, h + jitter()], Some(cube.color));
                        cloud.push([cx + u, cy + half, h + jitter()], Some(cube.color));
                    }
                    v += step;
                }
                u += step;
            }
        }

        cloud
    }
}

impl DepthCamera for SimTable {
    fn capture(&mut self) -> Result<PointCloud, PickError> {
        let cloud = self.render();
        debug!(points = cloud.len(), cubes = self.cubes.len(), "sim capture");
        Ok(cloud)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
