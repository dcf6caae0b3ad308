//! Geometry primitives for the tabletop workspace.
//!
//! The perception pipeline works on raw `[f32; 3]` coordinates; the only
//! rotation the pick task ever needs is a yaw about the vertical axis
//! composed with the fixed downward-facing gripper roll, so the quaternion
//! type here stays deliberately small.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// StampedPoint
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D point tagged with the reference frame it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedPoint {
    pub point: [f32; 3],
    /// Name of the reference frame, e.g. `"panda_link0"`.
    pub frame_id: String,
}

impl StampedPoint {
    /// Create a stamped point.
    pub fn new(point: [f32; 3], frame_id: impl Into<String>) -> Self {
        Self {
            point,
            frame_id: frame_id.into(),
        }
    }

    /// Euclidean distance to a raw coordinate.  Frames are not checked; the
    /// caller is responsible for comparing points in the same frame.
    pub fn distance_to(&self, other: &[f32; 3]) -> f32 {
        distance(&self.point, other)
    }
}

/// Euclidean distance between two coordinates.
pub fn distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// A rotation of `yaw` radians about the vertical (+Z) axis.
    pub fn from_yaw(yaw: f32) -> Self {
        let half = yaw * 0.5;
        Self::new(half.cos(), 0.0, 0.0, half.sin())
    }

    /// A rotation of π about the X axis: the gripper-down flip used for
    /// every tabletop approach.
    pub fn flip_down() -> Self {
        Self::new(0.0, 1.0, 0.0, 0.0)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body pose: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub orientation: Quaternion,
}

impl Pose {
    /// Create a pose from a position and orientation.
    pub fn new(position: [f32; 3], orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The gripper-down pose used for scanning and grasping: fingers facing
    /// the mat, rotated by `yaw` about the vertical axis.
    pub fn facing_down(position: [f32; 3], yaw: f32) -> Self {
        Self::new(position, Quaternion::from_yaw(yaw).mul(Quaternion::flip_down()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MatBounds
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned x/y rectangle delimiting the work mat.  Points outside are
/// discarded by the pass-through filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl MatBounds {
    /// True when `(x, y)` lies inside or on the boundary of the mat.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Centre of the mat rectangle.
    pub fn centre(&self) -> (f32, f32) {
        (
            (self.x_min + self.x_max) * 0.5,
            (self.y_min + self.y_max) * 0.5,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_1_SQRT_2};

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]) - 5.0).abs() < 1e-6);
        assert_eq!(distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn stamped_point_distance() {
        let p = StampedPoint::new([1.0, 0.0, 0.0], "panda_link0");
        assert!((p.distance_to(&[1.0, 1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(p.frame_id, "panda_link0");
    }

    #[test]
    fn quaternion_from_yaw_90deg() {
        let q = Quaternion::from_yaw(FRAC_PI_2);
        assert!((q.w - FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((q.z - FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(q.x.abs() < 1e-6);
        assert!(q.y.abs() < 1e-6);
    }

    #[test]
    fn quaternion_identity_mul_is_noop() {
        let q = Quaternion::from_yaw(0.3);
        let r = Quaternion::identity().mul(q);
        assert!((r.w - q.w).abs() < 1e-6);
        assert!((r.z - q.z).abs() < 1e-6);
    }

    #[test]
    fn facing_down_pose_is_unit_quaternion() {
        let pose = Pose::facing_down([0.4, 0.0, 0.5], 0.7);
        let q = pose.orientation;
        let norm = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn facing_down_zero_yaw_is_pure_flip() {
        let pose = Pose::facing_down([0.0, 0.0, 0.0], 0.0);
        let q = pose.orientation;
        assert!(q.w.abs() < 1e-6);
        assert!((q.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mat_bounds_contains_boundary_and_interior() {
        let mat = MatBounds {
            x_min: 0.0,
            x_max: 1.0,
            y_min: -0.5,
            y_max: 0.5,
        };
        assert!(mat.contains(0.5, 0.0));
        assert!(mat.contains(0.0, -0.5));
        assert!(!mat.contains(1.1, 0.0));
        assert!(!mat.contains(0.5, 0.6));
    }

    #[test]
    fn mat_bounds_centre() {
        let mat = MatBounds {
            x_min: 0.2,
            x_max: 0.6,
            y_min: -0.4,
            y_max: 0.4,
        };
        let (cx, cy) = mat.centre();
        assert!((cx - 0.4).abs() < 1e-6);
        assert!(cy.abs() < 1e-6);
    }

    #[test]
    fn pose_serialization_roundtrip() {
        let pose = Pose::facing_down([0.3, 0.1, 0.6], 0.2);
        let json = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert_eq!(pose, back);
    }
}
