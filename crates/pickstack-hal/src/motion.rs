//! Arm motion and gripper control.

use pickstack_types::{PickError, Pose};

/// The external motion-execution collaborator: plans and executes a move to
/// a target pose, and drives the gripper fingers to a width.
///
/// Calls are synchronous and blocking: when `move_to` returns `Ok`, the arm
/// has finished moving, which is what lets the orchestrator associate
/// exactly one capture with each completed viewpoint move.
pub trait MotionController: Send + Sync {
    /// Move the arm so the end effector reaches `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::ActionFailed`] when planning or execution fails;
    /// the caller aborts its remaining sequence.
    fn move_to(&mut self, target: &Pose) -> Result<(), PickError>;

    /// Drive the gripper fingers to `width_m` metres apart.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::ActionFailed`] when the gripper does not reach
    /// the commanded width.
    fn set_gripper(&mut self, width_m: f32) -> Result<(), PickError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-process controller used only for this module's tests;
    /// the real test doubles live in [`crate::sim`].
    struct NoopArm {
        last_width: f32,
    }

    impl MotionController for NoopArm {
        fn move_to(&mut self, _target: &Pose) -> Result<(), PickError> {
            Ok(())
        }

        fn set_gripper(&mut self, width_m: f32) -> Result<(), PickError> {
            self.last_width = width_m;
            Ok(())
        }
    }

    #[test]
    fn trait_object_dispatch() {
        let mut arm: Box<dyn MotionController> = Box::new(NoopArm { last_width: 0.0 });
        arm.move_to(&Pose::facing_down([0.4, 0.0, 0.5], 0.0)).unwrap();
        arm.set_gripper(0.08).unwrap();
    }
}
