//! Planning-scene collision objects.

use pickstack_types::PickError;

/// The external collision-scene collaborator.
///
/// Objects are cuboids identified by name; adding a name that already
/// exists replaces the previous object.  `yaw` is the rotation of the box
/// about the vertical axis.
pub trait PlanningScene: Send + Sync {
    /// Add a static collision box to the scene.
    fn add_box(
        &mut self,
        name: &str,
        center: [f32; 3],
        dimensions: [f32; 3],
        yaw: f32,
    ) -> Result<(), PickError>;

    /// Add a collision box attached to the end effector, so the carried
    /// object is accounted for while the arm moves.
    fn add_attached_box(
        &mut self,
        name: &str,
        center: [f32; 3],
        dimensions: [f32; 3],
        yaw: f32,
    ) -> Result<(), PickError>;

    /// Remove a named object (static or attached) from the scene.
    /// Removing an unknown name is a no-op.
    fn remove_object(&mut self, name: &str) -> Result<(), PickError>;
}
