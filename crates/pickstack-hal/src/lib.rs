//! `pickstack-hal` – traits for the external collaborators.
//!
//! The motion planner, the collision-scene service, and the depth camera
//! are black boxes to this workspace; these traits are the entire contract.
//! Drivers binding a real transport implement them; the [`sim`] module
//! provides in-process implementations so the full stack runs in headless
//! tests and CI without hardware.
//!
//! # Modules
//!
//! - [`motion`] – [`MotionController`][motion::MotionController]: arm moves
//!   and gripper width commands.
//! - [`scene`] – [`PlanningScene`][scene::PlanningScene]: collision-object
//!   add/attach/remove primitives.
//! - [`camera`] – [`DepthCamera`][camera::DepthCamera]: pull-based point
//!   cloud capture.
//! - [`sim`] – recording stub drivers and a synthetic cube-scene camera.

pub mod camera;
pub mod motion;
pub mod scene;
pub mod sim;

pub use camera::DepthCamera;
pub use motion::MotionController;
pub use scene::PlanningScene;
