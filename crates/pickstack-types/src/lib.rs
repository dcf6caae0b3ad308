//! `pickstack-types` – shared domain types.
//!
//! Everything that crosses a crate boundary lives here: geometry primitives
//! (stamped points, grasp poses), the cube color model, the task
//! request/response surface exposed to the external transport layer, and the
//! workspace-wide error enum.
//!
//! # Modules
//!
//! - [`geometry`] – [`StampedPoint`], [`Quaternion`], [`Pose`], and the mat
//!   work-area bounds used by the pass-through filter.
//! - [`color`] – [`Rgba`][color::Rgba] averaged color samples and the
//!   enumerated [`PaletteColor`][color::PaletteColor] the tasks classify
//!   against.
//! - [`task`] – request/response types for the three task invocations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod color;
pub mod geometry;
pub mod task;

pub use color::{PaletteColor, Rgba};
pub use geometry::{distance, MatBounds, Pose, Quaternion, StampedPoint};
pub use task::{
    DetectRequest, DetectResponse, ObjectReport, PickPlaceRequest, PickPlaceResponse,
    StackRequest, StackResponse,
};

/// Global error type spanning external action failures, empty perception
/// results, and configuration problems.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PickError {
    /// An external move/grip/scene primitive reported failure.  Aborts the
    /// current task strategy; no retries.
    #[error("Action '{action}' failed: {details}")]
    ActionFailed { action: String, details: String },

    /// The perception pipeline produced zero usable objects where the task
    /// required at least one.
    #[error("no objects detected in the scanned area")]
    NothingDetected,

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PickError {
    /// Shorthand constructor for [`PickError::ActionFailed`].
    pub fn action(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            details: details.into(),
        }
    }
}
