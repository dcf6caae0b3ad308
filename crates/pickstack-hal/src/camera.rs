//! Depth camera capture.

use pickstack_perception::PointCloud;
use pickstack_types::PickError;

/// The point-cloud source.
///
/// Capture is pull-based: the orchestrator calls [`capture`][Self::capture]
/// only after a viewpoint move has completed, so every returned frame
/// belongs to exactly one viewpoint and stale mid-motion frames cannot be
/// consumed.  The returned cloud is tagged with the frame its coordinates
/// are expressed in.
pub trait DepthCamera: Send + Sync {
    /// Block until the next frame is available and return it.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::ActionFailed`] when no frame can be produced
    /// (device disconnected, driver fault).
    fn capture(&mut self) -> Result<PointCloud, PickError>;
}
