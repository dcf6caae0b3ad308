//! Task invocation surface.
//!
//! The surrounding transport layer (out of scope here) delivers these
//! requests and returns the responses; `schemars` derives let it publish
//! JSON schemas for the wire contract without this crate knowing anything
//! about framing.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::PaletteColor;

/// Request for the fixed pick-and-place task: pick the cube nearest
/// `pick_location` and deposit it at `goal_location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PickPlaceRequest {
    pub pick_location: [f32; 3],
    pub goal_location: [f32; 3],
}

/// Response for the fixed pick-and-place task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PickPlaceResponse {
    pub success: bool,
}

/// Request for the detect-and-report task.  Carries no parameters; the scan
/// area is configured, not requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectRequest {}

/// One detected object as reported by the detect task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectReport {
    /// Stable identity of the registry entry the report was produced from.
    pub id: Uuid,
    /// World-frame position of the object centroid.
    pub position: [f32; 3],
    /// Classified palette color.
    pub color: PaletteColor,
    /// When the report was generated.
    pub observed_at: DateTime<Utc>,
}

/// Response for the detect-and-report task.  An empty `objects` list is a
/// valid, successful result (empty table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectResponse {
    pub objects: Vec<ObjectReport>,
}

/// Request for the multi-object same-color stacking task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StackRequest {
    /// Every detected cube of this color is stacked.
    pub color: PaletteColor,
}

/// Response for the stacking task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StackResponse {
    pub success: bool,
    /// Number of cubes deposited on the stack.
    pub cubes_stacked: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_place_request_roundtrip() {
        let req = PickPlaceRequest {
            pick_location: [0.4, 0.1, 0.0],
            goal_location: [0.4, -0.3, 0.0],
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: PickPlaceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn stack_request_uses_lowercase_color() {
        let req = StackRequest {
            color: PaletteColor::Blue,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"color":"blue"}"#);
    }

    #[test]
    fn object_report_roundtrip() {
        let report = ObjectReport {
            id: Uuid::new_v4(),
            position: [0.3, 0.1, 0.02],
            color: PaletteColor::Red,
            observed_at: Utc::now(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ObjectReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.id, back.id);
        assert_eq!(report.color, back.color);
    }

    #[test]
    fn detect_response_defaults_to_empty() {
        let resp = DetectResponse::default();
        assert!(resp.objects.is_empty());
    }

    #[test]
    fn schemas_are_generated() {
        // The transport layer publishes these; make sure derivation holds
        // together for the nested types.
        let schema = schemars::schema_for!(DetectResponse);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("objects"));
    }
}
