//! Transform types for block and element rotations.

use super::Axis;
use serde::{Deserialize, Serialize};

/// Block-level transform from a blockstate variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransform {
    /// X rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Y rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Z rotation in degrees; not used by vanilla data but carried through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    /// If true, UV coordinates don't rotate with the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvlock: Option<bool>,
}

impl BlockTransform {
    /// Check if this is an identity transform (no rotation).
    pub fn is_identity(&self) -> bool {
        self.x.unwrap_or(0) == 0 && self.y.unwrap_or(0) == 0 && self.z.unwrap_or(0) == 0
    }
}

/// Element-level rotation from a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Origin point for rotation (in 0-16 Minecraft coordinates).
    #[serde(default = "default_origin")]
    pub origin: [f32; 3],
    /// Axis to rotate around.
    pub axis: Axis,
    /// Rotation angle in degrees (-45 to 45, in 22.5 increments).
    pub angle: f32,
    /// Whether to rescale the element after rotation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rescale: bool,
}

fn default_origin() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert!(BlockTransform::default().is_identity());
        let rotated = BlockTransform {
            y: Some(90),
            ..Default::default()
        };
        assert!(!rotated.is_identity());
    }

    #[test]
    fn test_rotation_defaults() {
        let rotation: ElementRotation =
            serde_json::from_str(r#"{"axis": "y", "angle": 45}"#).unwrap();
        assert_eq!(rotation.origin, [8.0, 8.0, 8.0]);
        assert!(!rotation.rescale);
    }
}
