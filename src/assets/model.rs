//! Block model parsing.
//!
//! Block models define the geometry of blocks and items using cuboid
//! elements. A model may inherit from a parent; everything it does not
//! define itself comes from the parent chain.

use crate::types::ElementRotation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed block model from models/*.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockModel {
    /// Parent model to inherit from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Texture variable definitions, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub textures: IndexMap<String, String>,

    /// Model elements. An explicit empty list still overrides the parent's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ModelElement>>,

    #[serde(
        default,
        rename = "ambientocclusion",
        skip_serializing_if = "Option::is_none"
    )]
    pub ambient_occlusion: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ao: Option<bool>,

    /// Display transforms for item rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,

    /// Any other top-level field (gui_light, overrides, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockModel {
    /// Check if this model has its own elements (not inherited).
    pub fn has_elements(&self) -> bool {
        self.elements.is_some()
    }

    /// Model names referenced by legacy item `overrides`.
    pub fn override_models(&self) -> Vec<&str> {
        self.extra
            .get("overrides")
            .and_then(Value::as_array)
            .map(|overrides| {
                overrides
                    .iter()
                    .filter_map(|o| o.get("model").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A cuboid element within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    /// Minimum corner (0-16 range).
    pub from: [f32; 3],
    /// Maximum corner (0-16 range).
    pub to: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade: Option<bool>,
    /// Face definitions keyed by face name. Vanilla uses the six
    /// directions, older packs also use names like "side" or "top".
    #[serde(default)]
    pub faces: IndexMap<String, ModelFace>,
}

impl ModelElement {
    /// True when the element spans the whole block.
    pub fn is_full_cube(&self) -> bool {
        self.from == [0.0, 0.0, 0.0] && self.to == [16.0, 16.0, 16.0]
    }
}

/// A face of a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFace {
    /// Texture reference (e.g., "#side" or "block/stone").
    #[serde(default)]
    pub texture: String,
    /// UV coordinates [u1, v1, u2, v2] in 0-16 range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cullface: Option<String>,
    /// UV rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tintindex: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_model() {
        let json = r#"{
            "parent": "block/cube_all",
            "textures": {
                "all": "block/stone"
            }
        }"#;

        let model: BlockModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.parent, Some("block/cube_all".to_string()));
        assert_eq!(model.textures.get("all"), Some(&"block/stone".to_string()));
        assert!(!model.has_elements());
        assert!(model.extra.is_empty());
    }

    #[test]
    fn test_parse_model_with_elements() {
        let json = r##"{
            "textures": {
                "texture": "block/stone"
            },
            "elements": [
                {
                    "from": [0, 0, 0],
                    "to": [16, 16, 16],
                    "faces": {
                        "down":  { "texture": "#texture", "cullface": "down" },
                        "up":    { "texture": "#texture", "cullface": "up" },
                        "north": { "texture": "#texture", "cullface": "north" },
                        "south": { "texture": "#texture", "cullface": "south" },
                        "west":  { "texture": "#texture", "cullface": "west" },
                        "east":  { "texture": "#texture", "cullface": "east", "tintindex": 0 }
                    }
                }
            ]
        }"##;

        let model: BlockModel = serde_json::from_str(json).unwrap();
        let elements = model.elements.as_ref().unwrap();
        assert_eq!(elements.len(), 1);

        let element = &elements[0];
        assert!(element.is_full_cube());
        assert_eq!(element.faces.len(), 6);
        assert_eq!(element.faces["down"].cullface.as_deref(), Some("down"));
        assert_eq!(element.faces["east"].tintindex, Some(0));
        assert_eq!(element.faces["west"].tintindex, None);
        let names: Vec<_> = element.faces.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["down", "up", "north", "south", "west", "east"]);
    }

    #[test]
    fn test_parse_element_with_rotation() {
        let json = r#"{
            "from": [0, 0, 0],
            "to": [16, 8, 16],
            "rotation": {
                "origin": [8, 8, 8],
                "axis": "y",
                "angle": 45,
                "rescale": true
            },
            "faces": {}
        }"#;

        let element: ModelElement = serde_json::from_str(json).unwrap();
        assert!(!element.is_full_cube());
        assert_eq!(element.to, [16.0, 8.0, 16.0]);
        let rotation = element.rotation.unwrap();
        assert_eq!(rotation.angle, 45.0);
        assert!(rotation.rescale);
    }

    #[test]
    fn test_empty_elements_are_kept() {
        let model: BlockModel = serde_json::from_str(r#"{"elements": []}"#).unwrap();
        assert!(model.has_elements());
        assert!(model.elements.unwrap().is_empty());
    }

    #[test]
    fn test_unknown_fields_and_overrides() {
        let json = r#"{
            "parent": "item/generated",
            "gui_light": "front",
            "overrides": [
                { "predicate": { "pulling": 1 }, "model": "item/bow_pulling_0" }
            ]
        }"#;
        let model: BlockModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.extra["gui_light"], "front");
        assert_eq!(model.override_models(), vec!["item/bow_pulling_0"]);

        let back = serde_json::to_value(&model).unwrap();
        assert_eq!(back["gui_light"], "front");
        assert!(back.get("elements").is_none());
    }
}
