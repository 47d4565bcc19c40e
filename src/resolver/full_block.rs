//! Face extraction for rendering full blocks as isometric item icons.

use super::ResolvedModel;
use crate::error::{AssetsError, Result};
use serde::Serialize;

/// The three visible faces of an isometric cube icon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullBlockFaces<T> {
    pub top: T,
    pub left: T,
    pub right: T,
}

impl<T> FullBlockFaces<T> {
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> std::result::Result<U, E>) -> std::result::Result<FullBlockFaces<U>, E> {
        Ok(FullBlockFaces {
            top: f(self.top)?,
            left: f(self.left)?,
            right: f(self.right)?,
        })
    }
}

const TOP: [&str; 2] = ["up", "top"];
const LEFT: [&str; 3] = ["east", "left", "side"];
const RIGHT: [&str; 3] = ["north", "right", "side"];

/// Texture paths of the top, left and right faces of a full-cube model.
///
/// Returns `Ok(None)` when the model has no elements or any element is
/// smaller than the whole block. A full cube missing one of the faces is
/// an error.
pub fn full_block_faces(model: &ResolvedModel, block: &str) -> Result<Option<FullBlockFaces<String>>> {
    let Some(elements) = model.elements.as_ref().filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !elements.iter().all(|e| e.is_full_cube()) {
        return Ok(None);
    }
    let element = &elements[0];
    let face = |names: &[&str], which: &'static str| {
        names
            .iter()
            .find_map(|name| element.faces.get(*name))
            .map(|face| face.texture.clone())
            .ok_or_else(|| AssetsError::MissingFace {
                block: block.to_string(),
                face: which,
            })
    };
    Ok(Some(FullBlockFaces {
        top: face(&TOP, "top")?,
        left: face(&LEFT, "left")?,
        right: face(&RIGHT, "right")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelElement;

    fn element(json: &str) -> ModelElement {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_cube_faces() {
        let model = ResolvedModel {
            elements: Some(vec![element(
                r#"{ "from": [0, 0, 0], "to": [16, 16, 16], "faces": {
                    "up": { "texture": "block/grass_block_top" },
                    "north": { "texture": "block/grass_block_side" },
                    "east": { "texture": "block/grass_block_side" }
                } }"#,
            )]),
            ..Default::default()
        };
        let faces = full_block_faces(&model, "grass_block").unwrap().unwrap();
        assert_eq!(faces.top, "block/grass_block_top");
        assert_eq!(faces.left, "block/grass_block_side");
        assert_eq!(faces.right, "block/grass_block_side");
    }

    #[test]
    fn test_legacy_face_names() {
        let model = ResolvedModel {
            elements: Some(vec![element(
                r#"{ "from": [0, 0, 0], "to": [16, 16, 16], "faces": {
                    "top": { "texture": "block/a" },
                    "side": { "texture": "block/b" }
                } }"#,
            )]),
            ..Default::default()
        };
        let faces = full_block_faces(&model, "legacy").unwrap().unwrap();
        assert_eq!(faces.top, "block/a");
        assert_eq!(faces.left, "block/b");
        assert_eq!(faces.right, "block/b");
    }

    #[test]
    fn test_partial_block_is_not_full() {
        let model = ResolvedModel {
            elements: Some(vec![element(
                r#"{ "from": [0, 0, 0], "to": [16, 8, 16], "faces": {} }"#,
            )]),
            ..Default::default()
        };
        assert!(full_block_faces(&model, "slab").unwrap().is_none());
        assert!(full_block_faces(&ResolvedModel::default(), "air").unwrap().is_none());
    }

    #[test]
    fn test_missing_face_is_error() {
        let model = ResolvedModel {
            elements: Some(vec![element(
                r#"{ "from": [0, 0, 0], "to": [16, 16, 16], "faces": { "up": { "texture": "block/a" } } }"#,
            )]),
            ..Default::default()
        };
        let err = full_block_faces(&model, "odd").unwrap_err();
        assert!(matches!(err, AssetsError::MissingFace { face: "left", .. }));
    }
}
