//! Serialized atlas lookup tables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// UV table of one packed atlas image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAtlas {
    /// UV extent of one tile (`tile_size / width`).
    pub su_sv: f64,
    pub tile_size: u32,
    pub width: u32,
    pub height: u32,
    /// Texture name (without extension) to placement, in packing order.
    pub textures: IndexMap<String, JsonTexture>,
}

impl JsonAtlas {
    /// An atlas with no textures.
    pub fn empty(tile_size: u32) -> Self {
        Self {
            su_sv: 1.0,
            tile_size,
            width: tile_size,
            height: tile_size,
            textures: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&JsonTexture> {
        self.textures.get(name)
    }

    /// Pixel rectangle `(x, y, width, height)` of a placement.
    pub fn pixel_rect(&self, texture: &JsonTexture) -> (u32, u32, u32, u32) {
        let (su, sv) = texture.size_or(self.su_sv);
        (
            (texture.u * f64::from(self.width)).round() as u32,
            (texture.v * f64::from(self.height)).round() as u32,
            (su * f64::from(self.width)).round() as u32,
            (sv * f64::from(self.height)).round() as u32,
        )
    }
}

/// Placement of one texture in an atlas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonTexture {
    pub u: f64,
    pub v: f64,
    pub tile_index: u32,
    /// UV width; absent when equal to the atlas `suSv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub su: Option<f64>,
    /// UV height; absent when equal to the atlas `suSv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sv: Option<f64>,
}

impl JsonTexture {
    /// `(su, sv)` with the atlas default filled in.
    pub fn size_or(&self, su_sv: f64) -> (f64, f64) {
        (self.su.unwrap_or(su_sv), self.sv.unwrap_or(su_sv))
    }
}

/// The `{latest, legacy}` pair describing one atlas family.
///
/// Legacy keys are `"<version>/<name>"`: the texture as it looked before
/// `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasesJson {
    pub latest: JsonAtlas,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<JsonAtlas>,
}

impl AtlasesJson {
    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atlas_json() {
        let json = r#"{
            "latest": {
                "suSv": 0.25, "tileSize": 16, "width": 64, "height": 64,
                "textures": {
                    "stone": { "u": 0, "v": 0, "tileIndex": 0 },
                    "door": { "u": 0.25, "v": 0, "tileIndex": 1, "su": 0.25, "sv": 0.5 }
                }
            }
        }"#;
        let atlases = AtlasesJson::from_json_str(json).unwrap();
        assert!(atlases.legacy.is_none());

        let latest = &atlases.latest;
        assert_eq!(latest.pixel_rect(&latest.textures["stone"]), (0, 0, 16, 16));
        assert_eq!(latest.pixel_rect(&latest.textures["door"]), (16, 0, 16, 32));

        let back = serde_json::to_value(latest).unwrap();
        assert!(back["textures"]["stone"].get("su").is_none());
        assert_eq!(back["textures"]["door"]["tileIndex"], 1);
    }
}
