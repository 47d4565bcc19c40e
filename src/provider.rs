//! Block models with face textures mapped to atlas coordinates.

use crate::assets::{AssetStores, ModelElement, ModelFace};
use crate::atlas::{AtlasParser, TextureInfo};
use crate::error::{AssetsError, Result};
use crate::resolver::{BlockResolver, ResolveIssue, ResolvedModel};
use crate::types::{BlockTransform, Direction, ElementRotation, QueriedBlock};
use indexmap::IndexMap;
use serde::Serialize;

const COORDINATE_MAX: f64 = 16.0;

/// Atlas rectangle of one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceTexture {
    pub u: f64,
    pub v: f64,
    pub su: f64,
    pub sv: f64,
    pub tile_index: u32,
    /// Texture path the rectangle was resolved from.
    pub debug_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvidedFace {
    pub texture: FaceTexture,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cullface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tintindex: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvidedElement {
    pub from: [f32; 3],
    pub to: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shade: Option<bool>,
    pub faces: IndexMap<String, ProvidedFace>,
}

/// A resolved model ready for meshing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvidedModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub transform: BlockTransform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub elements: Vec<ProvidedElement>,
    #[serde(rename = "ambientocclusion", skip_serializing_if = "Option::is_none")]
    pub ambient_occlusion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ao: Option<bool>,
}

/// Resolves world blocks to atlas-mapped models for one version.
///
/// Unlike the resolver, a face whose texture cannot be found in the atlas
/// is an error: the geometry would be unrenderable.
pub struct WorldBlockProvider<'a> {
    resolver: BlockResolver<'a>,
    atlas: &'a AtlasParser,
}

impl<'a> WorldBlockProvider<'a> {
    pub fn new(version: &str, stores: &'a AssetStores, blocks_atlas: &'a AtlasParser) -> Self {
        Self {
            resolver: BlockResolver::new(version, stores),
            atlas: blocks_atlas,
        }
    }

    pub fn version(&self) -> &str {
        self.resolver.version()
    }

    pub fn resolver(&mut self) -> &mut BlockResolver<'a> {
        &mut self.resolver
    }

    pub fn issues(&self) -> &[ResolveIssue] {
        self.resolver.issues()
    }

    /// Atlas placement of a block texture path such as `block/stone`.
    pub fn get_texture_info(&self, texture: &str) -> Option<TextureInfo> {
        let name = texture.strip_prefix("minecraft:").unwrap_or(texture);
        let name = name.replacen("block/", "", 1).replacen("blocks/", "", 1);
        self.atlas.get_texture_info(&name, self.resolver.version())
    }

    /// Every variant of every part of `block`, atlas mapped. Models without
    /// elements and parts left empty are dropped.
    pub fn get_all_resolved_models(
        &mut self,
        block: &QueriedBlock,
        fallback_variant: bool,
    ) -> Result<Vec<Vec<ProvidedModel>>> {
        let parts = self
            .resolver
            .all_resolved_models(block, fallback_variant)
            .unwrap_or_default();

        let mut provided = Vec::with_capacity(parts.len());
        for part in parts {
            let mut models = Vec::with_capacity(part.len());
            for model in &part {
                let model = self.transform_model(model, &block.name)?;
                if !model.elements.is_empty() {
                    models.push(model);
                }
            }
            if !models.is_empty() {
                provided.push(models);
            }
        }
        Ok(provided)
    }

    /// Replace every face texture of `model` with its atlas rectangle.
    pub fn transform_model(&self, model: &ResolvedModel, block_name: &str) -> Result<ProvidedModel> {
        let elements = model
            .elements
            .iter()
            .flatten()
            .map(|element| self.transform_element(element, block_name))
            .collect::<Result<Vec<_>>>()?;
        Ok(ProvidedModel {
            model: model.model.clone(),
            transform: model.transform,
            weight: model.weight,
            elements,
            ambient_occlusion: model.ambient_occlusion,
            ao: model.ao,
        })
    }

    fn transform_element(&self, element: &ModelElement, block_name: &str) -> Result<ProvidedElement> {
        let mut faces = IndexMap::with_capacity(element.faces.len());
        for (face_name, face) in &element.faces {
            let texture = self.face_texture(element, face_name, face, block_name)?;
            faces.insert(
                face_name.clone(),
                ProvidedFace {
                    texture,
                    uv: face.uv,
                    cullface: face.cullface.clone(),
                    rotation: face.rotation,
                    tintindex: face.tintindex,
                },
            );
        }
        Ok(ProvidedElement {
            from: element.from,
            to: element.to,
            rotation: element.rotation.clone(),
            shade: element.shade,
            faces,
        })
    }

    fn face_texture(
        &self,
        element: &ModelElement,
        face_name: &str,
        face: &ModelFace,
        block_name: &str,
    ) -> Result<FaceTexture> {
        if face.texture.is_empty() || face.texture.contains('#') {
            return Err(AssetsError::UnresolvedTexture(format!(
                "Missing resolved texture {:?} for face {} of {}",
                face.texture, face_name, block_name
            )));
        }
        let info = self
            .get_texture_info(&face.texture)
            .ok_or_else(|| AssetsError::MissingTextureInfo(format!("{} ({})", face.texture, block_name)))?;

        let uv = match face.uv {
            Some(uv) => uv,
            None => Direction::from_name(face_name)
                .map(|direction| direction.default_uv(element.from, element.to))
                .ok_or_else(|| {
                    AssetsError::InvalidData(format!("Face {} of {} has no uv and no direction", face_name, block_name))
                })?,
        };
        let [u1, v1, u2, v2] = uv.map(f64::from);

        Ok(FaceTexture {
            u: info.u + u1 / COORDINATE_MAX * info.su,
            v: info.v + v1 / COORDINATE_MAX * info.sv,
            su: (u2 - u1) / COORDINATE_MAX * info.su,
            sv: (v2 - v1) / COORDINATE_MAX * info.sv,
            tile_index: info.tile_index,
            debug_name: face.texture.clone(),
        })
    }
}
