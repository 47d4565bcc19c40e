//! Texture lookup for item icons from item and block models.

use crate::assets::{AssetStores, BlockModel};
use crate::atlas::AtlasParser;
use crate::error::{AssetsError, Result};
use crate::resolver::{full_block_faces, BlockResolver, FullBlockFaces, ResolvedModel};
use serde::Serialize;

/// Which atlas a texture slice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    Items,
    Blocks,
}

/// A pixel rectangle `[x, y, width, height]` in an atlas image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureSlice {
    pub slice: [u32; 4],
    #[serde(rename = "type")]
    pub kind: TextureKind,
}

/// Renderable icon of an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemTexture {
    /// A flat sprite.
    Flat(TextureSlice),
    /// An isometric cube drawn from three block faces.
    FullBlock {
        faces: FullBlockFaces<TextureSlice>,
        #[serde(rename = "resolvedModel")]
        model: Box<ResolvedModel>,
    },
}

/// Resolves item icons for one game version.
pub struct ItemsRenderer<'a> {
    version: String,
    stores: &'a AssetStores,
    items_atlas: &'a AtlasParser,
    blocks_atlas: Option<&'a AtlasParser>,
}

impl<'a> ItemsRenderer<'a> {
    pub fn new(
        version: impl Into<String>,
        stores: &'a AssetStores,
        items_atlas: &'a AtlasParser,
        blocks_atlas: Option<&'a AtlasParser>,
    ) -> Self {
        Self {
            version: version.into(),
            stores,
            items_atlas,
            blocks_atlas,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Map a texture path to its atlas and pixel rectangle.
    ///
    /// Paths mentioning `items/` go to the items atlas, then paths mentioning
    /// `block/` or `blocks/` go to the blocks atlas, and anything else to the
    /// items atlas.
    pub fn resolve_texture(&self, texture: &str) -> Option<TextureSlice> {
        let kind = if texture.contains("items/") {
            TextureKind::Items
        } else if texture.contains("block/") || texture.contains("blocks/") {
            TextureKind::Blocks
        } else {
            TextureKind::Items
        };
        let parser = match kind {
            TextureKind::Blocks => self.blocks_atlas?,
            TextureKind::Items => self.items_atlas,
        };

        let name = texture.strip_prefix("minecraft:").unwrap_or(texture);
        let name = ["block/", "blocks/", "item/", "items/"]
            .iter()
            .fold(name.to_string(), |name, prefix| name.replacen(prefix, "", 1));

        let info = parser.get_texture_info(&name, &self.version)?;
        let atlas = parser.atlas(info.image_type)?;
        let (w, h) = (f64::from(atlas.width), f64::from(atlas.height));
        Some(TextureSlice {
            slice: [
                (info.u * w).round() as u32,
                (info.v * h).round() as u32,
                (info.su * w).round() as u32,
                (info.sv * h).round() as u32,
            ],
            kind,
        })
    }

    /// Icon faces of a full-cube block model.
    ///
    /// Returns `Ok(None)` without a blocks atlas or when the model is not a
    /// full cube. A face texture missing from the atlas is an error.
    pub fn try_get_full_block(&self, model: &BlockModel, block_name: &str) -> Result<Option<ItemTexture>> {
        if self.blocks_atlas.is_none() {
            return Ok(None);
        }
        let mut resolver = BlockResolver::new(&self.version, self.stores);
        let resolved = resolver.resolve_model_data(model, block_name);
        let Some(faces) = full_block_faces(&resolved, block_name)? else {
            return Ok(None);
        };
        let faces = faces.try_map(|texture| {
            self.resolve_texture(&texture).ok_or_else(|| {
                AssetsError::MissingTextureInfo(format!("{} (face of {})", texture, block_name))
            })
        })?;
        Ok(Some(ItemTexture::FullBlock {
            faces,
            model: Box::new(resolved),
        }))
    }

    /// Icon of an item given its name (`stick`, `minecraft:stone`) or a
    /// model path (`item/bow`, `block/stone`).
    ///
    /// Bare names look up `item/<name>` and fall back to `block/<name>`; item
    /// models whose parent is a block model render as full blocks. With
    /// `exact` the name is looked up as a model path as-is.
    pub fn get_item_texture(&self, name_or_model: &str, exact: bool) -> Result<Option<ItemTexture>> {
        let (namespace, name) = match name_or_model.split_once(':') {
            Some(("minecraft", name)) => ("", name),
            Some((namespace, name)) => (namespace, name),
            None => ("", name_or_model),
        };
        let qualify = |path: String| {
            if namespace.is_empty() {
                path
            } else {
                format!("{}:{}", namespace, path)
            }
        };
        let clean_path = qualify(name.to_string());
        let models = &self.stores.models;

        let model = if clean_path.contains('/') || exact {
            models.get(&self.version, &clean_path)
        } else {
            let item_model = models.get(&self.version, &qualify(format!("item/{}", name)));
            let (model, is_block) = match item_model {
                Some(model) => {
                    let is_block = model.parent.as_deref().is_some_and(|p| p.contains("block/"));
                    (Some(model), is_block)
                }
                None => {
                    let block_model = models.get(&self.version, &qualify(format!("block/{}", name)));
                    (block_model, block_model.is_some())
                }
            };
            if let (Some(model), true) = (model, is_block) {
                return self.try_get_full_block(model, &clean_path);
            }
            model
        };

        let Some(model) = model else {
            return Ok(None);
        };
        let texture = if clean_path.contains("block/") {
            model.textures.values().next()
        } else {
            model.textures.get("layer0")
        };
        let Some(texture) = texture else {
            return Ok(None);
        };

        let slice = texture
            .strip_prefix("invsprite_")
            .and_then(|sprite| self.resolve_texture(sprite))
            .or_else(|| self.resolve_texture(texture));
        Ok(slice.map(ItemTexture::Flat))
    }
}
