//! Version-aware texture lookup over a `{latest, legacy}` atlas pair.

use super::builder::{AtlasPacker, PackerConfig, TextureSource};
use super::canvas;
use super::debug::create_debug_image;
use super::json::{AtlasesJson, JsonAtlas, JsonTexture};
use crate::error::{AssetsError, Result};
use crate::store::{VersionedStore, VersionedStoreBuilder, LATEST};
use image::RgbaImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Which atlas image a texture lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Latest,
    Legacy,
}

/// Store entry: a placement tagged with its image and bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTexture {
    #[serde(flatten)]
    pub texture: JsonTexture,
    pub image_type: ImageType,
    pub version: String,
}

/// Resolved placement of a texture as seen by one game version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub u: f64,
    pub v: f64,
    pub su: f64,
    pub sv: f64,
    pub tile_index: u32,
    pub image_type: ImageType,
    /// Bucket the entry came from: `"latest"` or the version it predates.
    pub version: String,
}

/// Per-texture override for [`AtlasParser::make_new_atlas`].
#[derive(Debug, Clone, Default)]
pub enum CustomImage {
    /// Use the texture from the source atlases.
    #[default]
    Default,
    /// Leave the texture out of the new atlas.
    Skip,
    Image(Arc<RgbaImage>),
    /// Encoded image bytes.
    Encoded(Vec<u8>),
}

/// Which textures a derived atlas contains and in what order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AtlasOrder {
    /// Every latest texture in latest-atlas order.
    #[default]
    Latest,
    /// Every latest texture, sorted by name.
    Sorted,
    /// Only the listed names, in list order.
    Allowlist(Vec<String>),
}

/// Options for [`AtlasParser::make_new_atlas`].
#[derive(Debug, Clone, Default)]
pub struct MakeAtlasOptions {
    /// Tile size of the new atlas. Defaults to the latest atlas tile size.
    pub tile_size: Option<u32>,
    pub order: AtlasOrder,
    /// Names appended after the ordered set, e.g. textures only present in
    /// the legacy atlas.
    pub extra_names: Vec<String>,
}

/// A freshly packed single-image atlas.
#[derive(Debug, Clone)]
pub struct NewAtlas {
    pub atlas: JsonAtlas,
    pub image: RgbaImage,
}

impl NewAtlas {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        Ok(canvas::encode_png(&self.image)?)
    }

    /// A parser serving the new atlas as its only (latest) atlas.
    pub fn into_parser(self) -> AtlasParser {
        AtlasParser::new(AtlasesJson {
            latest: self.atlas,
            legacy: None,
        })
        .with_images(Some(Arc::new(self.image)), None)
    }
}

/// Texture lookup for one atlas family.
///
/// Legacy entries keyed `"<version>/<name>"` are stored in the bucket of
/// `<version>` and lookups are exclusive, so a legacy texture is only served
/// to versions strictly older than the one that replaced it.
#[derive(Debug, Clone)]
pub struct AtlasParser {
    atlases: AtlasesJson,
    store: VersionedStore<StoredTexture>,
    latest_image: Option<Arc<RgbaImage>>,
    legacy_image: Option<Arc<RgbaImage>>,
}

impl AtlasParser {
    pub fn new(atlases: AtlasesJson) -> Self {
        let mut builder = VersionedStoreBuilder::new().inclusive(false);
        for (name, texture) in &atlases.latest.textures {
            builder.push(
                LATEST,
                name.as_str(),
                StoredTexture {
                    texture: *texture,
                    image_type: ImageType::Latest,
                    version: LATEST.to_string(),
                },
            );
        }
        if let Some(legacy) = &atlases.legacy {
            for (key, texture) in &legacy.textures {
                let Some((version, name)) = key.split_once('/') else {
                    log::warn!("Legacy atlas key {} has no version prefix", key);
                    continue;
                };
                builder.push(
                    version,
                    name,
                    StoredTexture {
                        texture: *texture,
                        image_type: ImageType::Legacy,
                        version: version.to_string(),
                    },
                );
            }
        }

        Self {
            store: builder.build(),
            atlases,
            latest_image: None,
            legacy_image: None,
        }
    }

    /// Attach the decoded atlas images.
    pub fn with_images(mut self, latest: Option<Arc<RgbaImage>>, legacy: Option<Arc<RgbaImage>>) -> Self {
        self.latest_image = latest;
        self.legacy_image = legacy;
        self
    }

    /// Load `<name>Atlases.json` and its PNG images from disk.
    pub fn load<P: AsRef<Path>>(json: P, latest_png: P, legacy_png: Option<P>) -> Result<Self> {
        let atlases = AtlasesJson::from_json_str(&std::fs::read_to_string(json)?)?;
        let latest = canvas::load_texture_from_bytes(&std::fs::read(latest_png)?)?;
        let legacy = match legacy_png {
            Some(path) => Some(Arc::new(canvas::load_texture_from_bytes(&std::fs::read(path)?)?)),
            None => None,
        };
        Ok(Self::new(atlases).with_images(Some(Arc::new(latest)), legacy))
    }

    pub fn atlases(&self) -> &AtlasesJson {
        &self.atlases
    }

    pub fn store(&self) -> &VersionedStore<StoredTexture> {
        &self.store
    }

    pub fn atlas(&self, image_type: ImageType) -> Option<&JsonAtlas> {
        match image_type {
            ImageType::Latest => Some(&self.atlases.latest),
            ImageType::Legacy => self.atlases.legacy.as_ref(),
        }
    }

    pub fn image(&self, image_type: ImageType) -> Option<&Arc<RgbaImage>> {
        match image_type {
            ImageType::Latest => self.latest_image.as_ref(),
            ImageType::Legacy => self.legacy_image.as_ref(),
        }
    }

    /// Placement of `name` as of `version` (`"latest"` for the newest).
    pub fn get_texture_info(&self, name: &str, version: &str) -> Option<TextureInfo> {
        let stored = self.store.get(version, name)?;
        let default_su_sv = self
            .atlas(stored.image_type)
            .map_or(self.atlases.latest.su_sv, |atlas| atlas.su_sv);
        let (su, sv) = stored.texture.size_or(default_su_sv);
        Some(TextureInfo {
            u: stored.texture.u,
            v: stored.texture.v,
            su,
            sv,
            tile_index: stored.texture.tile_index,
            image_type: stored.image_type,
            version: stored.version.clone(),
        })
    }

    /// Pixels of one texture as of `version`, cropped from its atlas image.
    pub fn texture_image(&self, name: &str, version: &str) -> Result<RgbaImage> {
        let info = self
            .get_texture_info(name, version)
            .ok_or_else(|| AssetsError::MissingTextureInfo(name.to_string()))?;
        let image = self
            .image(info.image_type)
            .ok_or_else(|| AssetsError::MissingTextureSource(name.to_string()))?;
        let (x, y, w, h) = info_rect(&info, image);
        Ok(image::imageops::crop_imm(image.as_ref(), x, y, w, h).to_image())
    }

    fn ordered_names(&self, options: &MakeAtlasOptions) -> Vec<String> {
        let mut names: Vec<String> = match &options.order {
            AtlasOrder::Latest => self.atlases.latest.textures.keys().cloned().collect(),
            AtlasOrder::Sorted => {
                let mut names: Vec<String> = self.atlases.latest.textures.keys().cloned().collect();
                names.sort();
                names
            }
            AtlasOrder::Allowlist(names) => names.clone(),
        };
        for extra in &options.extra_names {
            if !names.contains(extra) {
                names.push(extra.clone());
            }
        }
        names
    }

    /// Repack every texture as it looked in `version` into one new atlas.
    ///
    /// `custom` may replace or skip individual textures. A texture with no
    /// placement for `version` and no replacement is an error.
    pub fn make_new_atlas<F>(&self, version: &str, mut custom: F, options: &MakeAtlasOptions) -> Result<NewAtlas>
    where
        F: FnMut(&str) -> CustomImage,
    {
        let tile_size = options.tile_size.unwrap_or(self.atlases.latest.tile_size);
        let mut packer = AtlasPacker::new(PackerConfig::default().with_tile_size(tile_size));

        for name in self.ordered_names(options) {
            let source = match custom(&name) {
                CustomImage::Skip => continue,
                CustomImage::Image(image) => whole_image(image),
                CustomImage::Encoded(bytes) => whole_image(Arc::new(canvas::load_texture_from_bytes(&bytes)?)),
                CustomImage::Default => {
                    let info = self
                        .get_texture_info(&name, version)
                        .ok_or_else(|| AssetsError::MissingTextureInfo(name.clone()))?;
                    let image = self
                        .image(info.image_type)
                        .ok_or_else(|| AssetsError::MissingTextureSource(name.clone()))?;
                    let (x, y, w, h) = info_rect(&info, image);
                    TextureSource::from_image(Arc::clone(image))
                        .render_size(w, h)
                        .source_rect(x, y, w, h)
                }
            };
            packer.add_texture(name, source);
        }

        log::info!("Packing {} textures for version {}", packer.len(), version);
        let packed = packer.pack()?;
        Ok(NewAtlas {
            atlas: packed.json,
            image: packed.image,
        })
    }

    /// The chosen atlas image scaled up with every entry outlined.
    pub fn debug_image(&self, image_type: ImageType, scale: u32) -> Option<RgbaImage> {
        let atlas = self.atlas(image_type)?;
        let image = self.image(image_type)?;
        Some(create_debug_image(atlas, image, scale))
    }
}

fn whole_image(image: Arc<RgbaImage>) -> TextureSource {
    let (w, h) = image.dimensions();
    TextureSource::from_image(image).render_size(w, h).source_rect(0, 0, w, h)
}

fn info_rect(info: &TextureInfo, image: &RgbaImage) -> (u32, u32, u32, u32) {
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    (
        (info.u * w).round() as u32,
        (info.v * h).round() as u32,
        (info.su * w).round() as u32,
        (info.sv * h).round() as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn pack(textures: &[(&str, Rgba<u8>)]) -> (JsonAtlas, RgbaImage) {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        for (name, color) in textures {
            packer.add_texture(*name, TextureSource::from_image(RgbaImage::from_pixel(16, 16, *color)));
        }
        let packed = packer.pack().unwrap();
        (packed.json, packed.image)
    }

    fn create_test_parser() -> AtlasParser {
        let (latest, latest_image) = pack(&[("stone.png", RED), ("dirt.png", GREEN)]);
        let (legacy, legacy_image) = pack(&[("1.13/stone.png", BLUE), ("1.13/old_only.png", BLUE)]);
        AtlasParser::new(AtlasesJson {
            latest,
            legacy: Some(legacy),
        })
        .with_images(Some(Arc::new(latest_image)), Some(Arc::new(legacy_image)))
    }

    #[test]
    fn test_latest_lookup() {
        let parser = create_test_parser();
        let info = parser.get_texture_info("stone", "latest").unwrap();
        assert_eq!(info.image_type, ImageType::Latest);
        assert_eq!(info.version, "latest");
        assert_eq!(info.su, parser.atlases().latest.su_sv);

        let info = parser.get_texture_info("stone", "1.20.4").unwrap();
        assert_eq!(info.image_type, ImageType::Latest);
    }

    #[test]
    fn test_legacy_lookup_is_exclusive() {
        let parser = create_test_parser();
        let info = parser.get_texture_info("stone", "1.12.2").unwrap();
        assert_eq!(info.image_type, ImageType::Legacy);
        assert_eq!(info.version, "1.13");

        // The 1.13 entry describes textures before 1.13.
        let info = parser.get_texture_info("stone", "1.13").unwrap();
        assert_eq!(info.image_type, ImageType::Latest);

        assert!(parser.get_texture_info("missing", "latest").is_none());
    }

    #[test]
    fn test_texture_image() {
        let parser = create_test_parser();
        let stone = parser.texture_image("stone", "1.8").unwrap();
        assert_eq!(stone.dimensions(), (16, 16));
        assert_eq!(stone.get_pixel(4, 4), &BLUE);
        let stone = parser.texture_image("stone", "latest").unwrap();
        assert_eq!(stone.get_pixel(4, 4), &RED);
    }

    #[test]
    fn test_make_new_atlas_for_old_version() {
        let parser = create_test_parser();
        let new = parser
            .make_new_atlas("1.12", |_| CustomImage::Default, &MakeAtlasOptions::default())
            .unwrap();
        assert_eq!(new.atlas.textures.len(), 2);

        let new_parser = new.into_parser();
        assert_eq!(new_parser.texture_image("stone", "latest").unwrap().get_pixel(0, 0), &BLUE);
        assert_eq!(new_parser.texture_image("dirt", "latest").unwrap().get_pixel(0, 0), &GREEN);
    }

    #[test]
    fn test_make_new_atlas_custom_and_skip() {
        let parser = create_test_parser();
        let custom = Arc::new(RgbaImage::from_pixel(16, 16, Rgba([7, 7, 7, 255])));
        let options = MakeAtlasOptions {
            extra_names: vec!["extra".to_string()],
            ..Default::default()
        };
        let new = parser
            .make_new_atlas(
                "latest",
                |name| match name {
                    "dirt" => CustomImage::Skip,
                    "extra" => CustomImage::Image(Arc::clone(&custom)),
                    _ => CustomImage::Default,
                },
                &options,
            )
            .unwrap();
        let names: Vec<&str> = new.atlas.textures.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["stone", "extra"]);

        let new_parser = new.into_parser();
        assert_eq!(new_parser.texture_image("extra", "latest").unwrap().get_pixel(3, 3), &Rgba([7, 7, 7, 255]));
    }

    #[test]
    fn test_make_new_atlas_missing_info() {
        let parser = create_test_parser();
        let options = MakeAtlasOptions {
            order: AtlasOrder::Allowlist(vec!["stone".into(), "nope".into()]),
            ..Default::default()
        };
        let err = parser
            .make_new_atlas("latest", |_| CustomImage::Default, &options)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing texture info for nope");
    }

    #[test]
    fn test_sorted_order() {
        let parser = create_test_parser();
        let options = MakeAtlasOptions {
            order: AtlasOrder::Sorted,
            tile_size: Some(32),
            ..Default::default()
        };
        let new = parser
            .make_new_atlas("latest", |_| CustomImage::Default, &options)
            .unwrap();
        let names: Vec<&str> = new.atlas.textures.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["dirt", "stone"]);
        assert_eq!(new.atlas.tile_size, 32);
    }
}
