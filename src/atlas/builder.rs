//! Texture atlas packing using simple shelf (row) packing.

use super::canvas::{self, Rect};
use super::json::{JsonAtlas, JsonTexture};
use crate::error::{AssetsError, Result};
use image::RgbaImage;
use indexmap::IndexMap;
use std::sync::Arc;

/// Largest atlas side the packer will produce.
pub const MAX_ATLAS_SIZE: u32 = 16_384;

/// Packer configuration.
#[derive(Debug, Clone)]
pub struct PackerConfig {
    /// Side of one tile in pixels. Footprints are rounded up to multiples of it.
    pub tile_size: u32,
    /// Maximum atlas side in pixels.
    pub max_size: u32,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            tile_size: 16,
            max_size: MAX_ATLAS_SIZE,
        }
    }
}

impl PackerConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }
}

/// Where a texture's pixels come from and how large it is drawn.
///
/// By default a texture occupies one tile (or `tile_width_mult` tiles side by
/// side) and the source is the top-left square of the image, which picks the
/// first frame of animated strips.
#[derive(Debug, Clone, Default)]
pub struct TextureSource {
    pub image: Option<Arc<RgbaImage>>,
    /// Encoded image bytes, decoded at pack time when `image` is unset.
    pub contents: Option<Vec<u8>>,
    pub tile_width_mult: Option<u32>,
    /// Draw at the image's own size (rounded up to whole tiles).
    pub use_original_size: bool,
    pub render_width: Option<u32>,
    pub render_height: Option<u32>,
    pub source_x: Option<u32>,
    pub source_y: Option<u32>,
    pub source_width: Option<u32>,
    pub source_height: Option<u32>,
}

impl TextureSource {
    pub fn from_image(image: impl Into<Arc<RgbaImage>>) -> Self {
        Self {
            image: Some(image.into()),
            ..Default::default()
        }
    }

    pub fn from_bytes(contents: Vec<u8>) -> Self {
        Self {
            contents: Some(contents),
            ..Default::default()
        }
    }

    pub fn original_size(mut self) -> Self {
        self.use_original_size = true;
        self
    }

    pub fn tile_width_mult(mut self, mult: u32) -> Self {
        self.tile_width_mult = Some(mult);
        self
    }

    pub fn render_size(mut self, width: u32, height: u32) -> Self {
        self.render_width = Some(width);
        self.render_height = Some(height);
        self
    }

    pub fn source_rect(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.source_x = Some(x);
        self.source_y = Some(y);
        self.source_width = Some(width);
        self.source_height = Some(height);
        self
    }
}

/// A texture ready for placement.
struct Prepared {
    name: String,
    image: Arc<RgbaImage>,
    /// Footprint in the atlas.
    width: u32,
    height: u32,
    source: Rect,
}

/// A packed atlas image with its lookup table.
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    pub image: RgbaImage,
    pub json: JsonAtlas,
}

impl PackedAtlas {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        Ok(canvas::encode_png(&self.image)?)
    }
}

/// Builder for texture atlases.
///
/// Textures are placed left to right in insertion order and wrap to a new
/// row when the row is full, so the output depends only on the names and
/// sources added and their order.
pub struct AtlasPacker {
    config: PackerConfig,
    textures: IndexMap<String, TextureSource>,
}

impl AtlasPacker {
    pub fn new(config: PackerConfig) -> Self {
        Self {
            config,
            textures: IndexMap::new(),
        }
    }

    /// Add a texture under its extension-less name. A name that was already
    /// added (`"stone"` after `"stone.png"` too) keeps its first source.
    pub fn add_texture(&mut self, name: impl Into<String>, source: TextureSource) {
        let name = name.into();
        let clean = clean_name(&name);
        if self.textures.contains_key(clean) {
            log::debug!("Ignoring duplicate atlas texture {}", name);
            return;
        }
        self.textures.insert(clean.to_string(), source);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Pack every added texture into one square power-of-two image.
    pub fn pack(self) -> Result<PackedAtlas> {
        let tile = self.config.tile_size.max(1);
        if self.textures.is_empty() {
            return Ok(PackedAtlas {
                image: RgbaImage::new(tile, tile),
                json: JsonAtlas::empty(tile),
            });
        }

        let max_size = self.config.max_size;
        let mut prepared = Vec::with_capacity(self.textures.len());
        for (name, source) in self.textures {
            prepared.push(prepare(name, source, tile, max_size)?);
        }

        let layout = shelf_positions(&prepared, tile);
        let used_width = prepared
            .iter()
            .zip(&layout)
            .map(|(tex, (x, _))| x + u64::from(tex.width))
            .max()
            .unwrap_or(u64::from(tile));
        let used_height = prepared
            .iter()
            .zip(&layout)
            .map(|(tex, (_, y))| y + u64::from(tex.height))
            .max()
            .unwrap_or(u64::from(tile));
        let wanted = used_width
            .max(used_height)
            .checked_next_power_of_two()
            .unwrap_or(u64::MAX);
        let img_size = u32::try_from(wanted)
            .ok()
            .filter(|size| *size <= max_size)
            .ok_or_else(|| AssetsError::AtlasTooLarge {
                size: u32::try_from(wanted).unwrap_or(u32::MAX),
                max: max_size,
                breakdown: size_breakdown(&prepared),
            })?;
        // every placement ends inside img_size, so it fits in u32
        let positions: Vec<(u32, u32)> = layout.into_iter().map(|(x, y)| (x as u32, y as u32)).collect();

        let mut image = RgbaImage::new(img_size, img_size);
        let mut textures = IndexMap::new();
        let size = f64::from(img_size);
        let su_sv = f64::from(tile) / size;
        let tiles_per_row = img_size.div_ceil(tile);

        for (tex, (x, y)) in prepared.iter().zip(&positions) {
            canvas::draw_region(
                &mut image,
                &tex.image,
                tex.source,
                Rect::new(*x, *y, tex.width, tex.height),
            )
            .map_err(|message| AssetsError::TextureDraw {
                name: tex.name.clone(),
                message,
            })?;

            let su = f64::from(tex.width) / size;
            let sv = f64::from(tex.height) / size;
            let uniform = su == su_sv && sv == su_sv;
            let entry = JsonTexture {
                u: f64::from(*x) / size,
                v: f64::from(*y) / size,
                tile_index: (y / tile) * tiles_per_row + x / tile,
                su: (!uniform).then_some(su),
                sv: (!uniform).then_some(sv),
            };
            textures.insert(tex.name.clone(), entry);
        }

        log::debug!(
            "Packed {} textures into {}x{} atlas",
            textures.len(),
            img_size,
            img_size
        );

        Ok(PackedAtlas {
            image,
            json: JsonAtlas {
                su_sv,
                tile_size: tile,
                width: img_size,
                height: img_size,
                textures,
            },
        })
    }
}

/// Resolve a source into its pixels, footprint and source rectangle.
/// A footprint wider or taller than `max_size` can never be placed.
fn prepare(name: String, source: TextureSource, tile: u32, max_size: u32) -> Result<Prepared> {
    let image = match (source.image, source.contents) {
        (Some(image), _) => image,
        (None, Some(bytes)) => Arc::new(canvas::load_texture_from_bytes(&bytes)?),
        (None, None) => return Err(AssetsError::MissingTextureSource(name)),
    };
    let (img_w, img_h) = image.dimensions();

    let (width, height) =
        if source.use_original_size || source.render_width.is_some() || source.render_height.is_some() {
            let w = source.render_width.unwrap_or(img_w);
            let h = source.render_height.unwrap_or(img_h);
            (round_to_tile(u64::from(w), tile), round_to_tile(u64::from(h), tile))
        } else {
            let mult = u64::from(source.tile_width_mult.unwrap_or(1).max(1));
            (u64::from(tile) * mult, u64::from(tile))
        };
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w <= max_size && h <= max_size => (w, h),
        _ => {
            return Err(AssetsError::AtlasTooLarge {
                size: u32::try_from(width.max(height)).unwrap_or(u32::MAX),
                max: max_size,
                breakdown: format!("{}x{}(1)", width, height),
            })
        }
    };

    let frame = img_w.min(img_h);
    let src = if source.use_original_size {
        Rect::new(
            source.source_x.unwrap_or(0),
            source.source_y.unwrap_or(0),
            img_w,
            img_h,
        )
    } else {
        Rect::new(
            source.source_x.unwrap_or(0),
            source.source_y.unwrap_or(0),
            source.source_width.unwrap_or(frame),
            source.source_height.unwrap_or(frame),
        )
    };
    if src.width == 0 || src.height == 0 || !src.fits_in(img_w, img_h) {
        return Err(AssetsError::SourceOutOfBounds {
            name,
            x: src.x,
            y: src.y,
            width: src.width,
            height: src.height,
            image_width: img_w,
            image_height: img_h,
        });
    }

    Ok(Prepared {
        name,
        image,
        width,
        height,
        source: src,
    })
}

fn round_to_tile(value: u64, tile: u32) -> u64 {
    let tile = u64::from(tile);
    value.max(1).div_ceil(tile) * tile
}

/// Shelf placement. The row width is the side of the smallest power-of-two
/// tile grid holding every tile, widened to fit the widest texture.
/// Coordinates are u64 so an oversized layout is reported, not wrapped.
fn shelf_positions(textures: &[Prepared], tile: u32) -> Vec<(u64, u64)> {
    let tiles: u64 = textures
        .iter()
        .map(|t| u64::from(t.width / tile) * u64::from(t.height / tile))
        .sum();
    let grid = ((tiles as f64).sqrt().ceil() as u64).max(1).next_power_of_two();
    let widest = textures.iter().map(|t| t.width).max().unwrap_or(tile);
    let row_width = grid
        .saturating_mul(u64::from(tile))
        .max(u64::from(widest).next_power_of_two());

    let mut positions = Vec::with_capacity(textures.len());
    let (mut x, mut y, mut row_height) = (0u64, 0u64, 0u64);
    for tex in textures {
        let width = u64::from(tex.width);
        if x > 0 && x + width > row_width {
            x = 0;
            y += round_to_tile(row_height, tile);
            row_height = 0;
        }
        positions.push((x, y));
        x += width;
        row_height = row_height.max(u64::from(tex.height));
    }
    positions
}

/// `"WxH(count)"` groups of footprints, most common first.
fn size_breakdown(textures: &[Prepared]) -> String {
    let mut groups: IndexMap<String, usize> = IndexMap::new();
    for tex in textures {
        *groups.entry(format!("{}x{}", tex.width, tex.height)).or_default() += 1;
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
        .iter()
        .map(|(size, count)| format!("{}({})", size, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop a trailing file extension: `"stone.png"` -> `"stone"`,
/// `"1.16/stone.png"` -> `"1.16/stone"`, `"1.16/stone"` unchanged.
pub fn clean_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 && !name[dot..].contains('/') => &name[..dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn create_test_texture(width: u32, height: u32, color: [u8; 4]) -> TextureSource {
        TextureSource::from_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    fn pixel_rects(json: &JsonAtlas) -> Vec<Rect> {
        json.textures
            .values()
            .map(|t| {
                let (x, y, w, h) = json.pixel_rect(t);
                Rect::new(x, y, w, h)
            })
            .collect()
    }

    #[test]
    fn test_empty_atlas() {
        let packer = AtlasPacker::new(PackerConfig::default());
        let atlas = packer.pack().unwrap();
        assert_eq!(atlas.image.dimensions(), (16, 16));
        assert!(atlas.json.textures.is_empty());
    }

    #[test]
    fn test_single_texture_atlas() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture("stone.png", create_test_texture(16, 16, [255, 0, 0, 255]));

        let atlas = packer.pack().unwrap();
        assert_eq!(atlas.json.width, 16);
        assert_eq!(atlas.json.su_sv, 1.0);
        let stone = atlas.json.get("stone").unwrap();
        assert_eq!((stone.u, stone.v, stone.tile_index), (0.0, 0.0, 0));
        assert_eq!(stone.su, None);
        assert_eq!(atlas.image.get_pixel(8, 8), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_multiple_textures_do_not_overlap() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        for i in 0..7u8 {
            packer.add_texture(
                format!("t{}.png", i),
                create_test_texture(16, 16, [i * 30, 0, 0, 255]),
            );
        }
        packer.add_texture("wide.png", create_test_texture(32, 16, [0, 0, 255, 255]).original_size());
        packer.add_texture("tall.png", create_test_texture(16, 48, [0, 255, 0, 255]).original_size());

        let atlas = packer.pack().unwrap();
        let json = &atlas.json;
        assert_eq!(json.textures.len(), 9);
        assert_eq!(json.width, json.height);
        assert!(json.width.is_power_of_two());

        for texture in json.textures.values() {
            let (su, sv) = texture.size_or(json.su_sv);
            assert!(texture.u >= 0.0 && texture.u + su <= 1.0);
            assert!(texture.v >= 0.0 && texture.v + sv <= 1.0);
        }

        let rects = pixel_rects(json);
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }

        let (_, _, w, h) = json.pixel_rect(&json.textures["wide"]);
        assert_eq!((w, h), (32, 16));
        let (_, _, w, h) = json.pixel_rect(&json.textures["tall"]);
        assert_eq!((w, h), (16, 48));
    }

    #[test]
    fn test_tile_index_is_row_major() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        for i in 0..5 {
            packer.add_texture(format!("t{}", i), create_test_texture(16, 16, [0, 0, 0, 255]));
        }
        let atlas = packer.pack().unwrap();
        let json = &atlas.json;
        let tiles_per_row = json.width / json.tile_size;
        for texture in json.textures.values() {
            let (x, y, _, _) = json.pixel_rect(texture);
            assert_eq!(texture.tile_index, (y / 16) * tiles_per_row + x / 16);
        }
    }

    #[test]
    fn test_packing_is_deterministic() {
        let build = || {
            let mut packer = AtlasPacker::new(PackerConfig::default());
            for i in 0..20u8 {
                let width = if i % 3 == 0 { 32 } else { 16 };
                packer.add_texture(
                    format!("t{}.png", i),
                    create_test_texture(width, 16, [i, i, i, 255]).original_size(),
                );
            }
            packer.pack().unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(
            serde_json::to_string(&a.json).unwrap(),
            serde_json::to_string(&b.json).unwrap()
        );
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_default_source_is_first_frame() {
        let mut strip = RgbaImage::from_pixel(16, 32, Rgba([255, 0, 0, 255]));
        for y in 16..32 {
            for x in 0..16 {
                strip.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture("fire", TextureSource::from_image(strip));
        let atlas = packer.pack().unwrap();
        assert_eq!(atlas.image.dimensions(), (16, 16));
        assert_eq!(atlas.image.get_pixel(0, 15), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_render_size_scales() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture(
            "big",
            create_test_texture(64, 64, [1, 2, 3, 255]).render_size(16, 16),
        );
        let atlas = packer.pack().unwrap();
        assert_eq!(atlas.json.width, 16);
        assert_eq!(atlas.image.get_pixel(15, 15), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_too_large_reports_breakdown() {
        let config = PackerConfig {
            tile_size: 16,
            max_size: 32,
        };
        let mut packer = AtlasPacker::new(config);
        for i in 0..5 {
            packer.add_texture(format!("t{}", i), create_test_texture(16, 16, [0, 0, 0, 255]));
        }
        packer.add_texture("wide", create_test_texture(32, 16, [0, 0, 0, 255]).original_size());

        match packer.pack() {
            Err(AssetsError::AtlasTooLarge { size, max, breakdown }) => {
                assert_eq!(size, 64);
                assert_eq!(max, 32);
                assert_eq!(breakdown, "16x16(5), 32x16(1)");
            }
            other => panic!("expected AtlasTooLarge, got {:?}", other.map(|a| a.json)),
        }
    }

    #[test]
    fn test_missing_source() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture("nothing", TextureSource::default());
        assert!(matches!(packer.pack(), Err(AssetsError::MissingTextureSource(name)) if name == "nothing"));
    }

    #[test]
    fn test_source_out_of_bounds() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture(
            "bad",
            create_test_texture(16, 16, [0, 0, 0, 255]).source_rect(8, 8, 16, 16),
        );
        assert!(matches!(packer.pack(), Err(AssetsError::SourceOutOfBounds { .. })));
    }

    #[test]
    fn test_source_rect_past_u32_max() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture(
            "far",
            create_test_texture(16, 16, [0, 0, 0, 255]).source_rect(u32::MAX - 1, 0, 16, 16),
        );
        match packer.pack() {
            Err(AssetsError::SourceOutOfBounds { name, x, image_width, .. }) => {
                assert_eq!(name, "far");
                assert_eq!(x, u32::MAX - 1);
                assert_eq!(image_width, 16);
            }
            other => panic!("expected SourceOutOfBounds, got {:?}", other.map(|a| a.json)),
        }
    }

    #[test]
    fn test_huge_footprint_is_too_large() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture(
            "huge",
            create_test_texture(16, 16, [0, 0, 0, 255]).render_size(u32::MAX, 16),
        );
        match packer.pack() {
            Err(AssetsError::AtlasTooLarge { size, max, breakdown }) => {
                assert_eq!(size, u32::MAX);
                assert_eq!(max, MAX_ATLAS_SIZE);
                assert_eq!(breakdown, format!("{}x16(1)", u64::from(u32::MAX) + 1));
            }
            other => panic!("expected AtlasTooLarge, got {:?}", other.map(|a| a.json)),
        }

        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture(
            "strip",
            create_test_texture(16, 16, [0, 0, 0, 255]).tile_width_mult(u32::MAX),
        );
        assert!(matches!(packer.pack(), Err(AssetsError::AtlasTooLarge { .. })));
    }

    #[test]
    fn test_row_layout_past_u32_range_is_too_large() {
        let config = PackerConfig {
            tile_size: 16,
            max_size: u32::MAX,
        };
        let tall = (1u32 << 31) + 16;
        let mut packer = AtlasPacker::new(config);
        packer.add_texture("a", create_test_texture(16, 16, [0, 0, 0, 255]).render_size(16, tall));
        packer.add_texture("b", create_test_texture(16, 16, [0, 0, 0, 255]).render_size(16, tall));
        packer.add_texture("c", create_test_texture(16, 16, [0, 0, 0, 255]).render_size(16, tall));
        assert!(matches!(packer.pack(), Err(AssetsError::AtlasTooLarge { .. })));
    }

    #[test]
    fn test_cleaned_names_dedupe_on_add() {
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture("stone.png", create_test_texture(16, 16, [255, 0, 0, 255]));
        packer.add_texture("stone", create_test_texture(16, 16, [0, 0, 255, 255]));
        assert_eq!(packer.len(), 1);

        let atlas = packer.pack().unwrap();
        assert_eq!(atlas.json.textures.len(), 1);
        assert_eq!(atlas.image.dimensions(), (16, 16));
        assert_eq!(atlas.image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_encoded_contents() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([9, 9, 9, 255]));
        let bytes = canvas::encode_png(&image).unwrap();
        let mut packer = AtlasPacker::new(PackerConfig::default());
        packer.add_texture("encoded.png", TextureSource::from_bytes(bytes));
        let atlas = packer.pack().unwrap();
        assert!(atlas.json.get("encoded").is_some());
        assert!(!atlas.to_png().unwrap().is_empty());
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("stone.png"), "stone");
        assert_eq!(clean_name("1.16/stone.png"), "1.16/stone");
        assert_eq!(clean_name("1.16/stone"), "1.16/stone");
        assert_eq!(clean_name("stone"), "stone");
        assert_eq!(clean_name("a.b.png"), "a.b");
    }
}
