//! Atlas visualization.

use super::canvas::{draw_outline, Rect};
use super::json::JsonAtlas;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

const OUTLINE_COLORS: [Rgba<u8>; 4] = [
    Rgba([255, 0, 0, 255]),
    Rgba([0, 255, 0, 255]),
    Rgba([0, 128, 255, 255]),
    Rgba([255, 255, 0, 255]),
];

/// Scale `image` up by `scale` and outline every texture of `atlas`.
pub fn create_debug_image(atlas: &JsonAtlas, image: &RgbaImage, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let mut out = imageops::resize(
        image,
        image.width() * scale,
        image.height() * scale,
        FilterType::Nearest,
    );
    let (sx, sy) = (
        f64::from(out.width()) / f64::from(atlas.width.max(1)),
        f64::from(out.height()) / f64::from(atlas.height.max(1)),
    );
    for (i, texture) in atlas.textures.values().enumerate() {
        let (x, y, w, h) = atlas.pixel_rect(texture);
        let rect = Rect::new(
            (f64::from(x) * sx) as u32,
            (f64::from(y) * sy) as u32,
            (f64::from(w) * sx) as u32,
            (f64::from(h) * sy) as u32,
        );
        draw_outline(&mut out, rect, OUTLINE_COLORS[i % OUTLINE_COLORS.len()]);
    }
    out
}
