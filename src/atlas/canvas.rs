//! Pixel operations on RGBA images: decoding, region copies, outlines.

use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgba, RgbaImage};

/// Decode PNG (or any enabled format) bytes into RGBA.
pub fn load_texture_from_bytes(data: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(data)?.to_rgba8())
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes));
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge. Widened so `x + width` never wraps.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        u64::from(self.x) < other.right()
            && u64::from(other.x) < self.right()
            && u64::from(self.y) < other.bottom()
            && u64::from(other.y) < self.bottom()
    }
}

/// Copy `src_rect` of `source` onto `canvas` at `dst_rect`, scaling with
/// nearest-neighbor sampling. Existing canvas pixels are overwritten.
pub fn draw_region(canvas: &mut RgbaImage, source: &RgbaImage, src_rect: Rect, dst_rect: Rect) -> Result<(), String> {
    if src_rect.width == 0 || src_rect.height == 0 || dst_rect.width == 0 || dst_rect.height == 0 {
        return Err(format!("empty region {:?} -> {:?}", src_rect, dst_rect));
    }
    if !src_rect.fits_in(source.width(), source.height()) {
        return Err(format!(
            "source region {:?} outside {}x{} image",
            src_rect,
            source.width(),
            source.height()
        ));
    }
    if !dst_rect.fits_in(canvas.width(), canvas.height()) {
        return Err(format!(
            "target region {:?} outside {}x{} canvas",
            dst_rect,
            canvas.width(),
            canvas.height()
        ));
    }

    let cropped = imageops::crop_imm(source, src_rect.x, src_rect.y, src_rect.width, src_rect.height).to_image();
    let scaled = if cropped.dimensions() == (dst_rect.width, dst_rect.height) {
        cropped
    } else {
        imageops::resize(&cropped, dst_rect.width, dst_rect.height, FilterType::Nearest)
    };
    imageops::replace(canvas, &scaled, i64::from(dst_rect.x), i64::from(dst_rect.y));
    Ok(())
}

/// Draw a one pixel rectangle outline, clipped to the image.
pub fn draw_outline(image: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (w, h) = image.dimensions();
    if rect.x >= w || rect.y >= h {
        return;
    }
    // clipped to the image, so both fit in u32
    let right = rect.right().min(u64::from(w)) as u32 - 1;
    let bottom = rect.bottom().min(u64::from(h)) as u32 - 1;
    for x in rect.x..=right {
        image.put_pixel(x, rect.y, color);
        image.put_pixel(x, bottom, color);
    }
    for y in rect.y..=bottom {
        image.put_pixel(rect.x, y, color);
        image.put_pixel(right, y, color);
    }
}

/// A magenta/black checkerboard used where a texture is unavailable.
pub fn placeholder(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / 2) + (y / 2)) % 2 == 0 {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}
