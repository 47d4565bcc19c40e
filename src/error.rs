//! Error types for asset resolution and atlas packing.

use thiserror::Error;

/// Result type alias using AssetsError.
pub type Result<T> = std::result::Result<T, AssetsError>;

/// Main error type for asset resolution and atlas operations.
#[derive(Error, Debug)]
pub enum AssetsError {
    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or process an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model (or parent model) is not present in the store.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// No blockstate definition registered for the block.
    #[error("Blockstate not found: {0}")]
    BlockstateNotFound(String),

    /// A `#alias` texture chain points back at itself.
    #[error("Circular texture reference: {0}")]
    CircularTextureReference(String),

    /// A `#alias` texture reference names an alias that is never defined.
    #[error("Unresolved texture reference: {0}")]
    UnresolvedTexture(String),

    /// A model's parent chain loops.
    #[error("Circular parent chain: {0}")]
    CircularParent(String),

    /// Build-pass data integrity failure (missing model, empty variant list, ...).
    #[error("Invalid asset data: {0}")]
    InvalidData(String),

    /// Item definition could not be evaluated.
    #[error("Item model error: {0}")]
    ItemModel(String),

    /// Packed atlas would exceed the maximum image size.
    #[error("Required atlas size {size} exceeds maximum {max}. Texture sizes: {breakdown}")]
    AtlasTooLarge {
        size: u32,
        max: u32,
        breakdown: String,
    },

    /// Texture source has neither an image nor encoded contents.
    #[error("No image or contents for texture {0}")]
    MissingTextureSource(String),

    /// Requested source rectangle lies outside the source image.
    #[error("Source rectangle of {name} ({x},{y} {width}x{height}) exceeds image bounds {image_width}x{image_height}")]
    SourceOutOfBounds {
        name: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Lower-level image copy failed for a texture.
    #[error("Error drawing {name}: {message}")]
    TextureDraw { name: String, message: String },

    /// Atlas lookup returned nothing for a texture that must exist.
    #[error("Missing texture info for {0}")]
    MissingTextureInfo(String),

    /// A full-block model lacks one of the faces needed for an icon.
    #[error("Missing {face} face for full block {block}")]
    MissingFace { block: String, face: &'static str },
}
