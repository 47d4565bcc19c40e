//! Texture atlases.
//!
//! [`AtlasPacker`] combines named textures into one power-of-two image and a
//! [`JsonAtlas`] UV table. [`AtlasParser`] serves lookups over a
//! `{latest, legacy}` atlas pair by game version and can repack the textures
//! of any version into a new atlas.

pub mod build;
mod builder;
pub mod canvas;
mod debug;
mod json;
mod parser;

pub use build::{build_atlases, AtlasFamily, BuiltAtlases};
pub use builder::{clean_name, AtlasPacker, PackedAtlas, PackerConfig, TextureSource, MAX_ATLAS_SIZE};
pub use debug::create_debug_image;
pub use json::{AtlasesJson, JsonAtlas, JsonTexture};
pub use parser::{
    AtlasOrder, AtlasParser, CustomImage, ImageType, MakeAtlasOptions, NewAtlas, StoredTexture, TextureInfo,
};
