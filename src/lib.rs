//! # mc-assets
//!
//! Version-aware access to Minecraft blockstates, block models, item
//! definitions and texture atlases.
//!
//! ## Overview
//!
//! A build pass reads extracted game data and writes delta-compressed
//! artifacts (`blockStatesModels.json`, `itemDefinitions.json` and atlas
//! JSON/PNG pairs). At query time those artifacts are loaded into
//! [`VersionedStore`]s and answer questions such as "which models does
//! `oak_stairs[facing=east]` render with in 1.16?" or "where is
//! `block/stone` in the atlas for 1.12?".
//!
//! ## Quick Start
//!
//! ```ignore
//! use mc_assets::{load_asset_stores, AtlasParser, BlockResolver, QueriedBlock};
//!
//! let stores = load_asset_stores("dist/blockStatesModels.json")?;
//! let atlas = AtlasParser::load(
//!     "dist/blocksAtlases.json",
//!     "dist/blocksAtlasLatest.png",
//!     Some("dist/blocksAtlasLegacy.png"),
//! )?;
//!
//! let mut resolver = BlockResolver::new("1.16.5", &stores);
//! let block = QueriedBlock::new("oak_stairs").with_property("facing", "east");
//! let models = resolver.resolved_model_first(&block, true);
//!
//! let stone = atlas.get_texture_info("stone", "1.16.5");
//! ```
//!
//! ## Items
//!
//! ```ignore
//! use mc_assets::{get_item_definition, load_item_definitions, ItemSelector};
//!
//! let definitions = load_item_definitions("dist/itemDefinitions.json")?;
//! let selector = ItemSelector::new("1.21.4", "bow")
//!     .with_property("minecraft:using_item", true)
//!     .with_property("use_duration_ms", 600.0);
//! let resolved = get_item_definition(&definitions, &selector);
//! ```

pub mod assets;
pub mod atlas;
pub mod error;
pub mod items;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use assets::{
    load_item_definitions, AssetStores, BlockModel, BlockStates, BlockStatesModels, ItemDefinition, ModelElement,
};
pub use atlas::{AtlasPacker, AtlasParser, AtlasesJson, JsonAtlas, PackerConfig, TextureInfo, TextureSource};
pub use error::{AssetsError, Result};
pub use items::{get_item_definition, ItemSelector, ItemsRenderer, ResolvedItemModel};
pub use provider::WorldBlockProvider;
pub use resolver::{BlockResolver, ResolveIssue, ResolvedModel};
pub use store::{version_to_number, VersionedStore, VersionedStoreBuilder};
pub use types::{Direction, QueriedBlock};

/// Load `blockStatesModels.json` into query-time stores.
pub fn load_asset_stores<P: AsRef<std::path::Path>>(path: P) -> Result<AssetStores> {
    AssetStores::load(path)
}

/// Run the build pass over an extracted data directory.
pub fn build_asset_stores<P: AsRef<std::path::Path>>(data_dir: P) -> Result<BlockStatesModels> {
    let dir = assets::loader::DataDir::open(data_dir)?;
    assets::loader::build_blockstates_models(&dir, &assets::loader::BuildOptions::default())
}
