//! Asset data: blockstates, models and item definitions.
//!
//! The build pass in [`loader`] reads extracted game data and produces a
//! [`BlockStatesModels`] artifact. At query time that artifact is hydrated
//! into [`AssetStores`], a pair of versioned stores the resolver reads from.

pub mod blockstate;
pub mod item_definition;
pub mod loader;
pub mod model;

pub use blockstate::{ApplyModel, BlockStates, Condition, ModelVariant, MultipartCase};
pub use item_definition::{DateCondition, ItemDefinition, ItemModelNode, RangeEntry, SelectCase, SelectWhen, Tint};
pub use model::{BlockModel, ModelElement, ModelFace};

use crate::error::Result;
use crate::store::{StoreData, VersionedStore};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized blockstates + models artifact (`blockStatesModels.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatesModels {
    pub blockstates: StoreData<BlockStates>,
    pub models: StoreData<BlockModel>,
    /// Models whose parent is rendered by the game itself, keyed by model
    /// name, e.g. `"item/bow" -> "item/generated"`.
    #[serde(default)]
    pub hardcoded_models: IndexMap<String, String>,
    /// Latest item models no other model inherits from, without the
    /// `item/` prefix. These are the items a player can actually hold.
    #[serde(default)]
    pub latest_root_items: Vec<String>,
}

impl BlockStatesModels {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Query-time stores built from a [`BlockStatesModels`] artifact.
///
/// Buckets in the artifact hold the value in effect *before* that version,
/// so both stores use exclusive lookups.
#[derive(Debug, Clone, Default)]
pub struct AssetStores {
    pub blockstates: VersionedStore<BlockStates>,
    pub models: VersionedStore<BlockModel>,
    pub hardcoded_models: IndexMap<String, String>,
}

impl AssetStores {
    pub fn from_data(data: BlockStatesModels) -> Self {
        Self {
            blockstates: VersionedStore::from_data(data.blockstates, false).with_inclusive(false),
            models: VersionedStore::from_data(data.models, false).with_inclusive(false),
            hardcoded_models: data.hardcoded_models,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_data(BlockStatesModels::load(path)?))
    }
}

/// Serialized item definitions artifact (`itemDefinitions.json`).
pub type ItemDefinitionsData = StoreData<ItemDefinition>;

/// Hydrate an item definitions store (exclusive lookups).
pub fn item_definitions_store(data: ItemDefinitionsData) -> VersionedStore<ItemDefinition> {
    VersionedStore::from_data(data, false).with_inclusive(false)
}

/// Load and hydrate `itemDefinitions.json`.
pub fn load_item_definitions<P: AsRef<Path>>(path: P) -> Result<VersionedStore<ItemDefinition>> {
    let contents = std::fs::read_to_string(path)?;
    let data: ItemDefinitionsData = serde_json::from_str(&contents)?;
    Ok(item_definitions_store(data))
}

/// Strip the default namespace from a resource location.
/// "minecraft:block/stone" -> "block/stone", "mymod:block/x" is unchanged.
pub fn strip_minecraft_namespace(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_minecraft_namespace("minecraft:block/stone"), "block/stone");
        assert_eq!(strip_minecraft_namespace("block/stone"), "block/stone");
        assert_eq!(strip_minecraft_namespace("mymod:block/x"), "mymod:block/x");
    }

    #[test]
    fn test_stores_are_exclusive() {
        let json = r#"{
            "blockstates": {
                "latest": { "stone": { "variants": { "": { "model": "block/stone" } } } },
                "1.13": { "stone": { "variants": { "": { "model": "block/stone_old" } } } }
            },
            "models": {
                "latest": { "block/stone": { "parent": "block/cube_all" } }
            },
            "hardcodedModels": { "item/bow": "item/generated" }
        }"#;
        let stores = AssetStores::from_data(BlockStatesModels::from_json_str(json).unwrap());

        let model_of = |version: &str| {
            let states = stores.blockstates.get(version, "stone").unwrap();
            states.variants.as_ref().unwrap()[""].variants()[0].model.clone()
        };
        assert_eq!(model_of("1.12.2"), "block/stone_old");
        assert_eq!(model_of("1.13"), "block/stone");
        assert_eq!(model_of("1.20"), "block/stone");
        assert_eq!(stores.hardcoded_models["item/bow"], "item/generated");
        assert!(stores.models.get("1.13", "block/stone").is_some());
    }
}
