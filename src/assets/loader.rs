//! Build pass over extracted game data.
//!
//! Input is a data directory with a `data-paths.json` index of the form
//! `version -> category ("blockstates/", "models/", "items/", "textures/")
//! -> file name -> path relative to the data directory`. Each version
//! bucket only lists files that changed, so the index is already delta
//! compressed and is copied bucket for bucket.

use super::{BlockModel, BlockStates, BlockStatesModels, ItemDefinition, ItemDefinitionsData};
use crate::error::{AssetsError, Result};
use crate::store::{version_to_number, LATEST};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// `version -> category -> file name -> relative path`.
pub type DataPaths = IndexMap<String, IndexMap<String, IndexMap<String, String>>>;

const BLOCKSTATES_KEY: &str = "blockstates/";
const MODELS_KEY: &str = "models/";
const ITEMS_KEY: &str = "items/";

/// Parents the game renders itself; models using them are kept but the
/// parent is never looked up.
const HARDCODED_PARENTS: [&str; 3] = ["builtin/entity", "item/generated", "builtin/generated"];

/// Build pass configuration.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Oldest version included in the output.
    pub version_clip: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            version_clip: "1.13".to_string(),
        }
    }
}

/// An extracted data directory and its path index.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    paths: DataPaths,
}

impl DataDir {
    /// Open a data directory containing `data-paths.json`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(root.join("data-paths.json"))?;
        let paths = serde_json::from_str(&contents)?;
        Ok(Self { root, paths })
    }

    pub fn new(root: impl Into<PathBuf>, paths: DataPaths) -> Self {
        Self {
            root: root.into(),
            paths,
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files of one category in one version bucket.
    pub fn files(&self, version: &str, category: &str) -> Option<&IndexMap<String, String>> {
        self.paths.get(version).and_then(|v| v.get(category))
    }

    pub fn read_bytes(&self, relative: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.root.join(relative))?)
    }

    pub fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let contents = std::fs::read_to_string(self.root.join(relative))?;
        serde_json::from_str(&contents)
            .map_err(|e| AssetsError::InvalidData(format!("{}: {}", relative, e)))
    }
}

/// Normalize a model or texture reference: drop the `minecraft:` namespace
/// and prefix anything outside `block/` and `item/` with `block/`.
pub fn normalize_model_string(value: &str) -> String {
    let value = value.strip_prefix("minecraft:").unwrap_or(value);
    if value.starts_with("block/") || value.starts_with("item/") || value.starts_with('#') {
        value.to_string()
    } else {
        format!("block/{}", value)
    }
}

/// Normalize parent, texture and override references of a model in place.
pub fn normalize_model(model: &mut BlockModel) {
    if let Some(parent) = &mut model.parent {
        if let Some(stripped) = parent.strip_prefix("minecraft:") {
            *parent = stripped.to_string();
        }
    }
    for value in model.textures.values_mut() {
        *value = normalize_model_string(value);
    }
    if let Some(overrides) = model
        .extra
        .get_mut("overrides")
        .and_then(serde_json::Value::as_array_mut)
    {
        for entry in overrides {
            if let Some(serde_json::Value::String(name)) = entry.get_mut("model") {
                *name = normalize_model_string(name);
            }
        }
    }
}

/// Normalize every model reference of a blockstate definition in place.
///
/// An empty weighted variant list is invalid data. An empty multipart list
/// is dropped.
pub fn normalize_blockstates(name: &str, states: &mut BlockStates) -> Result<()> {
    if let Some(variants) = &states.variants {
        for (key, apply) in variants {
            if apply.variants().is_empty() {
                return Err(AssetsError::InvalidData(format!(
                    "Empty variants array in {} ({})",
                    name, key
                )));
            }
        }
    }
    if states.multipart.as_ref().map_or(false, Vec::is_empty) {
        states.multipart = None;
    }
    for variant in states.all_variants_mut() {
        variant.model = normalize_model_string(&variant.model);
    }
    Ok(())
}

/// Every model referenced by a blockstate must exist.
pub fn validate_blockstates(
    states: &IndexMap<String, BlockStates>,
    models: &IndexMap<String, BlockModel>,
) -> Result<()> {
    for (name, state) in states {
        for variant in state.all_variants() {
            if !models.contains_key(&variant.model) {
                return Err(AssetsError::InvalidData(format!(
                    "Model {} referenced by {} doesn't exist",
                    variant.model, name
                )));
            }
        }
    }
    Ok(())
}

/// Every parent and override model must exist, unless it is rendered by
/// the game itself. Those are recorded in `hardcoded`.
pub fn validate_models(
    models: &IndexMap<String, BlockModel>,
    hardcoded: &mut IndexMap<String, String>,
) -> Result<()> {
    for (name, model) in models {
        if let Some(parent) = &model.parent {
            check_model_reference(models, hardcoded, name, parent, "parent model")?;
        }
        for target in model.override_models() {
            check_model_reference(models, hardcoded, name, target, "override with model")?;
        }
    }
    Ok(())
}

fn check_model_reference(
    models: &IndexMap<String, BlockModel>,
    hardcoded: &mut IndexMap<String, String>,
    name: &str,
    target: &str,
    what: &str,
) -> Result<()> {
    if models.contains_key(target) {
        return Ok(());
    }
    if HARDCODED_PARENTS.contains(&target) {
        hardcoded.insert(name.to_string(), target.to_string());
        return Ok(());
    }
    Err(AssetsError::InvalidData(format!(
        "Model {} has {} {} but it doesn't exist",
        name, what, target
    )))
}

/// Item model names (without `item/`) that are never used as a parent.
pub fn root_items(models: &IndexMap<String, BlockModel>) -> Vec<String> {
    let parents: HashSet<&str> = models.values().filter_map(|m| m.parent.as_deref()).collect();
    models
        .keys()
        .filter(|name| !parents.contains(name.as_str()))
        .filter_map(|name| name.strip_prefix("item/"))
        .map(str::to_string)
        .collect()
}

fn file_stem(file_name: &str) -> &str {
    file_name.strip_suffix(".json").unwrap_or(file_name)
}

/// Versions at or above the clip, in index order.
fn clipped_versions<'a>(dir: &'a DataDir, clip: u32) -> impl Iterator<Item = &'a String> {
    dir.paths
        .keys()
        .filter(move |version| version_to_number(version) >= clip)
}

/// Build the blockstates + models artifact.
pub fn build_blockstates_models(dir: &DataDir, options: &BuildOptions) -> Result<BlockStatesModels> {
    let clip = version_to_number(&options.version_clip);
    let mut output = BlockStatesModels::default();

    for version in clipped_versions(dir, clip) {
        if let Some(files) = dir.files(version, BLOCKSTATES_KEY) {
            let bucket = output.blockstates.entry(version.clone()).or_default();
            for (file_name, path) in files {
                let name = file_stem(file_name);
                let mut states: BlockStates = dir.read_json(path)?;
                normalize_blockstates(name, &mut states)?;
                bucket.insert(name.to_string(), states);
            }
        }

        if let Some(files) = dir.files(version, MODELS_KEY) {
            let bucket = output.models.entry(version.clone()).or_default();
            for (file_name, path) in files {
                let name = file_stem(file_name);
                if name == "item/generated" {
                    continue;
                }
                let mut model: BlockModel = dir.read_json(path)?;
                normalize_model(&mut model);
                bucket.insert(name.to_string(), model);
            }
        }
        log::debug!("Processed assets of {}", version);
    }

    let empty = IndexMap::new();
    let latest_models = output.models.get(LATEST).unwrap_or(&empty);
    if let Some(latest_states) = output.blockstates.get(LATEST) {
        validate_blockstates(latest_states, latest_models)?;
    }
    validate_models(latest_models, &mut output.hardcoded_models)?;
    output.latest_root_items = root_items(latest_models);

    log::info!(
        "Built {} blockstate and {} model buckets",
        output.blockstates.len(),
        output.models.len()
    );
    Ok(output)
}

/// Build the item definitions artifact from `items/` entries.
pub fn build_item_definitions(dir: &DataDir) -> Result<ItemDefinitionsData> {
    let mut output = ItemDefinitionsData::new();
    let versions = dir
        .paths
        .keys()
        .filter(|v| v.as_str() != LATEST)
        .chain(dir.paths.get_key_value(LATEST).map(|(k, _)| k));

    for version in versions {
        let bucket = output.entry(version.clone()).or_default();
        let Some(files) = dir.files(version, ITEMS_KEY) else {
            continue;
        };
        for (file_name, path) in files {
            if !file_name.ends_with(".json") {
                continue;
            }
            let definition: ItemDefinition = dir.read_json(path)?;
            bucket.insert(file_stem(file_name).to_string(), definition);
        }
    }
    Ok(output)
}
