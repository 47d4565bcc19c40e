//! Block state and model resolution.
//!
//! This module handles resolving block states to concrete model variants
//! and resolving model inheritance chains. Query-time failures are soft:
//! they are recorded in [`Diagnostics`] and the query returns `None`.

pub mod full_block;
pub mod model_resolver;
pub mod state_resolver;

pub use full_block::{full_block_faces, FullBlockFaces};
pub use model_resolver::{resolve_texture_alias, ModelResolver, TextureResolution};
pub use state_resolver::StateResolver;

use crate::assets::{AssetStores, BlockModel, BlockStates, ModelElement, ModelVariant};
use crate::error::AssetsError;
use crate::store::VersionedStore;
use crate::types::{namespace_of, BlockTransform, QueriedBlock};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A soft failure recorded during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveIssue {
    UnknownBlock(String),
    NoMatchingState { block: String, possible: usize },
    ModelNotFound(String),
    ParentNotFound { parent: String, model: String },
    CircularParent(Vec<String>),
    CircularTexture { model: String, chain: Vec<String> },
    UndefinedTexture { model: String, alias: String, key: String },
}

impl fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveIssue::UnknownBlock(name) => write!(
                f,
                "Block {} not found in all registered blockstates. Place it into assets/{}/blockstates/{}.json",
                name,
                namespace_of(name),
                name
            ),
            ResolveIssue::NoMatchingState { block, possible } if *possible > 0 => write!(
                f,
                "Block {} did not match any possible state ({} possible states)",
                block, possible
            ),
            ResolveIssue::NoMatchingState { block, .. } => {
                write!(f, "Blockstates for {} are not defined", block)
            }
            ResolveIssue::ModelNotFound(model) => write!(
                f,
                "Model {} not found. Ensure it is present in assets/{}/models/{}.json",
                model,
                namespace_of(model),
                model
            ),
            ResolveIssue::ParentNotFound { parent, model } => {
                write!(f, "Parent model {} not found for {}", parent, model)
            }
            ResolveIssue::CircularParent(chain) => {
                write!(f, "Circular parent chain: {}", chain.join(" -> "))
            }
            ResolveIssue::CircularTexture { model, chain } => write!(
                f,
                "{}: Circular texture reference detected: {}",
                model,
                chain.join(" -> ")
            ),
            ResolveIssue::UndefinedTexture { model, alias, key } => write!(
                f,
                "{}: Cannot resolve texture {} for {} because it is not defined",
                model, alias, key
            ),
        }
    }
}

impl From<ResolveIssue> for AssetsError {
    fn from(issue: ResolveIssue) -> Self {
        match issue {
            ResolveIssue::UnknownBlock(name) => AssetsError::BlockstateNotFound(name),
            ResolveIssue::NoMatchingState { .. } => AssetsError::BlockstateNotFound(issue.to_string()),
            ResolveIssue::ModelNotFound(_) | ResolveIssue::ParentNotFound { .. } => {
                AssetsError::ModelNotFound(issue.to_string())
            }
            ResolveIssue::CircularParent(chain) => AssetsError::CircularParent(chain.join(" -> ")),
            ResolveIssue::CircularTexture { .. } => {
                AssetsError::CircularTextureReference(issue.to_string())
            }
            ResolveIssue::UndefinedTexture { .. } => AssetsError::UnresolvedTexture(issue.to_string()),
        }
    }
}

/// Diagnostic lists accumulated by a resolver.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Soft failures. Never cleared by the resolver.
    pub issues: Vec<ResolveIssue>,
    /// Models and parents visited by the last block query.
    pub matched_models: Vec<String>,
    /// Variant keys / multipart conditions matched by the last block query.
    pub matched_conditions: Vec<String>,
}

impl Diagnostics {
    pub fn issue(&mut self, issue: ResolveIssue) {
        log::warn!("{}", issue);
        self.issues.push(issue);
    }

    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// A model with its parent chain flattened and texture aliases substituted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedModel {
    /// Name of the model the variant referenced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub transform: BlockTransform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub textures: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ModelElement>>,
    #[serde(rename = "ambientocclusion", skip_serializing_if = "Option::is_none")]
    pub ambient_occlusion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ao: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedModel {
    fn with_variant(mut self, variant: &ModelVariant) -> Self {
        self.transform = variant.transform();
        self.weight = variant.weight;
        self
    }
}

/// Element bounds `(from, to)` in 0-16 space.
pub type ElementBounds = ([f32; 3], [f32; 3]);

/// Geometry of a block state.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockElements {
    /// Exactly one element spanning the whole block.
    FullBlock,
    Boxes(Vec<ElementBounds>),
}

impl BlockElements {
    pub fn is_full_block(&self) -> bool {
        matches!(self, BlockElements::FullBlock)
    }
}

impl Serialize for BlockElements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockElements::FullBlock => serializer.serialize_u8(1),
            BlockElements::Boxes(boxes) => boxes.serialize(serializer),
        }
    }
}

/// Resolves blocks to their models for one game version.
#[derive(Debug, Clone)]
pub struct BlockResolver<'a> {
    states: StateResolver<'a>,
    models: ModelResolver<'a>,
    pub diagnostics: Diagnostics,
    elements_cache: HashMap<u32, BlockElements>,
}

impl<'a> BlockResolver<'a> {
    pub fn new(version: &str, stores: &'a AssetStores) -> Self {
        Self::from_stores(version, &stores.blockstates, &stores.models)
    }

    pub fn from_stores(
        version: &str,
        blockstates: &'a VersionedStore<BlockStates>,
        models: &'a VersionedStore<BlockModel>,
    ) -> Self {
        Self {
            states: StateResolver::new(blockstates, version),
            models: ModelResolver::new(models, version),
            diagnostics: Diagnostics::default(),
            elements_cache: HashMap::new(),
        }
    }

    pub fn version(&self) -> &str {
        self.models.version()
    }

    pub fn model_resolver(&self) -> &ModelResolver<'a> {
        &self.models
    }

    pub fn issues(&self) -> &[ResolveIssue] {
        &self.diagnostics.issues
    }

    /// One resolved model per part: the first variant of weighted lists.
    pub fn resolved_model_first(
        &mut self,
        block: &QueriedBlock,
        fallback_variant: bool,
    ) -> Option<Vec<ResolvedModel>> {
        let parts = self.resolve_parts(block, fallback_variant, |variants| {
            variants.first().into_iter().collect()
        })?;
        Some(parts.into_iter().filter_map(|p| p.into_iter().next()).collect())
    }

    /// Every variant of every part, for debugging and validation.
    pub fn all_resolved_models(
        &mut self,
        block: &QueriedBlock,
        fallback_variant: bool,
    ) -> Option<Vec<Vec<ResolvedModel>>> {
        self.resolve_parts(block, fallback_variant, |variants| variants.iter().collect())
    }

    /// One resolved model per part, picking weighted lists at random by
    /// `weight` (default 1).
    pub fn resolved_model_random<R: Rng>(
        &mut self,
        block: &QueriedBlock,
        fallback_variant: bool,
        rng: &mut R,
    ) -> Option<Vec<ResolvedModel>> {
        let parts = self.resolve_parts(block, fallback_variant, |variants| {
            pick_weighted(variants, rng).into_iter().collect()
        })?;
        Some(parts.into_iter().filter_map(|p| p.into_iter().next()).collect())
    }

    /// Resolve a model by name, outside of any blockstate.
    pub fn resolve_model(&mut self, name: &str) -> Option<ResolvedModel> {
        self.models.resolve(name, &mut self.diagnostics)
    }

    /// Resolve an in-memory model against this version's parents.
    pub fn resolve_model_data(&mut self, model: &BlockModel, debug_name: &str) -> ResolvedModel {
        self.models
            .resolve_data(model, debug_name, &mut self.diagnostics)
    }

    /// Element bounds of the first resolved model of every part.
    pub fn elements(&mut self, block: &QueriedBlock, fallback_variant: bool) -> Option<BlockElements> {
        let models = self.resolved_model_first(block, fallback_variant)?;
        let bounds: Vec<ElementBounds> = models
            .iter()
            .flat_map(|m| m.elements.iter().flatten())
            .map(|e| (e.from, e.to))
            .collect();
        if bounds.len() == 1 && bounds[0] == ([0.0, 0.0, 0.0], [16.0, 16.0, 16.0]) {
            Some(BlockElements::FullBlock)
        } else {
            Some(BlockElements::Boxes(bounds))
        }
    }

    /// [`elements`](Self::elements) memoized by `state_id`. Unresolvable
    /// blocks cache as no boxes.
    pub fn elements_cached(&mut self, block: &QueriedBlock) -> BlockElements {
        if let Some(cached) = self.elements_cache.get(&block.state_id) {
            return cached.clone();
        }
        let elements = self
            .elements(block, false)
            .unwrap_or_else(|| BlockElements::Boxes(Vec::new()));
        self.elements_cache.insert(block.state_id, elements.clone());
        elements
    }

    fn resolve_parts<F>(
        &mut self,
        block: &QueriedBlock,
        fallback_variant: bool,
        mut choose: F,
    ) -> Option<Vec<Vec<ResolvedModel>>>
    where
        F: FnMut(&'a [ModelVariant]) -> Vec<&'a ModelVariant>,
    {
        self.diagnostics.matched_models.clear();
        self.diagnostics.matched_conditions.clear();

        let parts = self
            .states
            .select(block, fallback_variant, &mut self.diagnostics)?;

        let mut resolved = Vec::with_capacity(parts.len());
        for apply in parts {
            let mut part = Vec::new();
            for variant in choose(apply.variants()) {
                if let Some(model) = self.models.resolve(&variant.model, &mut self.diagnostics) {
                    part.push(model.with_variant(variant));
                }
            }
            resolved.push(part);
        }
        Some(resolved)
    }
}

/// Pick one variant with probability proportional to its weight.
fn pick_weighted<'v, R: Rng>(variants: &'v [ModelVariant], rng: &mut R) -> Option<&'v ModelVariant> {
    let total: u64 = variants.iter().map(|v| u64::from(v.weight_or_default())).sum();
    if total == 0 {
        return variants.first();
    }
    let mut roll = rng.gen_range(0..total);
    for variant in variants {
        let weight = u64::from(variant.weight_or_default());
        if roll < weight {
            return Some(variant);
        }
        roll -= weight;
    }
    variants.last()
}
