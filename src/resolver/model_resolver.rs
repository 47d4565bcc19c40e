//! Model inheritance resolution.

use super::{Diagnostics, ResolveIssue, ResolvedModel};
use crate::assets::{strip_minecraft_namespace, BlockModel};
use crate::error::{AssetsError, Result};
use crate::store::VersionedStore;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;

/// Outcome of following a `#alias` chain.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureResolution {
    /// A concrete texture path.
    Resolved(String),
    /// The chain revisits an alias; holds the visited aliases in order.
    Circular(Vec<String>),
    /// `alias` (reached from `key`) is never defined.
    Undefined { alias: String, key: String },
}

/// Reduce a texture value to the alias it references, if any.
/// "#all" -> "all", "block/#side" -> "side".
fn alias_of(value: &str) -> Option<&str> {
    if !value.contains('#') {
        return None;
    }
    let last = value.rsplit('/').next().unwrap_or(value);
    Some(last.strip_prefix('#').unwrap_or(last))
}

/// Follow the alias chain starting at `key` until a concrete path.
pub fn resolve_texture_alias(textures: &IndexMap<String, String>, key: &str) -> TextureResolution {
    let mut chain = vec![key.to_string()];
    let Some(mut value) = textures.get(key) else {
        return TextureResolution::Undefined {
            alias: key.to_string(),
            key: key.to_string(),
        };
    };
    loop {
        let Some(alias) = alias_of(value) else {
            return TextureResolution::Resolved(value.clone());
        };
        if chain.iter().any(|seen| seen == alias) {
            chain.push(alias.to_string());
            return TextureResolution::Circular(chain);
        }
        match textures.get(alias).filter(|v| !v.is_empty()) {
            Some(next) => {
                chain.push(alias.to_string());
                value = next;
            }
            None => {
                return TextureResolution::Undefined {
                    alias: alias.to_string(),
                    key: chain.last().cloned().unwrap_or_default(),
                }
            }
        }
    }
}

/// Parents the game renders itself. The chain stops there.
fn is_builtin_parent(name: &str) -> bool {
    name.starts_with("builtin/") || name == "item/generated"
}

/// Resolves model inheritance chains against a versioned model store.
#[derive(Debug, Clone)]
pub struct ModelResolver<'a> {
    models: &'a VersionedStore<BlockModel>,
    version: String,
}

impl<'a> ModelResolver<'a> {
    pub fn new(models: &'a VersionedStore<BlockModel>, version: impl Into<String>) -> Self {
        Self {
            models,
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Raw model as stored for this version.
    pub fn get(&self, name: &str) -> Option<&'a BlockModel> {
        self.models.get(&self.version, strip_minecraft_namespace(name))
    }

    /// Resolve a model by name. A missing model is recorded as an issue.
    pub fn resolve(&self, name: &str, diagnostics: &mut Diagnostics) -> Option<ResolvedModel> {
        let Some(model) = self.get(name) else {
            diagnostics.issue(ResolveIssue::ModelNotFound(name.to_string()));
            return None;
        };
        diagnostics.matched_models.push(name.to_string());
        let mut resolved = self.resolve_data(model, name, diagnostics);
        resolved.model = Some(name.to_string());
        Some(resolved)
    }

    /// Resolve an in-memory model (which may not be in the store).
    pub fn resolve_data(
        &self,
        model: &BlockModel,
        debug_name: &str,
        diagnostics: &mut Diagnostics,
    ) -> ResolvedModel {
        let mut chain = self.collect_chain(model, debug_name, diagnostics);
        chain.reverse();

        let mut resolved = ResolvedModel::default();
        for model in chain {
            merge_into(&mut resolved, model);
        }
        self.resolve_textures(&mut resolved, debug_name, diagnostics);
        resolved
    }

    /// Resolve a model, turning the first recorded issue into an error.
    pub fn resolve_strict(&self, name: &str) -> Result<ResolvedModel> {
        let mut diagnostics = Diagnostics::default();
        let resolved = self.resolve(name, &mut diagnostics);
        if let Some(issue) = diagnostics.issues.into_iter().next() {
            return Err(issue.into());
        }
        resolved.ok_or_else(|| AssetsError::ModelNotFound(name.to_string()))
    }

    /// Leaf first, root last.
    fn collect_chain<'m>(
        &self,
        leaf: &'m BlockModel,
        debug_name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<&'m BlockModel>
    where
        'a: 'm,
    {
        let mut chain = vec![leaf];
        let mut visited: HashSet<&str> = HashSet::new();
        let mut path = vec![debug_name.to_string()];
        let mut current = leaf;

        while let Some(parent) = current.parent.as_deref() {
            let parent = strip_minecraft_namespace(parent);
            if is_builtin_parent(parent) {
                break;
            }
            path.push(parent.to_string());
            if !visited.insert(parent) {
                diagnostics.issue(ResolveIssue::CircularParent(path));
                break;
            }
            match self.get(parent) {
                Some(model) => {
                    diagnostics.matched_models.push(format!("parent:{}", parent));
                    chain.push(model);
                    current = model;
                }
                None => {
                    diagnostics.issue(ResolveIssue::ParentNotFound {
                        parent: parent.to_string(),
                        model: debug_name.to_string(),
                    });
                    break;
                }
            }
        }
        chain
    }

    fn resolve_textures(
        &self,
        resolved: &mut ResolvedModel,
        debug_name: &str,
        diagnostics: &mut Diagnostics,
    ) {
        let pending: Vec<String> = resolved
            .textures
            .iter()
            .filter(|(_, value)| value.contains('#'))
            .map(|(key, _)| key.clone())
            .collect();

        for key in pending {
            match resolve_texture_alias(&resolved.textures, &key) {
                TextureResolution::Resolved(path) => {
                    resolved.textures.insert(key, path);
                }
                TextureResolution::Circular(chain) => {
                    diagnostics.issue(ResolveIssue::CircularTexture {
                        model: debug_name.to_string(),
                        chain,
                    });
                    resolved.textures.shift_remove(&key);
                }
                TextureResolution::Undefined { alias, key: from } => {
                    diagnostics.issue(ResolveIssue::UndefinedTexture {
                        model: debug_name.to_string(),
                        alias,
                        key: from,
                    });
                    resolved.textures.shift_remove(&key);
                }
            }
        }

        let textures = &resolved.textures;
        for element in resolved.elements.iter_mut().flatten() {
            for face in element.faces.values_mut() {
                if face.texture.is_empty() {
                    continue;
                }
                let alias = face.texture.replacen('#', "", 1);
                if let Some(path) = textures.get(&alias) {
                    face.texture = path.clone();
                }
            }
        }
    }
}

/// Merge one model (processed root to leaf) into the accumulated result.
fn merge_into(resolved: &mut ResolvedModel, model: &BlockModel) {
    for (key, value) in &model.textures {
        let mut value = match alias_of(value) {
            Some(alias) => format!("#{}", alias),
            None => value.clone(),
        };
        if let Some(alias) = value.strip_prefix('#') {
            if let Some(existing) = resolved.textures.get(alias).filter(|v| !v.is_empty()) {
                value = existing.clone();
            }
        }
        resolved.textures.insert(key.clone(), value);
    }

    if let Some(elements) = &model.elements {
        resolved.elements = Some(elements.clone());
    }
    if model.ambient_occlusion.is_some() {
        resolved.ambient_occlusion = model.ambient_occlusion;
    }
    if model.ao.is_some() {
        resolved.ao = model.ao;
    }
    if let Some(display) = &model.display {
        merge_value(&mut resolved.display, display);
    }
    for (key, value) in &model.extra {
        match (resolved.extra.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                resolved.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Objects merge one level deep, anything else is replaced.
fn merge_value(target: &mut Option<Value>, incoming: &Value) {
    match (target.as_mut(), incoming) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                existing.insert(k.clone(), v.clone());
            }
        }
        _ => *target = Some(incoming.clone()),
    }
}
