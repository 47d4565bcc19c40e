//! Item definition evaluation.

use super::{
    ItemProperties, ItemPropertyValue, ItemSelector, ItemTexture, ItemsRenderer, ResolvedItemModel, WatchKind,
    WatchProperty, USE_DURATION_MS,
};
use crate::assets::{strip_minecraft_namespace, ItemDefinition, ItemModelNode};
use crate::error::{AssetsError, Result};
use crate::store::VersionedStore;
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;

const USE_DURATION: &str = "minecraft:use_duration";
const TIME: &str = "minecraft:time";
const DATE_PROPERTIES: [&str; 2] = ["minecraft:local_time", "minecraft:date"];
const TICK_MS: f64 = 50.0;

/// Replace the first `MM` and `dd` of `pattern` with the zero padded month
/// and day of `date`.
pub fn format_date_pattern(date: NaiveDate, pattern: &str) -> String {
    pattern
        .replacen("MM", &format!("{:02}", date.month()), 1)
        .replacen("dd", &format!("{:02}", date.day()), 1)
}

/// Evaluate an item definition for `selector`.
///
/// `use_duration_ms` is converted to `minecraft:use_duration` ticks first.
/// Returns `None` when the item has no definition for the version or the
/// definition cannot be evaluated; evaluation failures are logged.
pub fn get_item_definition(
    store: &VersionedStore<ItemDefinition>,
    selector: &ItemSelector,
) -> Option<ResolvedItemModel> {
    let definition = store.get(&selector.version, strip_minecraft_namespace(&selector.name))?;

    let mut properties = selector.properties.clone();
    if let Some(ms) = properties.get(USE_DURATION_MS).and_then(ItemPropertyValue::as_number) {
        let ticks = (ms / TICK_MS).floor();
        properties.insert(USE_DURATION.to_string(), ItemPropertyValue::Number(ticks));
    }

    match resolve_item_model(&definition.model, &properties) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            log::warn!(
                "Error resolving model for {} in version {}: {}",
                selector.name,
                selector.version,
                e
            );
            None
        }
    }
}

/// Evaluate a model node using the thread-local random source.
pub fn resolve_item_model(node: &ItemModelNode, properties: &ItemProperties) -> Result<ResolvedItemModel> {
    resolve_item_model_with(node, properties, &mut rand::thread_rng())
}

/// Evaluate a model node. `rng` feeds `range_dispatch` nodes with
/// `source: "random"`.
pub fn resolve_item_model_with<R: Rng>(
    node: &ItemModelNode,
    properties: &ItemProperties,
    rng: &mut R,
) -> Result<ResolvedItemModel> {
    match node {
        ItemModelNode::Model { model, tints } => Ok(ResolvedItemModel {
            tints: tints.clone(),
            ..ResolvedItemModel::new(model.as_str())
        }),

        ItemModelNode::Empty => Ok(ResolvedItemModel::new("minecraft:builtin/empty")),

        ItemModelNode::Select {
            property,
            cases,
            fallback,
            pattern,
        } => {
            let value = properties.get(property.as_str());
            let current = match (value, pattern) {
                (Some(ItemPropertyValue::Date(date)), Some(pattern))
                    if DATE_PROPERTIES.contains(&property.as_str()) =>
                {
                    Some(ItemPropertyValue::Text(format_date_pattern(*date, pattern)))
                }
                _ => value.cloned(),
            };

            let selected = match &current {
                Some(current) => {
                    let text = current.to_string();
                    cases
                        .iter()
                        .find(|case| case.when.matches(&text))
                        .map(|case| &case.model)
                }
                None => None,
            };
            let selected = selected.or(fallback.as_deref()).ok_or_else(|| {
                let shown = current.as_ref().map_or_else(|| "undefined".to_string(), ToString::to_string);
                AssetsError::ItemModel(format!("No matching case for {}={}", property, shown))
            })?;

            Ok(resolve_item_model_with(selected, properties, rng)?.watching(WatchProperty::new(
                property.as_str(),
                WatchKind::Select,
                current,
            )))
        }

        ItemModelNode::RangeDispatch {
            property,
            entries,
            fallback,
            scale,
            source,
            target,
        } => {
            let fallback_node = || {
                fallback
                    .as_deref()
                    .ok_or_else(|| AssetsError::ItemModel(format!("No fallback for range {}", property)))
            };

            let value = match source.as_deref() {
                Some("daytime") => properties.get(TIME).and_then(ItemPropertyValue::as_number),
                Some("random") => Some(rng.gen::<f64>()),
                _ => properties.get(property.as_str()).and_then(ItemPropertyValue::as_number),
            };
            let Some(value) = value else {
                return resolve_item_model_with(fallback_node()?, properties, rng);
            };

            let scaled = scale.map_or(value, |scale| value * scale);
            let mut sorted: Vec<_> = entries.iter().collect();
            sorted.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
            let selected = match sorted.into_iter().find(|e| scaled >= e.threshold) {
                Some(entry) => &entry.model,
                None => fallback_node()?,
            };

            let mut watch = WatchProperty::new(property.as_str(), WatchKind::Range, Some(value.into()));
            watch.source = source.clone();
            watch.target = target.clone();
            Ok(resolve_item_model_with(selected, properties, rng)?.watching(watch))
        }

        ItemModelNode::Condition {
            property,
            on_true,
            on_false,
        } => {
            let value = properties.get(property.as_str());
            let selected = if value.is_some_and(ItemPropertyValue::is_truthy) {
                on_true
            } else {
                on_false
            };
            Ok(resolve_item_model_with(selected, properties, rng)?.watching(WatchProperty::new(
                property.as_str(),
                WatchKind::Condition,
                value.cloned(),
            )))
        }

        ItemModelNode::Composite { models } => {
            for model in models {
                match resolve_item_model_with(model, properties, rng) {
                    Ok(resolved) => return Ok(resolved),
                    Err(e) => log::debug!("Skipping composite member: {}", e),
                }
            }
            Err(AssetsError::ItemModel("No resolvable model found in composite".to_string()))
        }

        ItemModelNode::Special { model, .. } => Ok(ResolvedItemModel {
            special: Some(model.clone()),
            ..ResolvedItemModel::new("minecraft:special")
        }),

        ItemModelNode::Date {
            conditions,
            on_match,
            fallback,
        } => {
            let found = DATE_PROPERTIES
                .iter()
                .find_map(|p| properties.get(*p).and_then(|v| v.as_date().map(|d| (*p, d))));
            let Some((property, date)) = found else {
                return resolve_item_model_with(fallback, properties, rng);
            };
            let matched = conditions
                .iter()
                .any(|c| c.month == date.month() && c.days.contains(&date.day()));
            let selected = if matched { on_match } else { fallback };
            Ok(resolve_item_model_with(selected, properties, rng)?.watching(WatchProperty::new(
                property,
                WatchKind::Date,
                Some(date.into()),
            )))
        }

        ItemModelNode::Unsupported => Err(AssetsError::ItemModel(format!(
            "Unknown model type: {}",
            node.type_name()
        ))),
    }
}

/// An evaluated definition together with its renderable texture.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItemWithTexture {
    #[serde(flatten)]
    pub resolved: ResolvedItemModel,
    pub model_resolved: Option<ItemTexture>,
}

/// Evaluate a definition and look up the texture of the chosen model.
///
/// Builtin and special models cannot be drawn from textures; the item's own
/// name is looked up instead.
pub fn get_item_definition_model_resolved(
    store: &VersionedStore<ItemDefinition>,
    selector: &ItemSelector,
    renderer: &ItemsRenderer<'_>,
) -> Option<ResolvedItemWithTexture> {
    let resolved = get_item_definition(store, selector)?;
    let model = if resolved.is_builtin() {
        selector.name.as_str()
    } else {
        resolved.model.as_str()
    };
    let model_resolved = match renderer.get_item_texture(model, false) {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Cannot resolve texture of {}: {}", model, e);
            None
        }
    };
    Some(ResolvedItemWithTexture {
        resolved,
        model_resolved,
    })
}
