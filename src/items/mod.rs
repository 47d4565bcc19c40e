//! Item model resolution.
//!
//! Item definitions (`items/*.json`, 1.21.4+) are evaluated against a set of
//! item properties by [`get_item_definition`]. Older versions have no item
//! definitions; [`ItemsRenderer`] resolves their textures from item models
//! directly.

mod definitions;
mod renderer;

pub use definitions::{
    format_date_pattern, get_item_definition, get_item_definition_model_resolved, resolve_item_model,
    resolve_item_model_with, ResolvedItemWithTexture,
};
pub use renderer::{ItemTexture, ItemsRenderer, TextureKind, TextureSlice};

use crate::assets::Tint;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Property key holding the item use time in milliseconds. Converted to
/// `minecraft:use_duration` ticks before evaluation.
pub const USE_DURATION_MS: &str = "use_duration_ms";

/// A render-time item property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemPropertyValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl ItemPropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ItemPropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ItemPropertyValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Truthiness used by `minecraft:condition` nodes.
    pub fn is_truthy(&self) -> bool {
        match self {
            ItemPropertyValue::Bool(b) => *b,
            ItemPropertyValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ItemPropertyValue::Date(_) => true,
            ItemPropertyValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for ItemPropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemPropertyValue::Bool(b) => write!(f, "{}", b),
            ItemPropertyValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            ItemPropertyValue::Number(n) => write!(f, "{}", n),
            ItemPropertyValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ItemPropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ItemPropertyValue {
    fn from(value: bool) -> Self {
        ItemPropertyValue::Bool(value)
    }
}

impl From<f64> for ItemPropertyValue {
    fn from(value: f64) -> Self {
        ItemPropertyValue::Number(value)
    }
}

impl From<i64> for ItemPropertyValue {
    fn from(value: i64) -> Self {
        ItemPropertyValue::Number(value as f64)
    }
}

impl From<&str> for ItemPropertyValue {
    fn from(value: &str) -> Self {
        ItemPropertyValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for ItemPropertyValue {
    fn from(value: NaiveDate) -> Self {
        ItemPropertyValue::Date(value)
    }
}

/// Properties keyed by their full name, e.g. `minecraft:using_item`.
pub type ItemProperties = IndexMap<String, ItemPropertyValue>;

/// An item to resolve.
#[derive(Debug, Clone, Default)]
pub struct ItemSelector {
    pub version: String,
    pub name: String,
    pub properties: ItemProperties,
}

impl ItemSelector {
    pub fn new(version: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            properties: ItemProperties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<ItemPropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Which kind of node consulted a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchKind {
    Select,
    Range,
    Condition,
    Date,
}

/// A property the resolved model depends on. Renderers re-resolve when a
/// watched property changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProperty {
    pub property: String,
    #[serde(rename = "type")]
    pub kind: WatchKind,
    pub current_value: Option<ItemPropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl WatchProperty {
    pub fn new(property: impl Into<String>, kind: WatchKind, current_value: Option<ItemPropertyValue>) -> Self {
        Self {
            property: property.into(),
            kind,
            current_value,
            source: None,
            target: None,
        }
    }
}

/// Outcome of evaluating an item definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItemModel {
    /// Model name as written in the definition, e.g. `minecraft:item/bow`.
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tints: Option<Vec<Tint>>,
    /// Special renderer description for `minecraft:special` nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<Value>,
    /// Innermost node first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watch_properties: Vec<WatchProperty>,
}

impl ResolvedItemModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            tints: None,
            special: None,
            watch_properties: Vec::new(),
        }
    }

    pub(crate) fn watching(mut self, watch: WatchProperty) -> Self {
        self.watch_properties.push(watch);
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.model.starts_with("minecraft:builtin/") || self.model == "minecraft:special"
    }
}
