//! Shared types used throughout the library.

mod direction;
mod transform;

pub use direction::{Axis, Direction};
pub use transform::{BlockTransform, ElementRotation};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A block property value as found in world data.
///
/// Blockstate conditions compare values after string coercion, so
/// `true`, `"true"` and `1`/`"1"` are interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

/// A block queried for its models.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueriedBlock {
    /// Numeric block state id, used only as a cache key.
    pub state_id: u32,
    /// Block name, e.g., "stone" or "minecraft:stone".
    pub name: String,
    /// Block properties, e.g., {"facing": "north"}.
    pub properties: IndexMap<String, PropertyValue>,
}

impl QueriedBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_state_id(mut self, state_id: u32) -> Self {
        self.state_id = state_id;
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get the namespace (e.g., "minecraft").
    pub fn namespace(&self) -> &str {
        namespace_of(&self.name)
    }
}

/// Namespace of a resource location; bare names belong to "minecraft".
/// "mymod:block/x" -> "mymod", "a:b:c" -> "a:b".
pub fn namespace_of(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((namespace, _)) => namespace,
        None => "minecraft",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_coercion() {
        assert_eq!(PropertyValue::Bool(true).to_string(), "true");
        assert_eq!(PropertyValue::Int(15).to_string(), "15");
        assert_eq!(PropertyValue::from("north").to_string(), "north");
    }

    #[test]
    fn test_property_value_from_json() {
        let props: IndexMap<String, PropertyValue> =
            serde_json::from_str(r#"{"open": true, "power": 3, "facing": "east"}"#).unwrap();
        assert_eq!(props["open"], PropertyValue::Bool(true));
        assert_eq!(props["power"], PropertyValue::Int(3));
        assert_eq!(props["facing"], PropertyValue::from("east"));
    }

    #[test]
    fn test_namespace() {
        assert_eq!(namespace_of("stone"), "minecraft");
        assert_eq!(namespace_of("mymod:block/custom"), "mymod");
        assert_eq!(QueriedBlock::new("minecraft:stone").namespace(), "minecraft");
    }
}
