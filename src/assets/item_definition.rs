//! Item definition parsing (items/*.json, 1.21.4+).
//!
//! An item definition is a tree of model nodes. Interior nodes choose a
//! child based on item properties at render time; leaves name a model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub model: ItemModelNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_animation_on_swap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_hand_animation: Option<bool>,
}

/// One node of an item model tree, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemModelNode {
    #[serde(rename = "minecraft:model")]
    Model {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tints: Option<Vec<Tint>>,
    },

    #[serde(rename = "minecraft:empty")]
    Empty,

    #[serde(rename = "minecraft:select")]
    Select {
        property: String,
        cases: Vec<SelectCase>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Box<ItemModelNode>>,
        /// Date format for `minecraft:local_time`, e.g. "MM/dd".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },

    #[serde(rename = "minecraft:range_dispatch")]
    RangeDispatch {
        property: String,
        entries: Vec<RangeEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Box<ItemModelNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    #[serde(rename = "minecraft:condition")]
    Condition {
        property: String,
        on_true: Box<ItemModelNode>,
        on_false: Box<ItemModelNode>,
    },

    #[serde(rename = "minecraft:composite")]
    Composite { models: Vec<ItemModelNode> },

    /// Hardcoded renderers (shield, head, conduit, ...).
    #[serde(rename = "minecraft:special")]
    Special {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<String>,
        model: Value,
    },

    #[serde(rename = "minecraft:date")]
    Date {
        conditions: Vec<DateCondition>,
        on_match: Box<ItemModelNode>,
        fallback: Box<ItemModelNode>,
    },

    /// Any node type this crate does not evaluate.
    #[serde(other)]
    Unsupported,
}

impl ItemModelNode {
    /// The `type` tag as written in JSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemModelNode::Model { .. } => "minecraft:model",
            ItemModelNode::Empty => "minecraft:empty",
            ItemModelNode::Select { .. } => "minecraft:select",
            ItemModelNode::RangeDispatch { .. } => "minecraft:range_dispatch",
            ItemModelNode::Condition { .. } => "minecraft:condition",
            ItemModelNode::Composite { .. } => "minecraft:composite",
            ItemModelNode::Special { .. } => "minecraft:special",
            ItemModelNode::Date { .. } => "minecraft:date",
            ItemModelNode::Unsupported => "unsupported",
        }
    }
}

/// A tint source attached to a model leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectCase {
    pub when: SelectWhen,
    pub model: ItemModelNode,
}

/// A select case matches one value or any of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectWhen {
    Many(Vec<Value>),
    One(Value),
}

impl SelectWhen {
    /// Compare against a property value rendered as a string.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            SelectWhen::Many(values) => values.iter().any(|v| value_matches(v, value)),
            SelectWhen::One(v) => value_matches(v, value),
        }
    }
}

fn value_matches(expected: &Value, value: &str) -> bool {
    match expected {
        Value::String(s) => s == value,
        other => other.to_string() == value,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub threshold: f64,
    pub model: ItemModelNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCondition {
    pub month: u32,
    pub days: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bow() {
        let json = r#"{
            "model": {
                "type": "minecraft:condition",
                "property": "minecraft:using_item",
                "on_false": { "type": "minecraft:model", "model": "minecraft:item/bow" },
                "on_true": {
                    "type": "minecraft:range_dispatch",
                    "property": "minecraft:use_duration",
                    "scale": 0.05,
                    "entries": [
                        { "threshold": 0.65, "model": { "type": "minecraft:model", "model": "minecraft:item/bow_pulling_1" } },
                        { "threshold": 0.9, "model": { "type": "minecraft:model", "model": "minecraft:item/bow_pulling_2" } }
                    ],
                    "fallback": { "type": "minecraft:model", "model": "minecraft:item/bow_pulling_0" }
                }
            }
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        let ItemModelNode::Condition { on_true, .. } = &def.model else {
            panic!("expected condition node");
        };
        match on_true.as_ref() {
            ItemModelNode::RangeDispatch { entries, scale, .. } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(*scale, Some(0.05));
            }
            other => panic!("unexpected node {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_select_and_tints() {
        let json = r#"{
            "type": "minecraft:select",
            "property": "minecraft:trim_material",
            "cases": [
                { "when": "minecraft:gold", "model": { "type": "minecraft:model", "model": "minecraft:item/boots_gold" } },
                { "when": ["minecraft:iron", "minecraft:netherite"], "model": { "type": "minecraft:empty" } }
            ],
            "fallback": {
                "type": "minecraft:model",
                "model": "minecraft:item/boots",
                "tints": [{ "type": "minecraft:dye", "default": -6265536 }]
            }
        }"#;
        let node: ItemModelNode = serde_json::from_str(json).unwrap();
        let ItemModelNode::Select { cases, fallback, .. } = node else {
            panic!("expected select node");
        };
        assert!(cases[0].when.matches("minecraft:gold"));
        assert!(cases[1].when.matches("minecraft:netherite"));
        assert!(!cases[1].when.matches("minecraft:gold"));

        let Some(fallback) = fallback else {
            panic!("missing fallback");
        };
        let ItemModelNode::Model { tints, .. } = *fallback else {
            panic!("expected model leaf");
        };
        let tints = tints.unwrap();
        assert_eq!(tints[0].kind, "minecraft:dye");
        assert_eq!(tints[0].fields["default"], -6265536);
    }

    #[test]
    fn test_unknown_node_type() {
        let node: ItemModelNode =
            serde_json::from_str(r#"{ "type": "minecraft:bundle/selected_item" }"#).unwrap();
        assert_eq!(node, ItemModelNode::Unsupported);
    }

    #[test]
    fn test_special_keeps_inner_model() {
        let node: ItemModelNode = serde_json::from_str(
            r#"{ "type": "minecraft:special", "base": "minecraft:item/shield", "model": { "type": "minecraft:shield" } }"#,
        )
        .unwrap();
        let ItemModelNode::Special { base, model } = node else {
            panic!("expected special node");
        };
        assert_eq!(base.as_deref(), Some("minecraft:item/shield"));
        assert_eq!(model["type"], "minecraft:shield");
    }
}
