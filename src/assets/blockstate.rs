//! Blockstate definition parsing.
//!
//! Blockstates define how block properties map to models. There are two
//! sections, "variants" (exactly one entry is selected) and "multipart"
//! (every matching entry contributes). Both may be present.

use crate::types::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A blockstate definition from blockstates/*.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockStates {
    /// Condition string (e.g. "facing=north,open=true") to model. The empty
    /// string or "normal" is the unconditional default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<IndexMap<String, ApplyModel>>,
    /// Ordered conditional parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart: Option<Vec<MultipartCase>>,
}

impl BlockStates {
    /// Iterate every model variant referenced by this definition.
    pub fn all_variants(&self) -> impl Iterator<Item = &ModelVariant> {
        let variants = self
            .variants
            .iter()
            .flat_map(|v| v.values())
            .flat_map(|apply| apply.variants());
        let parts = self
            .multipart
            .iter()
            .flatten()
            .flat_map(|case| case.apply.variants());
        variants.chain(parts)
    }

    pub(crate) fn all_variants_mut(&mut self) -> Vec<&mut ModelVariant> {
        let mut out = Vec::new();
        if let Some(variants) = &mut self.variants {
            for apply in variants.values_mut() {
                out.extend(apply.variants_mut());
            }
        }
        if let Some(parts) = &mut self.multipart {
            for case in parts {
                out.extend(case.apply.variants_mut());
            }
        }
        out
    }
}

/// A single model reference or a weighted list of alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplyModel {
    Single(ModelVariant),
    Weighted(Vec<ModelVariant>),
}

impl ApplyModel {
    pub fn variants(&self) -> &[ModelVariant] {
        match self {
            ApplyModel::Single(v) => std::slice::from_ref(v),
            ApplyModel::Weighted(v) => v,
        }
    }

    fn variants_mut(&mut self) -> Vec<&mut ModelVariant> {
        match self {
            ApplyModel::Single(v) => vec![v],
            ApplyModel::Weighted(v) => v.iter_mut().collect(),
        }
    }
}

/// A model variant reference with optional rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    /// Model resource location (e.g., "block/stone").
    pub model: String,
    /// X rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Y rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    /// If true, UV coordinates don't rotate with the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvlock: Option<bool>,
    /// Weight for random selection (default 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl ModelVariant {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            x: None,
            y: None,
            z: None,
            uvlock: None,
            weight: None,
        }
    }

    pub fn transform(&self) -> crate::types::BlockTransform {
        crate::types::BlockTransform {
            x: self.x,
            y: self.y,
            z: self.z,
            uvlock: self.uvlock,
        }
    }

    pub fn weight_or_default(&self) -> u32 {
        self.weight.unwrap_or(1)
    }
}

/// A multipart case with optional condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipartCase {
    /// Condition for when this case applies; absent means always.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    /// Model(s) to apply when the condition is met.
    pub apply: ApplyModel,
}

/// A blockstate condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Any of the sub-conditions must match.
    Or {
        #[serde(rename = "OR")]
        or: Vec<Condition>,
    },
    /// All of the sub-conditions must match.
    And {
        #[serde(rename = "AND")]
        and: Vec<Condition>,
    },
    /// Every listed property must match. Values may be `|`-separated
    /// alternatives.
    Properties(IndexMap<String, PropertyValue>),
}

impl Condition {
    /// Parse a variant key such as "facing=north,half=bottom".
    ///
    /// Returns None for default keys ("" or "normal") that carry no
    /// property constraints.
    pub fn from_variant_key(key: &str) -> Option<Condition> {
        let mut properties = IndexMap::new();
        for pair in key.split(',') {
            if let Some((prop, value)) = pair.split_once('=') {
                properties.insert(prop.to_string(), PropertyValue::from(value));
            }
        }
        if properties.is_empty() {
            None
        } else {
            Some(Condition::Properties(properties))
        }
    }

    /// Check if the condition matches the given block properties.
    ///
    /// A property the block does not have never matches.
    pub fn matches(&self, properties: &IndexMap<String, PropertyValue>) -> bool {
        match self {
            Condition::Or { or } => or.iter().any(|cond| cond.matches(properties)),
            Condition::And { and } => and.iter().all(|cond| cond.matches(properties)),
            Condition::Properties(expected) => expected.iter().all(|(key, expected)| {
                let Some(actual) = properties.get(key) else {
                    return false;
                };
                // World data may carry typed values (`true`, `15`); blockstate
                // JSON spells them as strings. Compare the string forms.
                let actual = actual.to_string();
                expected.to_string().split('|').any(|allowed| allowed == actual)
            }),
        }
    }
}
