//! Block state to model variant resolution.

use super::{Diagnostics, ResolveIssue};
use crate::assets::{strip_minecraft_namespace, ApplyModel, BlockStates, Condition};
use crate::store::VersionedStore;
use crate::types::QueriedBlock;

/// Selects which `apply` entries of a blockstate definition a block uses.
#[derive(Debug, Clone)]
pub struct StateResolver<'a> {
    blockstates: &'a VersionedStore<BlockStates>,
    version: String,
}

impl<'a> StateResolver<'a> {
    pub fn new(blockstates: &'a VersionedStore<BlockStates>, version: impl Into<String>) -> Self {
        Self {
            blockstates,
            version: version.into(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a BlockStates> {
        self.blockstates
            .get(&self.version, strip_minecraft_namespace(name))
    }

    /// Resolve a block to its contributing parts.
    ///
    /// A `variants` match contributes one part; every matching `multipart`
    /// case contributes one more. With `fallback_variant` set, a block that
    /// matches nothing uses the first declared variant (or the first
    /// conditional multipart case).
    pub fn select(
        &self,
        block: &QueriedBlock,
        fallback_variant: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Vec<&'a ApplyModel>> {
        let Some(states) = self.get(&block.name) else {
            diagnostics.issue(ResolveIssue::UnknownBlock(block.name.clone()));
            return None;
        };

        let mut parts = Vec::new();
        let mut state_matched = false;

        if let Some(variants) = &states.variants {
            let mut chosen = None;
            let mut default = None;
            for (key, apply) in variants {
                match Condition::from_variant_key(key) {
                    None => {
                        if default.is_none() {
                            default = Some((key, apply));
                        }
                    }
                    Some(condition) => {
                        if condition.matches(&block.properties) {
                            chosen = Some((key, apply));
                            break;
                        }
                    }
                }
            }

            match chosen.or(default) {
                Some((key, apply)) => {
                    diagnostics.matched_conditions.push(format!("variant:{}", key));
                    parts.push(apply);
                    state_matched = true;
                }
                None if fallback_variant => {
                    if let Some((key, apply)) = variants.first() {
                        diagnostics.matched_conditions.push(format!("fallback:{}", key));
                        parts.push(apply);
                        state_matched = true;
                    }
                }
                None => {
                    diagnostics.issue(ResolveIssue::NoMatchingState {
                        block: block.name.clone(),
                        possible: variants.len(),
                    });
                    return None;
                }
            }
        }

        if let Some(multipart) = &states.multipart {
            for case in multipart {
                match &case.when {
                    None => {
                        diagnostics.matched_conditions.push("multipart:always".to_string());
                        parts.push(&case.apply);
                    }
                    Some(when) if when.matches(&block.properties) => {
                        let when = serde_json::to_string(when).unwrap_or_default();
                        diagnostics.matched_conditions.push(format!("multipart:{}", when));
                        parts.push(&case.apply);
                    }
                    Some(_) => {}
                }
            }
            if parts.is_empty() && fallback_variant {
                if let Some(case) = multipart.iter().find(|case| case.when.is_some()) {
                    diagnostics.matched_conditions.push("multipart:fallback".to_string());
                    parts.push(&case.apply);
                }
            }
        }

        if parts.is_empty() {
            if !state_matched {
                let possible = states.variants.as_ref().map_or(0, |v| v.len());
                diagnostics.issue(ResolveIssue::NoMatchingState {
                    block: block.name.clone(),
                    possible,
                });
            }
            return None;
        }

        log::debug!(
            "{} matched {}",
            block.name,
            diagnostics.matched_conditions.join(", ")
        );
        Some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VersionedStoreBuilder;

    fn create_test_store() -> VersionedStore<BlockStates> {
        let states = |json: &str| -> BlockStates { serde_json::from_str(json).unwrap() };
        let mut builder = VersionedStoreBuilder::new().inclusive(false);
        builder
            .push(
                "latest",
                "stone",
                states(r#"{ "variants": { "": { "model": "block/stone" } } }"#),
            )
            .push(
                "latest",
                "furnace",
                states(
                    r#"{ "variants": {
                        "facing=north,lit=false": { "model": "block/furnace" },
                        "facing=east,lit=false": { "model": "block/furnace", "y": 90 },
                        "facing=north,lit=true": { "model": "block/furnace_on" }
                    } }"#,
                ),
            )
            .push(
                "latest",
                "oak_fence",
                states(
                    r#"{ "multipart": [
                        { "apply": { "model": "block/oak_fence_post" } },
                        { "when": { "north": "true" }, "apply": { "model": "block/oak_fence_side", "uvlock": true } },
                        { "when": { "east": "true" }, "apply": { "model": "block/oak_fence_side", "y": 90, "uvlock": true } }
                    ] }"#,
                ),
            )
            .push(
                "latest",
                "redstone_wire",
                states(
                    r#"{ "multipart": [
                        { "when": { "OR": [{ "north": "side|up" }, { "south": "side|up" }] }, "apply": { "model": "block/redstone_dust_side0" } }
                    ] }"#,
                ),
            );
        builder.build()
    }

    fn models(parts: &[&ApplyModel]) -> Vec<String> {
        parts.iter().map(|p| p.variants()[0].model.clone()).collect()
    }

    #[test]
    fn test_default_variant() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let parts = resolver
            .select(&QueriedBlock::new("minecraft:stone"), false, &mut diagnostics)
            .unwrap();
        assert_eq!(models(&parts), vec!["block/stone"]);
        assert_eq!(diagnostics.matched_conditions, vec!["variant:"]);
    }

    #[test]
    fn test_first_matching_variant_wins() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let block = QueriedBlock::new("furnace")
            .with_property("facing", "east")
            .with_property("lit", false);
        let parts = resolver.select(&block, false, &mut diagnostics).unwrap();
        assert_eq!(parts[0].variants()[0].y, Some(90));
        assert_eq!(diagnostics.matched_conditions, vec!["variant:facing=east,lit=false"]);
    }

    #[test]
    fn test_no_match_without_fallback() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let block = QueriedBlock::new("furnace").with_property("facing", "up");
        assert!(resolver.select(&block, false, &mut diagnostics).is_none());
        assert_eq!(
            diagnostics.issues,
            vec![ResolveIssue::NoMatchingState {
                block: "furnace".into(),
                possible: 3
            }]
        );

        let parts = resolver.select(&block, true, &mut diagnostics).unwrap();
        assert_eq!(models(&parts), vec!["block/furnace"]);
        assert_eq!(diagnostics.matched_conditions, vec!["fallback:facing=north,lit=false"]);
    }

    #[test]
    fn test_multipart_is_additive() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let block = QueriedBlock::new("oak_fence")
            .with_property("north", "true")
            .with_property("east", "true");
        let parts = resolver.select(&block, false, &mut diagnostics).unwrap();
        assert_eq!(
            models(&parts),
            vec!["block/oak_fence_post", "block/oak_fence_side", "block/oak_fence_side"]
        );
        assert_eq!(diagnostics.matched_conditions[0], "multipart:always");
        assert_eq!(diagnostics.matched_conditions[1], r#"multipart:{"north":"true"}"#);
    }

    #[test]
    fn test_multipart_fallback() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let block = QueriedBlock::new("redstone_wire").with_property("north", "none");
        assert!(resolver.select(&block, false, &mut diagnostics).is_none());

        let block = QueriedBlock::new("redstone_wire").with_property("south", "up");
        assert!(resolver.select(&block, false, &mut diagnostics).is_some());

        let block = QueriedBlock::new("redstone_wire");
        let parts = resolver.select(&block, true, &mut diagnostics).unwrap();
        assert_eq!(models(&parts), vec!["block/redstone_dust_side0"]);
        assert_eq!(diagnostics.matched_conditions.last().unwrap(), "multipart:fallback");
    }

    #[test]
    fn test_typed_properties_match_string_conditions() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        let block = QueriedBlock::new("furnace")
            .with_property("facing", "north")
            .with_property("lit", true);
        let parts = resolver.select(&block, false, &mut diagnostics).unwrap();
        assert_eq!(models(&parts), vec!["block/furnace_on"]);

        let block = QueriedBlock::new("oak_fence").with_property("north", true);
        let parts = resolver.select(&block, false, &mut diagnostics).unwrap();
        assert_eq!(models(&parts), vec!["block/oak_fence_post", "block/oak_fence_side"]);
    }

    #[test]
    fn test_unknown_block() {
        let store = create_test_store();
        let resolver = StateResolver::new(&store, "1.20.4");
        let mut diagnostics = Diagnostics::default();

        assert!(resolver.select(&QueriedBlock::new("mymod:thing"), true, &mut diagnostics).is_none());
        assert!(diagnostics.issues[0]
            .to_string()
            .contains("assets/mymod/blockstates/mymod:thing.json"));
    }
}
