//! Version-aware key/value storage with delta compression.
//!
//! A [`VersionedStore`] keeps one bucket per game version plus a `latest`
//! bucket. Only values that changed relative to the next newer version are
//! stored in a version bucket; everything else is served from `latest`.
//!
//! Stores are produced once by a [`VersionedStoreBuilder`] (or hydrated from
//! a serialized build artifact) and are read-only afterwards.

mod builder;

pub use builder::VersionedStoreBuilder;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Name of the implicit newest bucket.
pub const LATEST: &str = "latest";

/// Serialized layout: `version -> key -> value`.
pub type StoreData<T> = IndexMap<String, IndexMap<String, T>>;

/// Encode a version string as a comparable number.
///
/// `major * 10000 + minor * 100 + patch`. Missing components count as zero and
/// pre-release suffixes are ignored, so `"1.18"` equals `"1.18.0"` and
/// `"1.21-pre1"` sorts as `"1.21"`. `"latest"` is newer than every version.
pub fn version_to_number(version: &str) -> u32 {
    if version == LATEST {
        return u32::MAX;
    }
    let release = version
        .split(|c: char| c == '-' || c == ' ')
        .next()
        .unwrap_or_default();
    let mut parts = release.split('.').map(leading_number);
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    let number = major
        .saturating_mul(10_000)
        .saturating_add(minor.saturating_mul(100))
        .saturating_add(patch);
    // oversized versions still sort below latest
    u32::try_from(number).unwrap_or(u32::MAX).min(u32::MAX - 1)
}

fn leading_number(part: &str) -> u64 {
    part.chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u64, |acc, digit| acc.saturating_mul(10).saturating_add(u64::from(digit)))
}

/// Versioned key/value store with "nearest version at or above" lookups.
#[derive(Debug, Clone)]
pub struct VersionedStore<T> {
    data: StoreData<T>,
    /// Bucket names ordered oldest to newest, `latest` last.
    sorted: Vec<(u32, String)>,
    strict: bool,
    inclusive: bool,
}

impl<T> Default for VersionedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionedStore<T> {
    /// Create an empty store with a `latest` fallback and inclusive lookups.
    pub fn new() -> Self {
        Self {
            data: StoreData::new(),
            sorted: Vec::new(),
            strict: false,
            inclusive: true,
        }
    }

    /// Create an empty strict store: no `latest` fallback, only explicitly
    /// stored versions can be found.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    /// Hydrate a store from serialized bucket data.
    pub fn from_data(data: StoreData<T>, strict: bool) -> Self {
        let mut store = Self {
            strict,
            ..Self::new()
        };
        store.load_data(data);
        store
    }

    /// Set the default inclusiveness used by [`get`](Self::get).
    pub fn with_inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Replace the internal storage wholesale.
    pub fn load_data(&mut self, data: StoreData<T>) {
        let mut sorted: Vec<(u32, String)> = data
            .keys()
            .map(|version| (version_to_number(version), version.clone()))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.sorted = sorted;
        self.data = data;
    }

    pub fn data(&self) -> &StoreData<T> {
        &self.data
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    /// Bucket names ordered oldest to newest.
    pub fn versions_sorted(&self) -> Vec<&str> {
        self.sorted.iter().map(|(_, v)| v.as_str()).collect()
    }

    /// The `latest` bucket, if present.
    pub fn latest(&self) -> Option<&IndexMap<String, T>> {
        self.data.get(LATEST)
    }

    /// Look up `key` as of `version` using the store's default inclusiveness.
    pub fn get(&self, version: &str, key: &str) -> Option<&T> {
        self.get_with(version, key, self.inclusive)
    }

    /// Look up `key` as of `version`.
    ///
    /// Walks buckets from oldest to newest and returns the first bucket at or
    /// above `version` (strictly above when `inclusive` is false) holding the
    /// key. Non-strict stores fall back to `latest`.
    pub fn get_with(&self, version: &str, key: &str, inclusive: bool) -> Option<&T> {
        let wanted = version_to_number(version);
        let hit = self
            .sorted
            .iter()
            .filter(|(number, _)| {
                if inclusive {
                    wanted <= *number
                } else {
                    wanted < *number
                }
            })
            .find_map(|(_, bucket)| self.data.get(bucket).and_then(|b| b.get(key)));

        match hit {
            Some(value) => Some(value),
            None if self.strict => None,
            None => self.latest().and_then(|b| b.get(key)),
        }
    }

    /// Check whether any bucket mentions `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.values().any(|bucket| bucket.contains_key(key))
    }
}

impl<T: Clone> VersionedStore<T> {
    /// Like [`get`](Self::get) but returns an owned copy the caller may mutate
    /// without touching the store.
    pub fn get_owned(&self, version: &str, key: &str) -> Option<T> {
        self.get(version, key).cloned()
    }
}

impl<T: Serialize> Serialize for VersionedStore<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}
