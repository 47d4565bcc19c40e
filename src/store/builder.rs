//! One-pass construction of delta-compressed versioned stores.

use super::{version_to_number, StoreData, VersionedStore, LATEST};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Collects `(version, key, value)` entries in any order and computes the
/// per-version deltas when [`build`](Self::build) is called.
///
/// Versions are processed newest to oldest. The newest occurrence of a key
/// goes to `latest` (or to its own bucket for strict stores); an older
/// version only gets an entry when its value differs from the value in
/// effect at the nearest newer version that provided the key.
#[derive(Debug, Clone)]
pub struct VersionedStoreBuilder<T> {
    strict: bool,
    inclusive: bool,
    entries: IndexMap<(String, String), T>,
}

impl<T> Default for VersionedStoreBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionedStoreBuilder<T> {
    pub fn new() -> Self {
        Self {
            strict: false,
            inclusive: true,
            entries: IndexMap::new(),
        }
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    /// Default inclusiveness of the built store's lookups.
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Record a value. Pushing the same version/key twice keeps the last value.
    pub fn push(
        &mut self,
        version: impl Into<String>,
        key: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.entries.insert((version.into(), key.into()), value);
        self
    }

    /// Record every entry of one version.
    pub fn extend_version<K, I>(&mut self, version: &str, entries: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        for (key, value) in entries {
            self.push(version, key, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: PartialEq> VersionedStoreBuilder<T> {
    /// Compute the delta buckets and produce the store.
    pub fn build(self) -> VersionedStore<T> {
        let strict = self.strict;
        let inclusive = self.inclusive;

        let mut entries: Vec<((String, String), T)> = self.entries.into_iter().collect();
        // Stable: keeps push order within a version.
        entries.sort_by_key(|((version, _), _)| std::cmp::Reverse(version_to_number(version)));

        let mut data: StoreData<T> = StoreData::new();
        if !strict {
            data.insert(LATEST.to_string(), IndexMap::new());
        }
        // Value in effect at the nearest newer version, per key: (bucket, key).
        let mut effective: HashMap<String, (String, String)> = HashMap::new();

        for ((version, key), value) in entries {
            let unchanged = effective
                .get(&key)
                .and_then(|(bucket, k)| data.get(bucket).and_then(|b| b.get(k)))
                .map_or(false, |current| *current == value);
            if unchanged {
                continue;
            }

            let bucket = if !strict && !effective.contains_key(&key) {
                LATEST.to_string()
            } else {
                version
            };
            data.entry(bucket.clone())
                .or_default()
                .insert(key.clone(), value);
            effective.insert(key.clone(), (bucket, key));
        }

        VersionedStore::from_data(data, strict).with_inclusive(inclusive)
    }
}
