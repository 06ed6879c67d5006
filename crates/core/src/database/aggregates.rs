//! Collection-wide aggregate sets and their lazily filled cache.

use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Case-insensitive sorted set of names. The first spelling seen is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    by_key: BTreeMap<String, String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if an equal name (ignoring case) was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.by_key.insert(key, name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_key.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Names in case-insensitive order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.by_key.values().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.by_key.values().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for NameSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = NameSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> Extend<&'a str> for NameSet {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl Serialize for NameSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Every language seen, per language-table column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSets {
    pub interface: NameSet,
    pub full_audio: NameSet,
    pub subtitles: NameSet,
}

/// Every VR capability seen, per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VrSets {
    pub headsets: NameSet,
    pub input: NameSet,
    pub play_area: NameSet,
}

/// Lazily computed aggregates.
///
/// A slot is filled once by a full recompute and only then published, so
/// concurrent readers see either nothing yet or a complete set. Mutations
/// of the collection go through `&mut` and reset every slot.
#[derive(Debug, Default)]
pub(crate) struct AggregateCache {
    pub(crate) genres: OnceCell<Arc<NameSet>>,
    pub(crate) tags: OnceCell<Arc<NameSet>>,
    pub(crate) flags: OnceCell<Arc<NameSet>>,
    pub(crate) developers: OnceCell<Arc<NameSet>>,
    pub(crate) publishers: OnceCell<Arc<NameSet>>,
    pub(crate) languages: OnceCell<Arc<LanguageSets>>,
    pub(crate) vr: OnceCell<Arc<VrSets>>,
}

impl AggregateCache {
    pub(crate) fn clear(&mut self) {
        *self = AggregateCache::default();
    }

    pub(crate) fn is_warm(&self) -> bool {
        self.genres.get().is_some()
            || self.tags.get().is_some()
            || self.flags.get().is_some()
            || self.developers.get().is_some()
            || self.publishers.get().is_some()
            || self.languages.get().is_some()
            || self.vr.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_set_case_insensitive() {
        let mut set = NameSet::new();
        assert!(set.insert("Action"));
        assert!(!set.insert("action"));
        assert!(set.insert("Indie"));
        assert!(set.contains("ACTION"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_vec(), vec!["Action", "Indie"]);
    }

    #[test]
    fn test_name_set_sorted_ignoring_case() {
        let set: NameSet = ["strategy", "Adventure", "RPG"].into_iter().collect();
        assert_eq!(set.to_vec(), vec!["Adventure", "RPG", "strategy"]);
    }

    #[test]
    fn test_name_set_serializes_as_list() {
        let set: NameSet = ["b", "A"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["A","b"]"#);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = AggregateCache::default();
        assert!(!cache.is_warm());
        let _ = cache.genres.set(Arc::new(NameSet::new()));
        assert!(cache.is_warm());
        cache.clear();
        assert!(!cache.is_warm());
    }
}
