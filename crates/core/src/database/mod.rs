//! The collection of app records.
//!
//! [`Database`] is plain caller-owned state; share it between tasks as a
//! [`SharedDatabase`]. Every mutation goes through `&mut self`, which both
//! serializes writers and resets the aggregate cache.

mod aggregates;
mod legacy;
mod lineage;
mod persist;
mod ranking;

pub use aggregates::{LanguageSets, NameSet, VrSets};
pub use lineage::Lineage;
pub use persist::{PersistError, FORMAT_VERSION};
pub use ranking::{NameCount, RankingSort, ScoredName, TagRankingOptions};

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::entry::{AppType, Entry, Freshness, VrSupport};
use crate::merge::merge_into;
use crate::metrics;
use crate::sources::{AppListItem, CatalogRecord, PlaytimeRecord};

use aggregates::AggregateCache;

/// Parent hops walked by fallback lookups unless told otherwise.
pub const DEFAULT_FALLBACK_DEPTH: u32 = 3;

pub const DEFAULT_LANGUAGE: &str = "english";

/// Collection handle shared between the scrape workers and readers.
pub type SharedDatabase = Arc<RwLock<Database>>;

/// What [`Database::merge_entry`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    Inserted,
    Merged,
    /// Id 0 is never stored.
    Rejected,
}

impl MergeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeOutcome::Inserted => "inserted",
            MergeOutcome::Merged => "merged",
            MergeOutcome::Rejected => "rejected",
        }
    }
}

#[derive(Debug)]
pub struct Database {
    entries: HashMap<u32, Entry>,
    language: String,
    last_playtime_update: i64,
    aggregates: AggregateCache,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Database {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            language: language.into(),
            last_playtime_update: 0,
            aggregates: AggregateCache::default(),
        }
    }

    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(RwLock::new(self))
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn get(&self, id: u32) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Records in ascending id order.
    fn entries_by_id(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_unstable_by_key(|e| e.id);
        entries
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn last_playtime_update(&self) -> i64 {
        self.last_playtime_update
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.get(id).and_then(|e| e.name.as_deref())
    }

    pub fn release_year(&self, id: u32) -> Option<i32> {
        self.get(id).and_then(Entry::release_year)
    }

    /// Whether `id` is known and classified as a game or application.
    pub fn include_in_game_list(&self, id: u32) -> bool {
        self.get(id).is_some_and(Entry::is_game_or_application)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert or replace a record as-is.
    pub fn upsert(&mut self, entry: Entry) -> bool {
        if entry.id == 0 {
            warn!("Refusing to store a record with id 0");
            return false;
        }
        self.entries.insert(entry.id, entry);
        self.invalidate_aggregates();
        true
    }

    /// Fold `incoming` into the stored record, inserting it if new.
    pub fn merge_entry(&mut self, incoming: Entry) -> MergeOutcome {
        if incoming.id == 0 {
            warn!("Refusing to merge a record with id 0");
            return MergeOutcome::Rejected;
        }

        let outcome = match self.entries.get_mut(&incoming.id) {
            Some(existing) => {
                merge_into(existing, &incoming);
                MergeOutcome::Merged
            }
            None => {
                self.entries.insert(incoming.id, incoming);
                MergeOutcome::Inserted
            }
        };

        metrics::MERGES.with_label_values(&[outcome.as_str()]).inc();
        self.invalidate_aggregates();
        outcome
    }

    /// Point `id` at `parent_id` unless it already has a parent.
    pub fn link_parent(&mut self, id: u32, parent_id: u32) -> bool {
        if id == parent_id || parent_id == 0 {
            return false;
        }
        match self.entries.get_mut(&id) {
            Some(entry) if entry.parent_id.is_none() => {
                entry.parent_id = Some(parent_id);
                self.invalidate_aggregates();
                true
            }
            _ => false,
        }
    }

    /// Drop every cached aggregate; they are rebuilt on next access.
    pub fn invalidate_aggregates(&mut self) {
        self.aggregates.clear();
    }

    /// Switch the source language.
    ///
    /// Language-dependent fields of every record are cleared and their page
    /// freshness pushed back so the next scrape wins. Returns the ids that
    /// need a re-scrape, or nothing if the language is unchanged.
    pub fn change_language(&mut self, language: &str) -> Vec<u32> {
        if self.language.eq_ignore_ascii_case(language) {
            return Vec::new();
        }

        info!(
            from = %self.language,
            to = language,
            entries = self.entries.len(),
            "Changing collection language"
        );

        for entry in self.entries.values_mut() {
            entry.tags.clear();
            entry.flags.clear();
            entry.genres.clear();
            entry.release_date = None;
            entry.vr_support = VrSupport::default();
            entry.language_support = Default::default();
            entry.freshness.page_scrape = entry.freshness.page_scrape.min(1);
        }

        self.language = language.to_string();
        self.invalidate_aggregates();
        self.ids()
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    /// Seed ids and names from the bulk listing. Returns the number of new ids.
    ///
    /// A known id whose stored name differs is treated as repurposed and its
    /// classification goes back to unknown.
    pub fn integrate_app_list(&mut self, items: &[AppListItem]) -> usize {
        let mut added = 0;
        for item in items.iter().filter(|i| i.appid > 0) {
            let name = item.name.trim();
            match self.entries.get_mut(&item.appid) {
                Some(entry) => {
                    if name.is_empty() || entry.name.as_deref() == Some(name) {
                        continue;
                    }
                    if entry.name.as_deref().is_some_and(|old| !old.is_empty()) {
                        entry.app_type = AppType::Unknown;
                    }
                    entry.name = Some(name.to_string());
                }
                None => {
                    let mut entry = Entry::new(item.appid);
                    if !name.is_empty() {
                        entry.name = Some(name.to_string());
                    }
                    self.entries.insert(item.appid, entry);
                    added += 1;
                }
            }
        }

        metrics::FEED_RECORDS
            .with_label_values(&["app_list"])
            .inc_by(items.len() as u64);
        info!(listed = items.len(), added, "Integrated app list");
        self.invalidate_aggregates();
        added
    }

    /// Merge offline catalog records stamped with `timestamp`.
    pub fn integrate_catalog(&mut self, records: &[CatalogRecord], timestamp: i64) -> usize {
        let mut merged = 0;
        for record in records {
            let entry = Entry {
                id: record.id,
                app_type: record.app_type,
                name: record.name.clone().filter(|n| !n.is_empty()),
                platforms: record.platforms,
                parent_id: record.parent_id.filter(|p| *p > 0),
                freshness: Freshness::catalog(timestamp),
                ..Entry::default()
            };
            if self.merge_entry(entry) != MergeOutcome::Rejected {
                merged += 1;
            }
        }

        metrics::FEED_RECORDS
            .with_label_values(&["catalog"])
            .inc_by(merged as u64);
        info!(records = records.len(), merged, "Integrated catalog feed");
        merged
    }

    /// Apply time-to-finish figures to known ids.
    ///
    /// Figures the feed marks as imputed are zeroed unless `include_imputed`.
    pub fn apply_playtimes(
        &mut self,
        records: &[PlaytimeRecord],
        include_imputed: bool,
        now: i64,
    ) -> usize {
        let mut updated = 0;
        for record in records {
            let Some(entry) = self.entries.get_mut(&record.app_id) else {
                continue;
            };
            let keep = |value: u32, imputed: bool| {
                if imputed && !include_imputed {
                    0
                } else {
                    value
                }
            };
            entry.playtime.main = keep(record.main, record.main_imputed);
            entry.playtime.extras = keep(record.extras, record.extras_imputed);
            entry.playtime.completionist = keep(record.completionist, record.completionist_imputed);
            updated += 1;
        }

        self.last_playtime_update = now;
        metrics::FEED_RECORDS
            .with_label_values(&["playtime"])
            .inc_by(updated as u64);
        debug!(records = records.len(), updated, "Applied playtime feed");
        updated
    }

    // =========================================================================
    // Fallback lookups
    // =========================================================================

    /// The entry for `id` followed by up to `depth` ancestors.
    pub fn lineage(&self, id: u32, depth: u32) -> Lineage<'_> {
        Lineage::new(self, id, depth)
    }

    /// First non-empty list in the lineage, or the entry's own empty list.
    /// `None` when `id` is unknown.
    fn inherited<F>(&self, id: u32, depth: u32, field: F) -> Option<Vec<String>>
    where
        F: Fn(&Entry) -> &Vec<String>,
    {
        let own = field(self.get(id)?);
        let found = self
            .lineage(id, depth)
            .map(&field)
            .find(|list| !list.is_empty())
            .unwrap_or(own);
        Some(found.clone())
    }

    /// Genres, falling back to the entry's own tags that are also known
    /// genre names when `tag_fallback` is set, then to ancestors.
    pub fn genres_for(&self, id: u32, depth: u32, tag_fallback: bool) -> Option<Vec<String>> {
        self.get(id)?;
        let all_genres = if tag_fallback {
            Some(self.all_genres())
        } else {
            None
        };

        for entry in self.lineage(id, depth) {
            if !entry.genres.is_empty() {
                return Some(entry.genres.clone());
            }
            if let Some(known) = &all_genres {
                let promoted: Vec<String> = entry
                    .tags
                    .iter()
                    .filter(|tag| known.contains(tag))
                    .cloned()
                    .collect();
                if !promoted.is_empty() {
                    return Some(promoted);
                }
            }
        }

        Some(Vec::new())
    }

    pub fn tags_for(&self, id: u32, depth: u32) -> Option<Vec<String>> {
        self.inherited(id, depth, |e| &e.tags)
    }

    pub fn flags_for(&self, id: u32, depth: u32) -> Option<Vec<String>> {
        self.inherited(id, depth, |e| &e.flags)
    }

    pub fn developers_for(&self, id: u32, depth: u32) -> Option<Vec<String>> {
        self.inherited(id, depth, |e| &e.developers)
    }

    pub fn publishers_for(&self, id: u32, depth: u32) -> Option<Vec<String>> {
        self.inherited(id, depth, |e| &e.publishers)
    }

    pub fn vr_support_for(&self, id: u32, depth: u32) -> Option<VrSupport> {
        let own = &self.get(id)?.vr_support;
        let found = self
            .lineage(id, depth)
            .map(|e| &e.vr_support)
            .find(|vr| !vr.is_empty())
            .unwrap_or(own);
        Some(found.clone())
    }

    pub fn supports_vr(&self, id: u32, depth: u32) -> bool {
        self.lineage(id, depth).any(Entry::supports_vr_directly)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Distinct names of one list field. Among spellings differing only in
    /// case, the one on the lowest id wins.
    fn collect_names<F>(&self, field: F) -> NameSet
    where
        F: Fn(&Entry) -> &Vec<String>,
    {
        let mut set = NameSet::new();
        for entry in self.entries_by_id() {
            set.extend(field(entry).iter().map(String::as_str));
        }
        set
    }

    pub fn all_genres(&self) -> Arc<NameSet> {
        self.aggregates
            .genres
            .get_or_init(|| Arc::new(self.collect_names(|e| &e.genres)))
            .clone()
    }

    pub fn all_tags(&self) -> Arc<NameSet> {
        self.aggregates
            .tags
            .get_or_init(|| Arc::new(self.collect_names(|e| &e.tags)))
            .clone()
    }

    pub fn all_flags(&self) -> Arc<NameSet> {
        self.aggregates
            .flags
            .get_or_init(|| Arc::new(self.collect_names(|e| &e.flags)))
            .clone()
    }

    pub fn all_developers(&self) -> Arc<NameSet> {
        self.aggregates
            .developers
            .get_or_init(|| Arc::new(self.collect_names(|e| &e.developers)))
            .clone()
    }

    pub fn all_publishers(&self) -> Arc<NameSet> {
        self.aggregates
            .publishers
            .get_or_init(|| Arc::new(self.collect_names(|e| &e.publishers)))
            .clone()
    }

    pub fn all_languages(&self) -> Arc<LanguageSets> {
        self.aggregates
            .languages
            .get_or_init(|| {
                let mut sets = LanguageSets::default();
                for entry in self.entries_by_id() {
                    let support = &entry.language_support;
                    sets.interface.extend(support.interface.iter().map(String::as_str));
                    sets.full_audio.extend(support.full_audio.iter().map(String::as_str));
                    sets.subtitles.extend(support.subtitles.iter().map(String::as_str));
                }
                Arc::new(sets)
            })
            .clone()
    }

    pub fn all_vr_flags(&self) -> Arc<VrSets> {
        self.aggregates
            .vr
            .get_or_init(|| {
                let mut sets = VrSets::default();
                for entry in self.entries_by_id() {
                    let vr = &entry.vr_support;
                    sets.headsets.extend(vr.headsets.iter().map(String::as_str));
                    sets.input.extend(vr.input.iter().map(String::as_str));
                    sets.play_area.extend(vr.play_area.iter().map(String::as_str));
                }
                Arc::new(sets)
            })
            .clone()
    }
}
