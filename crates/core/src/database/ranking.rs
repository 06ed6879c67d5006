//! Popularity rankings over tags, developers and publishers.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::entry::Entry;

use super::Database;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSort {
    /// Highest score first.
    #[default]
    Score,
    /// Alphabetical, ignoring case.
    Name,
}

/// Options for [`Database::tag_ranking`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRankingOptions {
    /// Score of each record's first tag; the last contributing tag scores 1.
    /// Values of 1 or less disable weighting.
    pub weight_factor: f32,
    /// Tags taken from each record, 0 for all.
    pub tags_per_game: usize,
    pub min_score: f32,
    /// Drop tags that are also known genre names.
    pub exclude_genres: bool,
    pub sort: RankingSort,
}

impl Default for TagRankingOptions {
    fn default() -> Self {
        Self {
            weight_factor: 1.0,
            tags_per_game: 0,
            min_score: 0.0,
            exclude_genres: false,
            sort: RankingSort::Score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredName {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: u32,
}

/// Score of the tag at `index` out of `taken`, interpolated linearly from
/// `weight` down to 1.
fn tag_weight(index: usize, taken: usize, weight: f32) -> f32 {
    if weight <= 1.0 {
        return 1.0;
    }
    if taken <= 1 {
        return weight;
    }
    let interp = index as f32 / (taken - 1) as f32;
    (1.0 - interp) * weight + interp
}

impl Database {
    /// Records in scope: everything when `scope` is `None`, otherwise the
    /// listed ids that exist, each once.
    fn scoped<'a>(&'a self, scope: Option<&'a [u32]>) -> Box<dyn Iterator<Item = &'a Entry> + 'a> {
        match scope {
            None => Box::new(self.entries()),
            Some(ids) => {
                let mut seen = HashSet::new();
                Box::new(
                    ids.iter()
                        .filter(move |id| seen.insert(**id))
                        .filter_map(|id| self.get(*id)),
                )
            }
        }
    }

    pub fn tag_ranking(&self, scope: Option<&[u32]>, options: &TagRankingOptions) -> Vec<ScoredName> {
        let mut scores: HashMap<&str, f32> = HashMap::new();

        for entry in self.scoped(scope) {
            let taken = match options.tags_per_game {
                0 => entry.tags.len(),
                n => n.min(entry.tags.len()),
            };
            for (i, tag) in entry.tags.iter().take(taken).enumerate() {
                *scores.entry(tag.as_str()).or_insert(0.0) += tag_weight(i, taken, options.weight_factor);
            }
        }

        let genres = options.exclude_genres.then(|| self.all_genres());

        let mut ranked: Vec<ScoredName> = scores
            .into_iter()
            .filter(|(_, score)| *score >= options.min_score)
            .filter(|(name, _)| genres.as_ref().is_none_or(|g| !g.contains(name)))
            .map(|(name, score)| ScoredName {
                name: name.to_string(),
                score,
            })
            .collect();

        match options.sort {
            RankingSort::Score => ranked.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }),
            RankingSort::Name => ranked.sort_by_key(|r| (r.name.to_lowercase(), r.name.clone())),
        }

        ranked
    }

    pub fn developer_counts(&self, scope: Option<&[u32]>, min_count: u32) -> Vec<NameCount> {
        self.count_names(scope, min_count, |e| &e.developers)
    }

    pub fn publisher_counts(&self, scope: Option<&[u32]>, min_count: u32) -> Vec<NameCount> {
        self.count_names(scope, min_count, |e| &e.publishers)
    }

    fn count_names<F>(&self, scope: Option<&[u32]>, min_count: u32, field: F) -> Vec<NameCount>
    where
        F: Fn(&Entry) -> &Vec<String>,
    {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for entry in self.scoped(scope) {
            for name in field(entry) {
                *counts.entry(name.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<NameCount> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(name, count)| NameCount {
                name: name.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        ranked
    }
}
