//! Folding an incoming partial record into an existing one.
//!
//! Catalog-sourced fields (name, classification, parent) and page-sourced
//! fields (everything else) age independently, each gated by its own
//! freshness marker. List fields are replaced wholesale, never unioned, and
//! an empty incoming list never overwrites existing data.

use crate::entry::{AppType, Entry};

/// Which field groups of an incoming record win, computed once per merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePlan {
    pub use_catalog_fields: bool,
    pub use_scrape_fields: bool,
    pub replace_platforms: bool,
}

impl MergePlan {
    pub fn between(target: &Entry, incoming: &Entry) -> Self {
        let t = target.freshness;
        let i = incoming.freshness;

        let use_scrape_fields = i.page_scrape >= t.page_scrape;
        let use_catalog_fields = i.catalog_update > t.catalog_update
            || (t.catalog_update == 0 && i.page_scrape >= t.page_scrape);
        let replace_platforms = use_scrape_fields
            || (t.page_scrape == 0 && i.catalog_update > t.catalog_update)
            || target.platforms.is_empty();

        Self {
            use_catalog_fields,
            use_scrape_fields,
            replace_platforms,
        }
    }
}

/// Merge `incoming` into `target` in place.
pub fn merge_into(target: &mut Entry, incoming: &Entry) {
    let plan = MergePlan::between(target, incoming);

    if incoming.app_type != AppType::Unknown
        && (target.app_type == AppType::Unknown || plan.use_catalog_fields)
    {
        target.app_type = incoming.app_type;
    }

    if plan.replace_platforms {
        target.platforms = incoming.platforms;
    }

    if plan.use_catalog_fields {
        if let Some(name) = incoming.name.as_ref().filter(|n| !n.is_empty()) {
            target.name = Some(name.clone());
        }
        if let Some(parent) = incoming.parent_id.filter(|p| *p > 0) {
            target.parent_id = Some(parent);
        }
    }

    if plan.use_scrape_fields {
        replace_if_present(&mut target.genres, &incoming.genres);
        replace_if_present(&mut target.flags, &incoming.flags);
        replace_if_present(&mut target.tags, &incoming.tags);
        replace_if_present(&mut target.developers, &incoming.developers);
        replace_if_present(&mut target.publishers, &incoming.publishers);

        if let Some(date) = incoming.release_date.as_ref().filter(|d| !d.is_empty()) {
            target.release_date = Some(date.clone());
        }

        if incoming.total_achievements != 0 {
            target.total_achievements = incoming.total_achievements;
        }

        let vr = &incoming.vr_support;
        replace_if_present(&mut target.vr_support.headsets, &vr.headsets);
        replace_if_present(&mut target.vr_support.input, &vr.input);
        replace_if_present(&mut target.vr_support.play_area, &vr.play_area);

        let languages = &incoming.language_support;
        replace_if_present(&mut target.language_support.interface, &languages.interface);
        replace_if_present(&mut target.language_support.full_audio, &languages.full_audio);
        replace_if_present(&mut target.language_support.subtitles, &languages.subtitles);

        // Total and percentage move together.
        if incoming.review_total != 0 {
            target.review_total = incoming.review_total;
            target.review_positive_percentage = incoming.review_positive_percentage;
        }

        if let Some(slug) = incoming.metacritic_slug.as_ref().filter(|s| !s.is_empty()) {
            target.metacritic_slug = Some(slug.clone());
        }
    }

    target.freshness = target.freshness.latest(incoming.freshness);
}

fn replace_if_present(target: &mut Vec<String>, incoming: &[String]) {
    if !incoming.is_empty() {
        *target = incoming.to_vec();
    }
}
