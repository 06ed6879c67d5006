//! Adapter for the flat v1/v2 layout.
//!
//! Old containers hold `{ version, lastHltbUpdate, language, games: [...] }`
//! where every row is a flat object with camelCase keys. Rows that cannot be
//! read are skipped rather than failing the whole load.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::entry::{
    AppType, Entry, Freshness, LanguageSupport, Platforms, PlaytimeEstimates, VrSupport,
};

use super::persist::PersistError;
use super::{Database, DEFAULT_LANGUAGE};

pub(super) fn from_legacy(value: Value) -> Result<Database, PersistError> {
    let Value::Object(root) = value else {
        return Err(PersistError::Malformed(
            "top level is not an object".to_string(),
        ));
    };

    let language = root
        .get("language")
        .or_else(|| root.get("Language"))
        .and_then(Value::as_str)
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_LANGUAGE);

    let rows = match root.get("games") {
        Some(Value::Array(rows)) => rows.as_slice(),
        None | Some(Value::Null) => &[],
        Some(_) => {
            return Err(PersistError::Malformed(
                "games is not an array".to_string(),
            ))
        }
    };

    let mut entries = HashMap::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        match row.as_object().and_then(entry_from_row) {
            Some(entry) if !entries.contains_key(&entry.id) => {
                entries.insert(entry.id, entry);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "Skipped unreadable legacy rows");
    }

    let mut db = Database::new(language);
    db.entries = entries;
    db.last_playtime_update = root.get("lastHltbUpdate").and_then(Value::as_i64).unwrap_or(0);

    info!(entries = db.len(), "Converted legacy database");
    Ok(db)
}

fn entry_from_row(row: &Map<String, Value>) -> Option<Entry> {
    let id = row
        .get("id")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .and_then(|id| u32::try_from(id).ok())?;

    Some(Entry {
        id,
        app_type: row.get("type").map(parse_app_type).unwrap_or_default(),
        parent_id: row
            .get("parent")
            .and_then(Value::as_i64)
            .filter(|p| *p > 0)
            .and_then(|p| u32::try_from(p).ok()),
        platforms: row.get("platforms").map_or(Platforms::ALL, parse_platforms),
        name: string(row, "name"),
        genres: strings(row, "genres"),
        tags: strings(row, "tags"),
        flags: strings(row, "flags"),
        developers: strings(row, "developers"),
        publishers: strings(row, "publishers"),
        language_support: LanguageSupport {
            interface: strings(row, "langInterface"),
            full_audio: strings(row, "langFullAudio"),
            subtitles: strings(row, "langSubtitles"),
        },
        vr_support: VrSupport {
            headsets: strings(row, "vrHeadsets"),
            input: strings(row, "vrInput"),
            play_area: strings(row, "vrPlayArea"),
        },
        review_total: number(row, "reviewTotal"),
        review_positive_percentage: number(row, "reviewPositiveP").min(100) as u8,
        total_achievements: number(row, "achievements"),
        metacritic_slug: string(row, "mcUrl"),
        release_date: string(row, "steamDate"),
        freshness: Freshness {
            catalog_update: row.get("lastAppInfoUpdate").and_then(Value::as_i64).unwrap_or(0),
            page_scrape: row.get("lastStoreUpdate").and_then(Value::as_i64).unwrap_or(0),
        },
        playtime: PlaytimeEstimates {
            main: number(row, "hltbMain"),
            extras: number(row, "hltbExtras"),
            completionist: number(row, "hltbCompletionist"),
        },
    })
}

fn string(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn strings(row: &Map<String, Value>, key: &str) -> Vec<String> {
    match row.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn number(row: &Map<String, Value>, key: &str) -> u32 {
    row.get(key)
        .and_then(Value::as_i64)
        .map_or(0, |n| n.clamp(0, u32::MAX as i64) as u32)
}

fn parse_app_type(value: &Value) -> AppType {
    match value.as_str().map(str::to_ascii_lowercase).as_deref() {
        Some("game") => AppType::Game,
        Some("dlc") => AppType::Dlc,
        Some("application") => AppType::Application,
        _ => AppType::Unknown,
    }
}

/// Either a bit mask or a comma separated list of names.
fn parse_platforms(value: &Value) -> Platforms {
    if let Some(bits) = value.as_u64() {
        return Platforms::from_bits_truncate((bits & u64::from(Platforms::ALL.bits())) as u8);
    }

    let Some(text) = value.as_str() else {
        return Platforms::ALL;
    };
    text.split(',')
        .map(|name| name.trim().to_ascii_lowercase())
        .fold(Platforms::empty(), |acc, name| match name.as_str() {
            "windows" => acc | Platforms::WINDOWS,
            "mac" => acc | Platforms::MAC,
            "linux" => acc | Platforms::LINUX,
            "all" => Platforms::ALL,
            _ => acc,
        })
}
