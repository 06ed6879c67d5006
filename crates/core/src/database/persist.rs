//! Versioned on-disk container.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::entry::Entry;

use super::{legacy, Database, DEFAULT_LANGUAGE};

/// Current container layout.
pub const FORMAT_VERSION: u64 = 3;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported database version {0}")]
    UnsupportedVersion(u64),

    #[error("Malformed database: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct ContainerOut<'a> {
    version: u64,
    last_playtime_update: i64,
    language: &'a str,
    entries: Vec<&'a Entry>,
}

#[derive(Deserialize)]
struct ContainerIn {
    #[serde(default)]
    last_playtime_update: i64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    entries: Vec<Entry>,
}

impl Database {
    pub fn to_json(&self) -> Result<String, PersistError> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.id);

        let container = ContainerOut {
            version: FORMAT_VERSION,
            last_playtime_update: self.last_playtime_update,
            language: &self.language,
            entries,
        };
        Ok(serde_json::to_string_pretty(&container)?)
    }

    /// Parse any supported container version.
    pub fn from_json(text: &str) -> Result<Database, PersistError> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(PersistError::Malformed(
                "top level is not an object".to_string(),
            ));
        }

        let version = value.get("version").and_then(Value::as_u64).unwrap_or(1);
        match version {
            1 | 2 => legacy::from_legacy(value),
            FORMAT_VERSION => {
                let container: ContainerIn = serde_json::from_value(value)?;
                let mut entries = HashMap::with_capacity(container.entries.len());
                for entry in container.entries {
                    if entry.id == 0 {
                        warn!("Skipping stored record with id 0");
                        continue;
                    }
                    entries.insert(entry.id, entry);
                }

                let mut db = Database::new(
                    container
                        .language
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                );
                db.entries = entries;
                db.last_playtime_update = container.last_playtime_update;
                Ok(db)
            }
            other => Err(PersistError::UnsupportedVersion(other)),
        }
    }

    /// Write atomically: a sibling temp file is renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let json = self.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        {
            let mut file = fs::File::create(tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, path)?;

        info!(path = %path.display(), entries = self.len(), "Saved database");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Database, PersistError> {
        let text = fs::read_to_string(path)?;
        let db = Database::from_json(&text)?;
        info!(
            path = %path.display(),
            entries = db.len(),
            language = %db.language,
            "Loaded database"
        );
        Ok(db)
    }

    /// Replace the contents with what is stored at `path`.
    ///
    /// Returns false and leaves `self` untouched if the file is missing or
    /// cannot be parsed.
    pub fn reload_from(&mut self, path: &Path) -> bool {
        match Database::load(path) {
            Ok(loaded) => {
                *self = loaded;
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load database");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AppType, Platforms};
    use crate::testing::fixtures::{catalog_entry, child_entry, scraped_entry};
    use tempfile::TempDir;

    fn sample() -> Database {
        let mut db = Database::new("german");
        let mut game = scraped_entry(220, 1_700_000_000, &["Action"], &["FPS", "Sci-fi"]);
        game.name = Some("Half-Life 2".to_string());
        game.platforms = Platforms::ALL;
        game.playtime.main = 780;
        db.upsert(game);
        db.upsert(child_entry(340, 220));
        db.upsert(catalog_entry(10, "Counter-Strike", AppType::Game, 1_600_000_000));
        db.apply_playtimes(&[], false, 1_650_000_000);
        db
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");

        let db = sample();
        db.save(&path).unwrap();
        assert!(!dir.path().join("catalog.json.tmp").exists());

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.language(), "german");
        assert_eq!(loaded.last_playtime_update(), 1_650_000_000);
        assert_eq!(loaded.get(220), db.get(220));
        assert_eq!(loaded.get(340).unwrap().parent_id, Some(220));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/catalog.json");
        sample().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_json_has_version_and_sorted_entries() {
        let json = sample().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["language"], "german");
        let ids: Vec<u64> = value["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![10, 220, 340]);
    }

    #[test]
    fn test_unsupported_version() {
        let result = Database::from_json(r#"{"version": 9, "entries": []}"#);
        assert!(matches!(result, Err(PersistError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_malformed_container() {
        assert!(matches!(Database::from_json("[1, 2]"), Err(PersistError::Malformed(_))));
        assert!(matches!(Database::from_json("{not json"), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_reload_failure_leaves_collection_untouched() {
        let dir = TempDir::new().unwrap();
        let mut db = sample();

        assert!(!db.reload_from(&dir.path().join("missing.json")));
        assert_eq!(db.len(), 3);

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"version\": 3, \"entries\": 12}").unwrap();
        assert!(!db.reload_from(&broken));
        assert_eq!(db.len(), 3);
        assert_eq!(db.language(), "german");
    }

    #[test]
    fn test_reload_success_replaces_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.json");
        let mut other = Database::default();
        other.upsert(catalog_entry(1, "Only", AppType::Game, 1));
        other.save(&path).unwrap();

        let mut db = sample();
        let _ = db.all_genres();
        assert!(db.reload_from(&path));
        assert_eq!(db.ids(), vec![1]);
        assert_eq!(db.language(), "english");
        assert!(db.all_genres().is_empty());
    }
}
