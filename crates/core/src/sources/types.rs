use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::{AppType, Platforms};

use super::SourceError;

/// One `(id, name)` pair from the bulk listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppListItem {
    pub appid: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
struct AppListEnvelope {
    applist: AppListBody,
}

#[derive(Deserialize)]
struct AppListBody {
    #[serde(default)]
    apps: Vec<AppListItem>,
}

/// Parse `{"applist":{"apps":[{"appid":..,"name":..}]}}`.
pub fn parse_app_list(json: &str) -> Result<Vec<AppListItem>, SourceError> {
    let envelope: AppListEnvelope = serde_json::from_str(json)?;
    Ok(envelope.applist.apps)
}

/// One record of the offline metadata export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: u32,
    #[serde(default)]
    pub app_type: AppType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platforms: Platforms,
    #[serde(default)]
    pub parent_id: Option<u32>,
}

pub fn parse_catalog(json: &str) -> Result<Vec<CatalogRecord>, SourceError> {
    Ok(serde_json::from_str(json)?)
}

/// Time-to-finish figures for one id, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaytimeRecord {
    pub app_id: u32,
    pub main: u32,
    pub main_imputed: bool,
    pub extras: u32,
    pub extras_imputed: bool,
    pub completionist: u32,
    pub completionist_imputed: bool,
}

#[derive(Deserialize)]
struct PlaytimeEnvelope {
    #[serde(rename = "Games", default)]
    games: Vec<PlaytimeGame>,
}

#[derive(Deserialize)]
struct PlaytimeGame {
    #[serde(rename = "SteamAppData")]
    steam_app_data: SteamAppData,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SteamAppData {
    steam_app_id: u32,
    #[serde(default)]
    hltb_info: Option<HltbInfo>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct HltbInfo {
    #[serde(deserialize_with = "minutes")]
    main_ttb: u32,
    #[serde(deserialize_with = "flag")]
    main_ttb_imputed: bool,
    #[serde(deserialize_with = "minutes")]
    extras_ttb: u32,
    #[serde(deserialize_with = "flag")]
    extras_ttb_imputed: bool,
    #[serde(deserialize_with = "minutes")]
    completionist_ttb: u32,
    #[serde(deserialize_with = "flag")]
    completionist_ttb_imputed: bool,
}

/// Parse `{"Games":[{"SteamAppData":{"SteamAppId":..,"HltbInfo":{..}}}]}`.
///
/// Entries without an `HltbInfo` block are dropped.
pub fn parse_playtimes(json: &str) -> Result<Vec<PlaytimeRecord>, SourceError> {
    let envelope: PlaytimeEnvelope = serde_json::from_str(json)?;
    Ok(envelope
        .games
        .into_iter()
        .filter_map(|game| {
            let data = game.steam_app_data;
            let info = data.hltb_info?;
            Some(PlaytimeRecord {
                app_id: data.steam_app_id,
                main: info.main_ttb,
                main_imputed: info.main_ttb_imputed,
                extras: info.extras_ttb,
                extras_imputed: info.extras_ttb_imputed,
                completionist: info.completionist_ttb,
                completionist_imputed: info.completionist_ttb_imputed,
            })
        })
        .collect())
}

// The feed mixes integers, floats and nulls for durations.
fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => Ok(n
            .as_f64()
            .map_or(0, |v| v.clamp(0.0, u32::MAX as f64).round() as u32)),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s.trim().parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected minutes, got {}", other))),
    }
}

// Imputed markers arrive as booleans or as "True"/"False".
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("expected flag, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_list() {
        let json = r#"{"applist":{"apps":[
            {"appid": 10, "name": "Counter-Strike"},
            {"appid": 20}
        ]}}"#;
        let items = parse_app_list(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Counter-Strike");
        assert_eq!(items[1].name, "");
    }

    #[test]
    fn test_parse_app_list_rejects_other_shapes() {
        assert!(matches!(parse_app_list("[]"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_parse_catalog() {
        let json = r#"[
            {"id": 220, "app_type": "game", "name": "Half-Life 2", "platforms": 7},
            {"id": 340, "app_type": "dlc", "parent_id": 220},
            {"id": 5}
        ]"#;
        let records = parse_catalog(json).unwrap();
        assert_eq!(records[0].platforms, Platforms::ALL);
        assert_eq!(records[1].app_type, AppType::Dlc);
        assert_eq!(records[1].parent_id, Some(220));
        assert_eq!(records[2].app_type, AppType::Unknown);
        assert!(records[2].platforms.is_empty());
    }

    #[test]
    fn test_parse_playtimes() {
        let json = r#"{"Games":[
            {"SteamAppData":{"SteamAppId":400,"HltbInfo":{
                "MainTtb":180,"MainTtbImputed":"False",
                "ExtrasTtb":240.4,"ExtrasTtbImputed":"True",
                "CompletionistTtb":null,"CompletionistTtbImputed":true}}},
            {"SteamAppData":{"SteamAppId":500}}
        ]}"#;
        let records = parse_playtimes(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            PlaytimeRecord {
                app_id: 400,
                main: 180,
                main_imputed: false,
                extras: 240,
                extras_imputed: true,
                completionist: 0,
                completionist_imputed: true,
            }
        );
    }

    #[test]
    fn test_parse_playtimes_bad_duration() {
        let json = r#"{"Games":[{"SteamAppData":{"SteamAppId":1,"HltbInfo":{"MainTtb":[1]}}}]}"#;
        assert!(parse_playtimes(json).is_err());
    }
}
