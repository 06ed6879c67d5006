use bitflags::bitflags;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Classification of a storefront app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    #[default]
    Unknown,
    Application,
    Game,
    Dlc,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Unknown => "unknown",
            AppType::Application => "application",
            AppType::Game => "game",
            AppType::Dlc => "dlc",
        }
    }
}

bitflags! {
    /// Supported operating systems.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Platforms: u8 {
        const WINDOWS = 1;
        const MAC = 1 << 1;
        const LINUX = 1 << 2;
        const ALL = Self::WINDOWS.bits() | Self::MAC.bits() | Self::LINUX.bits();
    }
}

impl Platforms {
    /// Lower-case names of the set bits, in Windows, Mac, Linux order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::WINDOWS) {
            names.push("windows");
        }
        if self.contains(Self::MAC) {
            names.push("mac");
        }
        if self.contains(Self::LINUX) {
            names.push("linux");
        }
        names
    }
}

// Stored and fed as the raw bit number, unknown bits dropped.
impl Serialize for Platforms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Platforms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Platforms::from_bits_truncate)
    }
}

/// Languages listed in the storefront's language table, per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSupport {
    pub interface: Vec<String>,
    pub full_audio: Vec<String>,
    pub subtitles: Vec<String>,
}

impl LanguageSupport {
    pub fn is_empty(&self) -> bool {
        self.interface.is_empty() && self.full_audio.is_empty() && self.subtitles.is_empty()
    }
}

/// VR capability lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrSupport {
    pub headsets: Vec<String>,
    pub input: Vec<String>,
    pub play_area: Vec<String>,
}

impl VrSupport {
    pub fn is_empty(&self) -> bool {
        self.headsets.is_empty() && self.input.is_empty() && self.play_area.is_empty()
    }
}

/// When each source last supplied data for a record. 0 means never.
///
/// The two tracks age independently: `catalog_update` covers name,
/// classification and parent linkage, `page_scrape` covers everything
/// extracted from the storefront page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Freshness {
    pub catalog_update: i64,
    pub page_scrape: i64,
}

impl Freshness {
    pub fn catalog(timestamp: i64) -> Self {
        Self {
            catalog_update: timestamp,
            page_scrape: 0,
        }
    }

    pub fn scraped(timestamp: i64) -> Self {
        Self {
            catalog_update: 0,
            page_scrape: timestamp,
        }
    }

    /// Per-track maximum of both markers.
    pub fn latest(self, other: Freshness) -> Freshness {
        Freshness {
            catalog_update: self.catalog_update.max(other.catalog_update),
            page_scrape: self.page_scrape.max(other.page_scrape),
        }
    }
}

/// Time-to-finish figures in minutes. 0 means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaytimeEstimates {
    pub main: u32,
    pub extras: u32,
    pub completionist: u32,
}

/// Everything known about one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub id: u32,
    pub app_type: AppType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
    pub platforms: Platforms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub flags: Vec<String>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub language_support: LanguageSupport,
    pub vr_support: VrSupport,
    pub review_total: u32,
    pub review_positive_percentage: u8,
    pub total_achievements: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic_slug: Option<String>,
    /// Release date exactly as the storefront printed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    pub freshness: Freshness,
    pub playtime: PlaytimeEstimates,
}

const RELEASE_DATE_FORMATS: &[&str] = &[
    "%d %b, %Y",
    "%b %d, %Y",
    "%d %B, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
];

impl Entry {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_name(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Whether a storefront page has ever been scraped into this record.
    pub fn has_page_data(&self) -> bool {
        self.freshness.page_scrape > 0
    }

    pub fn is_game_or_application(&self) -> bool {
        matches!(self.app_type, AppType::Game | AppType::Application)
    }

    /// VR support without looking at parents.
    pub fn supports_vr_directly(&self) -> bool {
        !self.vr_support.is_empty()
    }

    /// Best-effort year from the free-text release date.
    pub fn release_year(&self) -> Option<i32> {
        let text = self.release_date.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }

        for format in RELEASE_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some(date.year());
            }
        }

        scan_year(text)
    }
}

/// First standalone run of exactly four digits that looks like a year.
fn scan_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end - start == 4 {
            if let Ok(year) = text[start..end].parse::<i32>() {
                if (1950..=2200).contains(&year) {
                    return Some(year);
                }
            }
        }
        start = end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platforms_bit_ops() {
        let mut p = Platforms::WINDOWS | Platforms::LINUX;
        assert!(p.contains(Platforms::WINDOWS));
        assert!(!p.contains(Platforms::MAC));
        assert_eq!(p.names(), vec!["windows", "linux"]);

        p |= Platforms::MAC;
        assert_eq!(p, Platforms::ALL);
        assert!(Platforms::empty().is_empty());
        assert_eq!(Platforms::from_bits_truncate(0xff), Platforms::ALL);
    }

    #[test]
    fn test_platforms_serialize_as_bits() {
        let json = serde_json::to_string(&(Platforms::WINDOWS | Platforms::MAC)).unwrap();
        assert_eq!(json, "3");
        let parsed: Platforms = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, Platforms::LINUX);
        let parsed: Platforms = serde_json::from_str("255").unwrap();
        assert_eq!(parsed, Platforms::ALL);
    }

    #[test]
    fn test_app_type_serde() {
        assert_eq!(serde_json::to_string(&AppType::Dlc).unwrap(), "\"dlc\"");
        let parsed: AppType = serde_json::from_str("\"application\"").unwrap();
        assert_eq!(parsed, AppType::Application);
        assert_eq!(AppType::default(), AppType::Unknown);
    }

    #[test]
    fn test_new_entry_defaults() {
        let entry = Entry::new(440);
        assert_eq!(entry.id, 440);
        assert_eq!(entry.app_type, AppType::Unknown);
        assert!(entry.platforms.is_empty());
        assert!(entry.name.is_none());
        assert_eq!(entry.freshness, Freshness::default());
        assert!(!entry.has_page_data());
    }

    #[test]
    fn test_entry_deserializes_with_missing_fields() {
        let entry: Entry = serde_json::from_str(r#"{"id": 10, "name": "Counter-Strike"}"#).unwrap();
        assert_eq!(entry.id, 10);
        assert_eq!(entry.name.as_deref(), Some("Counter-Strike"));
        assert!(entry.genres.is_empty());
        assert_eq!(entry.freshness.page_scrape, 0);
    }

    #[test]
    fn test_freshness_latest() {
        let a = Freshness {
            catalog_update: 10,
            page_scrape: 3,
        };
        let b = Freshness {
            catalog_update: 5,
            page_scrape: 7,
        };
        let merged = a.latest(b);
        assert_eq!(merged.catalog_update, 10);
        assert_eq!(merged.page_scrape, 7);
    }

    #[test]
    fn test_release_year_formats() {
        let mut entry = Entry::new(1);
        entry.release_date = Some("21 Aug, 2012".to_string());
        assert_eq!(entry.release_year(), Some(2012));

        entry.release_date = Some("Nov 16, 2004".to_string());
        assert_eq!(entry.release_year(), Some(2004));

        entry.release_date = Some("2019-03-05".to_string());
        assert_eq!(entry.release_year(), Some(2019));
    }

    #[test]
    fn test_release_year_fallback_scan() {
        let mut entry = Entry::new(1);
        entry.release_date = Some("Q3 2025".to_string());
        assert_eq!(entry.release_year(), Some(2025));

        entry.release_date = Some("Coming soon".to_string());
        assert_eq!(entry.release_year(), None);

        entry.release_date = Some("12345 bottles".to_string());
        assert_eq!(entry.release_year(), None);

        entry.release_date = None;
        assert_eq!(entry.release_year(), None);
    }

    #[test]
    fn test_game_or_application() {
        let mut entry = Entry::new(1);
        assert!(!entry.is_game_or_application());
        entry.app_type = AppType::Application;
        assert!(entry.is_game_or_application());
        entry.app_type = AppType::Dlc;
        assert!(!entry.is_game_or_application());
    }
}
