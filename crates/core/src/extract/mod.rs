//! Field extraction from storefront app pages.
//!
//! [`extract`] is pure: it never fails, a field whose pattern does not
//! match is simply left empty in the returned [`PageData`].

mod html;
mod patterns;

pub use html::decode_entities;

use regex_lite::Regex;
use tracing::debug;

use crate::entry::{AppType, Entry, Freshness, LanguageSupport, Platforms, VrSupport};
use html::clean_capture;
use patterns::*;

/// Flag inserted when a page lists achievements without the matching icon.
pub const ACHIEVEMENTS_FLAG: &str = "Steam Achievements";

/// Fields found on one storefront page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub app_type: AppType,
    pub platforms: Platforms,
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
    pub metacritic_slug: Option<String>,
    pub release_date: Option<String>,
}

impl PageData {
    /// Turn into a partial record stamped with the scrape time.
    pub fn into_entry(self, id: u32, scraped_at: i64, parent_id: Option<u32>) -> Entry {
        Entry {
            id,
            app_type: self.app_type,
            parent_id,
            platforms: self.platforms,
            name: None,
            genres: self.genres,
            tags: self.tags,
            flags: self.flags,
            developers: self.developers,
            publishers: self.publishers,
            language_support: self.language_support,
            vr_support: self.vr_support,
            review_total: self.review_total,
            review_positive_percentage: self.review_positive_percentage,
            total_achievements: self.total_achievements,
            metacritic_slug: self.metacritic_slug,
            release_date: self.release_date,
            freshness: Freshness::scraped(scraped_at),
            playtime: Default::default(),
        }
    }
}

/// Whether the storefront answered with its generic error page.
pub fn is_site_error(body: &str) -> bool {
    body.contains(SITE_ERROR)
}

/// Whether the body carries the game or software breadcrumb of an app page.
pub fn looks_like_app_page(body: &str) -> bool {
    GAME_CHECK.is_match(body) || SOFTWARE_CHECK.is_match(body)
}

/// Extract every known field from a page body.
pub fn extract(body: &str) -> PageData {
    let mut data = PageData {
        app_type: classify(body),
        platforms: platforms(body),
        genres: block_links(&GENRE_BLOCK, body),
        tags: anchors(&TAG, body),
        flags: anchors(&FLAG, body),
        developers: block_links(&DEVELOPER_BLOCK, body),
        publishers: block_links(&PUBLISHER_BLOCK, body),
        language_support: language_support(body),
        vr_support: vr_support(body),
        metacritic_slug: single(&METACRITIC, body),
        release_date: verbatim(&RELEASE_DATE, body),
        ..PageData::default()
    };

    if let Some((percentage, total)) = reviews(body) {
        data.review_positive_percentage = percentage;
        data.review_total = total;
    }

    if let Some(caps) = ACHIEVEMENTS.captures(body) {
        if let Ok(count) = caps[1].parse::<u32>() {
            data.total_achievements = count;
        }
        if data.total_achievements > 0 && !data.flags.iter().any(|f| f == ACHIEVEMENTS_FLAG) {
            data.flags.push(ACHIEVEMENTS_FLAG.to_string());
        }
    }

    debug!(
        app_type = data.app_type.as_str(),
        genres = data.genres.len(),
        tags = data.tags.len(),
        flags = data.flags.len(),
        "Extracted page fields"
    );

    data
}

/// DLC wins over software, software over game.
fn classify(body: &str) -> AppType {
    if DLC_CHECK.is_match(body) {
        AppType::Dlc
    } else if SOFTWARE_CHECK.is_match(body) {
        AppType::Application
    } else if GAME_CHECK.is_match(body) {
        AppType::Game
    } else {
        AppType::Unknown
    }
}

fn platforms(body: &str) -> Platforms {
    let mut platforms = Platforms::empty();
    if body.contains(PLATFORM_WINDOWS) {
        platforms |= Platforms::WINDOWS;
    }
    if body.contains(PLATFORM_MAC) {
        platforms |= Platforms::MAC;
    }
    if body.contains(PLATFORM_LINUX) {
        platforms |= Platforms::LINUX;
    }
    platforms
}

/// Every match of a repeated anchor, decoded and trimmed.
fn anchors(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).and_then(|m| clean_capture(m.as_str())))
        .collect()
}

/// Link texts from the first block the pattern isolates.
fn block_links(block: &Regex, body: &str) -> Vec<String> {
    block
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| anchors(&LINK_TEXT, m.as_str()))
        .unwrap_or_default()
}

fn single(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean_capture(m.as_str()))
}

/// First capture exactly as printed.
fn verbatim(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Positive percentage and total count. Separators are stripped from the count.
fn reviews(body: &str) -> Option<(u8, u32)> {
    let caps = REVIEWS.captures(body)?;
    let percentage = caps[1].parse::<u8>().ok().filter(|p| *p <= 100)?;
    let digits: String = caps[2].chars().filter(|c| c.is_ascii_digit()).collect();
    let total = digits.parse::<u32>().ok()?;
    Some((percentage, total))
}

fn vr_support(body: &str) -> VrSupport {
    let Some(caps) = VR_SECTIONS.captures(body) else {
        return VrSupport::default();
    };
    let section = |i: usize| {
        caps.get(i)
            .map(|m| anchors(&VR_FLAG, m.as_str().trim()))
            .unwrap_or_default()
    };
    VrSupport {
        headsets: section(1),
        input: section(2),
        play_area: section(3),
    }
}

fn language_support(body: &str) -> LanguageSupport {
    let mut support = LanguageSupport::default();

    for caps in LANGUAGE_ROW.captures_iter(body) {
        let Some(language) = clean_capture(&caps[1]) else {
            continue;
        };
        if MALFORMED_LANGUAGE_PREFIXES
            .iter()
            .any(|prefix| language.starts_with(prefix))
        {
            continue;
        }

        let marked = |i: usize| clean_capture(&caps[i]).is_some();
        if marked(2) {
            support.interface.push(language.clone());
        }
        if marked(3) {
            support.full_audio.push(language.clone());
        }
        if marked(4) {
            support.subtitles.push(language);
        }
    }

    support
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::StorePageBuilder;

    #[test]
    fn test_extract_full_game_page() {
        let body = StorePageBuilder::game("Half-Life 2")
            .genres(&["Action", "Shooter"])
            .tags(&["FPS", "Sci-fi", "Classic"])
            .flags(&["Single-player", "Steam Achievements"])
            .developers(&["Valve"])
            .publishers(&["Valve"])
            .platforms(true, true, true)
            .reviews(97, "154,321")
            .achievements(33)
            .release_date("16 Nov, 2004")
            .metacritic("half-life-2")
            .language("English", true, true, true)
            .language("German", true, false, true)
            .build();

        let data = extract(&body);
        assert_eq!(data.app_type, AppType::Game);
        assert_eq!(data.genres, vec!["Action", "Shooter"]);
        assert_eq!(data.tags, vec!["FPS", "Sci-fi", "Classic"]);
        assert_eq!(data.flags, vec!["Single-player", "Steam Achievements"]);
        assert_eq!(data.developers, vec!["Valve"]);
        assert_eq!(data.publishers, vec!["Valve"]);
        assert_eq!(data.platforms, Platforms::ALL);
        assert_eq!(data.review_positive_percentage, 97);
        assert_eq!(data.review_total, 154_321);
        assert_eq!(data.total_achievements, 33);
        assert_eq!(data.release_date.as_deref(), Some("16 Nov, 2004"));
        assert_eq!(data.metacritic_slug.as_deref(), Some("half-life-2"));
        assert_eq!(data.language_support.interface, vec!["English", "German"]);
        assert_eq!(data.language_support.full_audio, vec!["English"]);
        assert_eq!(data.language_support.subtitles, vec!["English", "German"]);
    }

    #[test]
    fn test_achievements_force_flag() {
        let body = StorePageBuilder::game("Portal")
            .flags(&["Single-player"])
            .achievements(42)
            .build();

        let data = extract(&body);
        assert_eq!(data.total_achievements, 42);
        assert_eq!(data.flags, vec!["Single-player", ACHIEVEMENTS_FLAG]);
    }

    #[test]
    fn test_achievements_flag_not_duplicated() {
        let body = StorePageBuilder::game("Portal")
            .flags(&[ACHIEVEMENTS_FLAG])
            .achievements(15)
            .build();

        let data = extract(&body);
        assert_eq!(data.flags, vec![ACHIEVEMENTS_FLAG]);
    }

    #[test]
    fn test_missing_fields_stay_empty() {
        let body = StorePageBuilder::game("Bare").build();
        let data = extract(&body);
        assert_eq!(data.app_type, AppType::Game);
        assert!(data.genres.is_empty());
        assert!(data.tags.is_empty());
        assert!(data.flags.is_empty());
        assert!(data.platforms.is_empty());
        assert_eq!(data.review_total, 0);
        assert_eq!(data.total_achievements, 0);
        assert!(data.release_date.is_none());
        assert!(data.metacritic_slug.is_none());
        assert!(data.language_support.is_empty());
        assert!(data.vr_support.is_empty());
    }

    #[test]
    fn test_extract_never_fails_on_garbage() {
        let data = extract("<html><body>nothing to see</body></html>");
        assert_eq!(data, PageData::default());
        let data = extract("");
        assert_eq!(data, PageData::default());
    }

    #[test]
    fn test_classification_precedence() {
        let dlc = StorePageBuilder::dlc("Soundtrack").software_breadcrumb().build();
        assert_eq!(extract(&dlc).app_type, AppType::Dlc);

        let app = StorePageBuilder::application("Editor").build();
        assert_eq!(extract(&app).app_type, AppType::Application);

        let both = StorePageBuilder::game("Tool").software_breadcrumb().build();
        assert_eq!(extract(&both).app_type, AppType::Application);
    }

    #[test]
    fn test_release_date_kept_verbatim() {
        let body = StorePageBuilder::game("X")
            .release_date(" Q3 2025 &amp; later ")
            .build();
        assert_eq!(
            extract(&body).release_date.as_deref(),
            Some(" Q3 2025 &amp; later ")
        );
    }

    #[test]
    fn test_entities_decoded_and_blanks_dropped() {
        let body = StorePageBuilder::game("X")
            .tags(&["Rock &amp; Roll", "   ", "Puzzle"])
            .developers(&["Tom &#38; Friends"])
            .build();

        let data = extract(&body);
        assert_eq!(data.tags, vec!["Rock & Roll", "Puzzle"]);
        assert_eq!(data.developers, vec!["Tom & Friends"]);
    }

    #[test]
    fn test_review_count_with_period_separator() {
        let body = StorePageBuilder::game("X").reviews(88, "12.500").build();
        let data = extract(&body);
        assert_eq!(data.review_positive_percentage, 88);
        assert_eq!(data.review_total, 12_500);
    }

    #[test]
    fn test_vr_sections() {
        let body = StorePageBuilder::game("VR Game")
            .vr(&["Valve Index", "HTC Vive"], &["Tracked Motion Controllers"], &["Room-Scale", "Standing"])
            .build();

        let data = extract(&body);
        assert_eq!(data.vr_support.headsets, vec!["Valve Index", "HTC Vive"]);
        assert_eq!(data.vr_support.input, vec!["Tracked Motion Controllers"]);
        assert_eq!(data.vr_support.play_area, vec!["Room-Scale", "Standing"]);
    }

    #[test]
    fn test_malformed_language_rows_skipped() {
        let body = StorePageBuilder::game("X")
            .language("#lang_français", true, true, true)
            .language("(all with full audio support)", true, false, false)
            .language("Japanese", false, false, true)
            .build();

        let data = extract(&body);
        assert!(data.language_support.interface.is_empty());
        assert!(data.language_support.full_audio.is_empty());
        assert_eq!(data.language_support.subtitles, vec!["Japanese"]);
    }

    #[test]
    fn test_page_checks() {
        assert!(is_site_error("<html><title>Site Error</title></html>"));
        assert!(!is_site_error(&StorePageBuilder::game("X").build()));

        assert!(looks_like_app_page(&StorePageBuilder::game("X").build()));
        assert!(looks_like_app_page(&StorePageBuilder::application("X").build()));
        assert!(!looks_like_app_page("<html>hardware</html>"));
    }

    #[test]
    fn test_into_entry_stamps_scrape_time() {
        let body = StorePageBuilder::dlc("Expansion").genres(&["RPG"]).build();
        let entry = extract(&body).into_entry(500, 1_700_000_000, Some(400));
        assert_eq!(entry.id, 500);
        assert_eq!(entry.app_type, AppType::Dlc);
        assert_eq!(entry.parent_id, Some(400));
        assert_eq!(entry.genres, vec!["RPG"]);
        assert_eq!(entry.freshness.page_scrape, 1_700_000_000);
        assert_eq!(entry.freshness.catalog_update, 0);
        assert!(entry.name.is_none());
    }
}
