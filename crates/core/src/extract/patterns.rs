//! Storefront markup patterns.
//!
//! These target the narrow markup dialect of app pages, not HTML in
//! general. List fields that the page renders as a run of links are
//! matched in two steps: a block pattern isolates the run, then an anchor
//! pattern collects each link text inside it.

use once_cell::sync::Lazy;
use regex_lite::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid storefront pattern {pattern:?}: {e}"))
}

pub(crate) static GENRE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<b>[^:<]*:</b>\s*((?:<a href="https?://store\.steampowered\.com/genre/[^>]*>[^<]+</a>,?\s*)+)<br>"#,
    )
});

pub(crate) static DEVELOPER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"((?:<a href="https?://store\.steampowered\.com/search/\?developer=[^"]*">[^<]+</a>,?\s*)+)<br>"#,
    )
});

pub(crate) static PUBLISHER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"((?:<a href="https?://store\.steampowered\.com/search/\?publisher=[^"]*">[^<]+</a>,?\s*)+)<br>"#,
    )
});

/// Text of each link inside an isolated block.
pub(crate) static LINK_TEXT: Lazy<Regex> = Lazy::new(|| compile(r#"<a [^>]*>([^<]+)</a>"#));

pub(crate) static FLAG: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<a class="name" href="https?://store\.steampowered\.com/search/\?category2=[^"]*">([^<]*)</a>"#,
    )
});

pub(crate) static TAG: Lazy<Regex> =
    Lazy::new(|| compile(r#"<a[^>]*class="app_tag"[^>]*>([^<]*)</a>"#));

pub(crate) static DLC_CHECK: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<img class="category_icon" src="https?://store\.akamai\.steamstatic\.com/public/images/v6/ico/ico_dlc\.png">"#,
    )
});

pub(crate) static SOFTWARE_CHECK: Lazy<Regex> = Lazy::new(|| {
    compile(r#"<a href="https?://store\.steampowered\.com/search/\?category1=994&snr="#)
});

pub(crate) static GAME_CHECK: Lazy<Regex> =
    Lazy::new(|| compile(r#"<a href="https?://store\.steampowered\.com/search/\?term=&snr="#));

pub(crate) static METACRITIC: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<div id="game_area_metalink">\s*<a href="https?://www\.metacritic\.com/game/pc/([^"?]*)\?ftag="#,
    )
});

pub(crate) static REVIEWS: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<span class="(?:nonresponsive_hidden ?| responsive_reviewdesc ?){2}">[^\d]*(\d+)%[^\d]*([\d.,]+)[^\d]*\s*</span>"#,
    )
});

pub(crate) static ACHIEVEMENTS: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<div (?:id="achievement_block" ?|class="block responsive_apppage_details_right" ?){2}>\s*<div class="block_title">[^\d]*(\d+)[^\d<]*</div>\s*<div class="communitylink_achievement_images">"#,
    )
});

/// Headsets, input and play area sections, each running to the next marker.
pub(crate) static VR_SECTIONS: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"(?s)<div class="details_block vrsupport">(.*?)<div class="details_block vrsupport">(.*?)<div class="details_block vrsupport">(.*)"#,
    )
});

pub(crate) static VR_FLAG: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<div class="game_area_details_specs">.*?<a class="name" href="https?://store\.steampowered\.com/search/\?vrsupport=\d*">([^<]*)</a></div>"#,
    )
});

pub(crate) static LANGUAGE_ROW: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<td style="width: 94px; text-align: left" class="ellipsis">\s*([^<]*)</td>\s*<td class="checkcol">\s*(.*?)\s*</td>\s*<td class="checkcol">\s*(.*?)\s*</td>\s*<td class="checkcol">\s*(.*?)\s*</td>"#,
    )
});

pub(crate) static RELEASE_DATE: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"<div class="release_date">\s*<div[^>]*>[^<]*</div>\s*<div class="date">([^<]+)</div>"#,
    )
});

pub(crate) const PLATFORM_WINDOWS: &str = r#"<span class="platform_img win"></span>"#;
pub(crate) const PLATFORM_MAC: &str = r#"<span class="platform_img mac"></span>"#;
pub(crate) const PLATFORM_LINUX: &str = r#"<span class="platform_img linux"></span>"#;
pub(crate) const SITE_ERROR: &str = "<title>Site Error</title>";

/// Language-table rows starting with these are broken source rows.
pub(crate) const MALFORMED_LANGUAGE_PREFIXES: &[&str] = &["#lang", "("];
