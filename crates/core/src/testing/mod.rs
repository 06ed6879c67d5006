//! Testing utilities and mock implementations.
//!
//! Provides a scriptable storefront transport and fixtures that render
//! storefront markup, so fetch, extract and merge can be exercised end to
//! end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use appcatalog_core::testing::{MockStoreTransport, fixtures::StorePageBuilder};
//!
//! let transport = Arc::new(MockStoreTransport::new());
//! transport.respond_ok(url, &StorePageBuilder::game("Portal").tags(&["Puzzle"]).build()).await;
//! let fetcher = StorePageFetcher::new(transport.clone(), base_url);
//! ```

mod mock_store;

pub use mock_store::MockStoreTransport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::entry::{AppType, Entry, Freshness, Platforms};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Create a named record with a catalog timestamp.
    pub fn catalog_entry(id: u32, name: &str, app_type: AppType, catalog_update: i64) -> Entry {
        Entry {
            id,
            name: Some(name.to_string()),
            app_type,
            freshness: Freshness::catalog(catalog_update),
            ..Entry::default()
        }
    }

    /// Create a scraped record with genres and tags.
    pub fn scraped_entry(id: u32, page_scrape: i64, genres: &[&str], tags: &[&str]) -> Entry {
        Entry {
            id,
            app_type: AppType::Game,
            platforms: Platforms::WINDOWS,
            genres: strings(genres),
            tags: strings(tags),
            freshness: Freshness::scraped(page_scrape),
            ..Entry::default()
        }
    }

    /// Create a record pointing at a parent.
    pub fn child_entry(id: u32, parent_id: u32) -> Entry {
        Entry {
            id,
            app_type: AppType::Dlc,
            parent_id: Some(parent_id),
            ..Entry::default()
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PageKind {
        Game,
        Application,
        Dlc,
    }

    /// Renders storefront app page markup.
    #[derive(Debug, Clone)]
    pub struct StorePageBuilder {
        name: String,
        kind: PageKind,
        software_breadcrumb: bool,
        genres: Vec<String>,
        tags: Vec<String>,
        flags: Vec<String>,
        developers: Vec<String>,
        publishers: Vec<String>,
        platforms: (bool, bool, bool),
        reviews: Option<(u8, String)>,
        achievements: Option<u32>,
        release_date: Option<String>,
        metacritic: Option<String>,
        languages: Vec<(String, bool, bool, bool)>,
        vr: Option<(Vec<String>, Vec<String>, Vec<String>)>,
    }

    impl StorePageBuilder {
        fn new(name: &str, kind: PageKind) -> Self {
            Self {
                name: name.to_string(),
                kind,
                software_breadcrumb: kind == PageKind::Application,
                genres: Vec::new(),
                tags: Vec::new(),
                flags: Vec::new(),
                developers: Vec::new(),
                publishers: Vec::new(),
                platforms: (false, false, false),
                reviews: None,
                achievements: None,
                release_date: None,
                metacritic: None,
                languages: Vec::new(),
                vr: None,
            }
        }

        pub fn game(name: &str) -> Self {
            Self::new(name, PageKind::Game)
        }

        pub fn application(name: &str) -> Self {
            Self::new(name, PageKind::Application)
        }

        pub fn dlc(name: &str) -> Self {
            Self::new(name, PageKind::Dlc)
        }

        pub fn software_breadcrumb(mut self) -> Self {
            self.software_breadcrumb = true;
            self
        }

        pub fn genres(mut self, genres: &[&str]) -> Self {
            self.genres = strings(genres);
            self
        }

        pub fn tags(mut self, tags: &[&str]) -> Self {
            self.tags = strings(tags);
            self
        }

        pub fn flags(mut self, flags: &[&str]) -> Self {
            self.flags = strings(flags);
            self
        }

        pub fn developers(mut self, developers: &[&str]) -> Self {
            self.developers = strings(developers);
            self
        }

        pub fn publishers(mut self, publishers: &[&str]) -> Self {
            self.publishers = strings(publishers);
            self
        }

        pub fn platforms(mut self, windows: bool, mac: bool, linux: bool) -> Self {
            self.platforms = (windows, mac, linux);
            self
        }

        pub fn reviews(mut self, percentage: u8, total: &str) -> Self {
            self.reviews = Some((percentage, total.to_string()));
            self
        }

        pub fn achievements(mut self, count: u32) -> Self {
            self.achievements = Some(count);
            self
        }

        pub fn release_date(mut self, date: &str) -> Self {
            self.release_date = Some(date.to_string());
            self
        }

        pub fn metacritic(mut self, slug: &str) -> Self {
            self.metacritic = Some(slug.to_string());
            self
        }

        pub fn language(mut self, name: &str, interface: bool, audio: bool, subtitles: bool) -> Self {
            self.languages
                .push((name.to_string(), interface, audio, subtitles));
            self
        }

        pub fn vr(mut self, headsets: &[&str], input: &[&str], play_area: &[&str]) -> Self {
            self.vr = Some((strings(headsets), strings(input), strings(play_area)));
            self
        }

        pub fn build(&self) -> String {
            let mut html = String::new();
            html.push_str(&format!(
                "<html>\n<head><title>{} on Steam</title></head>\n<body>\n",
                self.name
            ));

            html.push_str("<div class=\"breadcrumbs\">\n");
            if self.kind != PageKind::Application {
                html.push_str("<a href=\"https://store.steampowered.com/search/?term=&snr=1_5_9__205\">All Games</a>\n");
            }
            if self.software_breadcrumb {
                html.push_str("<a href=\"https://store.steampowered.com/search/?category1=994&snr=1_5_9__205\">All Software</a>\n");
            }
            html.push_str("</div>\n");

            if self.kind == PageKind::Dlc {
                html.push_str("<img class=\"category_icon\" src=\"https://store.akamai.steamstatic.com/public/images/v6/ico/ico_dlc.png\">\n");
            }

            html.push_str("<div class=\"game_area_purchase_platform\">");
            if self.platforms.0 {
                html.push_str("<span class=\"platform_img win\"></span>");
            }
            if self.platforms.1 {
                html.push_str("<span class=\"platform_img mac\"></span>");
            }
            if self.platforms.2 {
                html.push_str("<span class=\"platform_img linux\"></span>");
            }
            html.push_str("</div>\n");

            for tag in &self.tags {
                html.push_str(&format!(
                    "<a href=\"https://store.steampowered.com/tags/en/{}/?snr=1_5_9__409\" class=\"app_tag\" style=\"display: none;\">\n\t\t\t{}\t\t\t</a>\n",
                    urlencoding::encode(tag),
                    tag
                ));
            }

            if let Some((percentage, total)) = &self.reviews {
                html.push_str(&format!(
                    "<span class=\"nonresponsive_hidden responsive_reviewdesc\">\n- {}% of the {} user reviews for this game are positive.\n</span>\n",
                    percentage, total
                ));
            }

            if let Some(date) = &self.release_date {
                html.push_str(&format!(
                    "<div class=\"release_date\">\n<div class=\"subtitle column\">Release Date:</div>\n<div class=\"date\">{}</div>\n</div>\n",
                    date
                ));
            }

            html.push_str("<div class=\"details_block\">\n");
            html.push_str(&format!("<b>Title:</b> {}<br>\n", self.name));
            if !self.genres.is_empty() {
                let links: Vec<String> = self
                    .genres
                    .iter()
                    .map(|g| {
                        format!(
                            "<a href=\"https://store.steampowered.com/genre/{}/?snr=1_5_9__408\">{}</a>",
                            urlencoding::encode(g),
                            g
                        )
                    })
                    .collect();
                html.push_str(&format!("<b>Genre:</b> {}<br>\n", links.join(", ")));
            }
            if !self.developers.is_empty() {
                html.push_str(&format!(
                    "<b>Developer:</b>\n{}<br>\n",
                    search_links("developer", &self.developers)
                ));
            }
            if !self.publishers.is_empty() {
                html.push_str(&format!(
                    "<b>Publisher:</b>\n{}<br>\n",
                    search_links("publisher", &self.publishers)
                ));
            }
            html.push_str("</div>\n");

            if let Some(slug) = &self.metacritic {
                html.push_str(&format!(
                    "<div id=\"game_area_metalink\">\n<a href=\"https://www.metacritic.com/game/pc/{}?ftag=MCD-06-10aaa1f\" target=\"_blank\">Read Critic Reviews</a>\n</div>\n",
                    slug
                ));
            }

            for (i, flag) in self.flags.iter().enumerate() {
                html.push_str(&format!(
                    "<div class=\"game_area_details_specs\"><a class=\"name\" href=\"https://store.steampowered.com/search/?category2={}&snr=1_5_9__423\">{}</a></div>\n",
                    i + 1,
                    flag
                ));
            }

            if let Some(count) = self.achievements {
                html.push_str(&format!(
                    "<div id=\"achievement_block\" class=\"block responsive_apppage_details_right\">\n<div class=\"block_title\">Includes {} Steam Achievements</div>\n<div class=\"communitylink_achievement_images\"></div>\n</div>\n",
                    count
                ));
            }

            if !self.languages.is_empty() {
                html.push_str("<table class=\"game_language_options\">\n");
                for (name, interface, audio, subtitles) in &self.languages {
                    html.push_str(&format!(
                        "<tr>\n<td style=\"width: 94px; text-align: left\" class=\"ellipsis\">\n{}</td>\n{}{}{}</tr>\n",
                        name,
                        check_cell(*interface),
                        check_cell(*audio),
                        check_cell(*subtitles)
                    ));
                }
                html.push_str("</table>\n");
            }

            if let Some((headsets, input, play_area)) = &self.vr {
                let mut id = 100;
                for (title, values) in [("Headsets", headsets), ("Input", input), ("Play Area", play_area)] {
                    html.push_str(&format!(
                        "<div class=\"details_block vrsupport\"><div class=\"block_title vrsupport\">{}</div></div>\n",
                        title
                    ));
                    for value in values {
                        id += 1;
                        html.push_str(&format!(
                            "<div class=\"game_area_details_specs\"><a class=\"name\" href=\"https://store.steampowered.com/search/?vrsupport={}\">{}</a></div>\n",
                            id, value
                        ));
                    }
                }
            }

            html.push_str("</body>\n</html>\n");
            html
        }
    }

    fn search_links(param: &str, names: &[String]) -> String {
        names
            .iter()
            .map(|n| {
                format!(
                    "<a href=\"https://store.steampowered.com/search/?{}={}&snr=1_5_9__408\">{}</a>",
                    param,
                    urlencoding::encode(n),
                    n
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn check_cell(marked: bool) -> &'static str {
        if marked {
            "<td class=\"checkcol\">\n<span>&#10004;</span>\n</td>\n"
        } else {
            "<td class=\"checkcol\">\n</td>\n"
        }
    }
}
