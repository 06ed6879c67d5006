use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where the collection is persisted
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Write the collection back to `path` on graceful shutdown
    #[serde(default = "default_true")]
    pub save_on_shutdown: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            save_on_shutdown: true,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("appcatalog.json")
}

fn default_true() -> bool {
    true
}

/// Storefront connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Storefront root (e.g., "https://store.steampowered.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Language requested from the storefront; also the collection's source language
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Custom User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    "https://store.steampowered.com".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Batch scrape settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeConfig {
    /// Maximum concurrent page fetches per batch
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Default number of parent hops for fallback lookups
    #[serde(default = "default_fallback_depth")]
    pub fallback_depth: u32,
    /// Finished batches kept for the batch endpoints
    #[serde(default = "default_retained_batches")]
    pub retained_batches: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            fallback_depth: default_fallback_depth(),
            retained_batches: default_retained_batches(),
        }
    }
}

fn default_max_workers() -> usize {
    8
}

fn default_fallback_depth() -> u32 {
    3
}

fn default_retained_batches() -> usize {
    32
}

/// Bulk feeds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Bulk id/name listing
    #[serde(default = "default_app_list_url")]
    pub app_list_url: String,
    /// Time-to-finish feed
    #[serde(default = "default_playtime_url")]
    pub playtime_url: String,
    /// Keep playtime figures the feed marks as estimated
    #[serde(default)]
    pub include_imputed_times: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            app_list_url: default_app_list_url(),
            playtime_url: default_playtime_url(),
            include_imputed_times: false,
        }
    }
}

fn default_app_list_url() -> String {
    "https://api.steampowered.com/ISteamApps/GetAppList/v2".to_string()
}

fn default_playtime_url() -> String {
    "https://hltb-proxy.fly.dev/steam/games".to_string()
}

/// Config view for API responses (user agent left out)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: SanitizedStoreConfig,
    pub scrape: ScrapeConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStoreConfig {
    pub base_url: String,
    pub language: String,
    pub timeout_secs: u64,
    pub custom_user_agent: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            store: SanitizedStoreConfig {
                base_url: config.store.base_url.clone(),
                language: config.store.language.clone(),
                timeout_secs: config.store.timeout_secs,
                custom_user_agent: config.store.user_agent.is_some(),
            },
            scrape: config.scrape.clone(),
            sources: config.sources.clone(),
        }
    }
}
