pub mod config;
pub mod database;
pub mod entry;
pub mod extract;
pub mod merge;
pub mod metrics;
pub mod scrape;
pub mod sources;
pub mod store_page;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use database::{
    Database, MergeOutcome, NameCount, PersistError, RankingSort, ScoredName, SharedDatabase,
    TagRankingOptions,
};
pub use entry::{AppType, Entry, Freshness, LanguageSupport, Platforms, PlaytimeEstimates, VrSupport};
pub use extract::{extract, PageData};
pub use merge::merge_into;
pub use scrape::{BatchHandle, BatchRegistry, BatchReport, BatchStatus, IdOutcome, ScrapeRunner};
pub use sources::{AppListItem, CatalogRecord, PlaytimeRecord, SourceClient, SourceError};
pub use store_page::{FetchFailure, ReqwestTransport, StorePage, StorePageFetcher, StoreTransport};
