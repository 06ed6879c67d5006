//! HTTP access to the configured feeds.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SourcesConfig;

use super::{parse_app_list, parse_playtimes, AppListItem, PlaytimeRecord, SourceError};

const DEFAULT_USER_AGENT: &str = concat!("appcatalog/", env!("CARGO_PKG_VERSION"));

pub struct SourceClient {
    client: Client,
    app_list_url: String,
    playtime_url: String,
}

impl SourceClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            app_list_url: config.app_list_url.clone(),
            playtime_url: config.playtime_url.clone(),
        })
    }

    pub async fn fetch_app_list(&self) -> Result<Vec<AppListItem>, SourceError> {
        let body = self.get_text(&self.app_list_url).await?;
        let items = parse_app_list(&body)?;
        info!(count = items.len(), "Fetched app list");
        Ok(items)
    }

    pub async fn fetch_playtimes(&self) -> Result<Vec<PlaytimeRecord>, SourceError> {
        let body = self.get_text(&self.playtime_url).await?;
        let records = parse_playtimes(&body)?;
        info!(count = records.len(), "Fetched playtime feed");
        Ok(records)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        debug!(url, "Fetching feed");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
