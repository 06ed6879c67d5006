use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Store base URL is an absolute http(s) URL
/// - Store language is set
/// - Scrape pool has at least one worker
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    match Url::parse(&config.store.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => {
            return Err(ConfigError::ValidationError(format!(
                "store.base_url must use http or https, got '{}'",
                url.scheme()
            )))
        }
        Err(e) => {
            return Err(ConfigError::ValidationError(format!(
                "store.base_url is not a valid URL: {}",
                e
            )))
        }
    }

    if config.store.language.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "store.language cannot be empty".to_string(),
        ));
    }

    if config.scrape.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "scrape.max_workers must be at least 1".to_string(),
        ));
    }

    Ok(())
}
