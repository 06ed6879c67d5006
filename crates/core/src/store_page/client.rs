//! reqwest-backed transport with age-gate cookies.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;

use super::{RawResponse, StoreTransport, TransportError};

/// Cookies that make age-gated pages render without confirmation.
pub const AGE_GATE_COOKIES: &[(&str, &str)] = &[
    ("birthtime", "-473392799"),
    ("mature_content", "1"),
    ("lastagecheckage", "1-January-1955"),
];

const DEFAULT_USER_AGENT: &str = concat!("appcatalog/", env!("CARGO_PKG_VERSION"));

/// Live storefront transport. Never follows redirects on its own.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &StoreConfig) -> Result<Self, TransportError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| TransportError(format!("invalid store base URL: {}", e)))?;

        let jar = Arc::new(Jar::default());
        for (name, value) in AGE_GATE_COOKIES {
            jar.add_cookie_str(&format!("{}={}; Path=/", name, value), &base);
        }

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_provider(jar)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StoreTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError(format!("request timed out: {}", url))
            } else {
                TransportError(e.to_string())
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if status.is_redirection() {
            String::new()
        } else {
            response
                .text()
                .await
                .map_err(|e| TransportError(format!("failed to read body: {}", e)))?
        };

        Ok(RawResponse {
            url: final_url,
            status: status.as_u16(),
            location,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_default_config() {
        assert!(ReqwestTransport::new(&StoreConfig::default()).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let config = StoreConfig {
            base_url: "::not a url::".to_string(),
            ..StoreConfig::default()
        };
        assert!(ReqwestTransport::new(&config).is_err());
    }
}
