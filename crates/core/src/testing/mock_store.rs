//! Mock storefront transport for testing.

use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::store_page::{RawResponse, StoreTransport, TransportError};

#[derive(Debug, Clone)]
enum Scripted {
    Response { status: u16, location: Option<String>, body: String },
    Error(String),
}

/// Mock implementation of the StoreTransport trait.
///
/// Provides controllable behavior for testing:
/// - Script a response per exact URL (page, redirect, status or error)
/// - Track requested URLs for assertions
/// - Delay every response to exercise cancellation
///
/// Unscripted URLs fail with a transport error.
///
/// # Example
///
/// ```rust,ignore
/// use appcatalog_core::testing::{MockStoreTransport, fixtures::StorePageBuilder};
///
/// let transport = MockStoreTransport::new();
/// transport.respond_ok("https://store.example.com/app/10/?l=english",
///     &StorePageBuilder::game("Counter-Strike").build()).await;
/// ```
#[derive(Debug)]
pub struct MockStoreTransport {
    responses: Arc<RwLock<HashMap<String, Scripted>>>,
    requests: Arc<RwLock<Vec<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockStoreTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStoreTransport {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Answer `url` with a 200 and `body`.
    pub async fn respond_ok(&self, url: &str, body: &str) {
        self.script(
            url,
            Scripted::Response {
                status: 200,
                location: None,
                body: body.to_string(),
            },
        )
        .await;
    }

    /// Answer `url` with a 302 to `location` (absolute or relative).
    pub async fn respond_redirect(&self, url: &str, location: &str) {
        self.script(
            url,
            Scripted::Response {
                status: 302,
                location: Some(location.to_string()),
                body: String::new(),
            },
        )
        .await;
    }

    /// Answer `url` with a bare status code.
    pub async fn respond_status(&self, url: &str, status: u16) {
        self.script(
            url,
            Scripted::Response {
                status,
                location: None,
                body: String::new(),
            },
        )
        .await;
    }

    /// Fail requests to `url` at the network level.
    pub async fn respond_error(&self, url: &str, message: &str) {
        self.script(url, Scripted::Error(message.to_string())).await;
    }

    /// Sleep before answering every request.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn script(&self, url: &str, scripted: Scripted) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), scripted);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// URLs requested so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl StoreTransport for MockStoreTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        self.requests.write().await.push(url.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.read().await.get(url.as_str()).cloned();
        match scripted {
            Some(Scripted::Response {
                status,
                location,
                body,
            }) => Ok(RawResponse {
                url: url.clone(),
                status,
                location,
                body,
            }),
            Some(Scripted::Error(message)) => Err(TransportError(message)),
            None => Err(TransportError(format!("no response scripted for {}", url))),
        }
    }
}
