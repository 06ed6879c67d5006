//! Common test utilities for API testing with a scripted storefront.
//!
//! This module provides a test fixture that creates an in-process server
//! whose store transport is a mock, enabling end-to-end testing of the
//! HTTP surface without network access.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use appcatalog_core::{
    config::{DatabaseConfig, StoreConfig},
    scrape::ScrapeSettings,
    store_page::Url,
    testing::MockStoreTransport,
    Config, Database, Entry, ScrapeRunner, SharedDatabase, StorePageFetcher,
};
use appcatalog_server::state::AppState;

/// Re-export fixtures for test convenience
pub use appcatalog_core::testing::fixtures;

pub const STORE_BASE: &str = "https://store.example.com";

/// Page address the fetcher requests for `id` in english.
pub fn app_url(id: u32) -> String {
    format!("{}/app/{}/?l=english", STORE_BASE, id)
}

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_lookup() {
///     let fixture = TestFixture::new().await;
///     fixture.seed(vec![fixtures::catalog_entry(10, "Ten", AppType::Game, 1)]).await;
///
///     let response = fixture.get("/api/v1/apps/10").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock storefront - script pages and redirects
    pub transport: Arc<MockStoreTransport>,
    /// The collection behind the router
    pub database: SharedDatabase,
    /// Temporary directory for the database file
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with an empty collection.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("catalog.json"),
                save_on_shutdown: false,
            },
            store: StoreConfig {
                base_url: STORE_BASE.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let transport = Arc::new(MockStoreTransport::new());
        let fetcher = StorePageFetcher::new(
            Arc::clone(&transport) as Arc<dyn appcatalog_core::StoreTransport>,
            Url::parse(STORE_BASE).unwrap(),
        );
        let runner = Arc::new(ScrapeRunner::new(
            Arc::new(fetcher),
            Database::default().into_shared(),
            ScrapeSettings { max_workers: 2 },
        ));
        let database = runner.database().clone();

        // No feed client: feed endpoints are driven with posted documents
        let state = Arc::new(AppState::new(config, runner, None));
        let router = appcatalog_server::api::create_router(state);

        Self {
            router,
            transport,
            database,
            temp_dir,
        }
    }

    /// Insert records directly into the collection.
    pub async fn seed(&self, entries: Vec<Entry>) {
        let mut db = self.database.write().await;
        for entry in entries {
            db.upsert(entry);
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
