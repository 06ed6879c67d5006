//! Storefront page fetching.
//!
//! [`StorePageFetcher`] walks redirects by hand (the storefront drops the
//! age-gate cookies on automatic redirects), classifies the final address
//! and sanity-checks the body before handing it to the extractor.

mod client;
mod route;
mod types;

pub use client::{ReqwestTransport, AGE_GATE_COOKIES};
pub use route::{classify_route, is_store_root};
pub use reqwest::Url;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::extract::{is_site_error, looks_like_app_page};
use crate::metrics;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Issues a single GET without following redirects.
#[async_trait]
pub trait StoreTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

pub struct StorePageFetcher {
    transport: Arc<dyn StoreTransport>,
    base_url: Url,
}

impl StorePageFetcher {
    pub fn new(transport: Arc<dyn StoreTransport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Canonical page address for `id` in `language`.
    pub fn app_url(&self, id: u32, language: &str) -> Result<Url, FetchFailure> {
        let url = format!(
            "{}/app/{}/?l={}",
            self.base_url.as_str().trim_end_matches('/'),
            id,
            urlencoding::encode(&language.to_lowercase())
        );
        Url::parse(&url).map_err(|e| FetchFailure::Transport(format!("invalid app URL: {}", e)))
    }

    /// Resolve the page for `id`.
    pub async fn fetch(&self, id: u32, language: &str) -> Result<StorePage, FetchFailure> {
        let started = Instant::now();
        let result = self.resolve(id, language).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(failure) => failure.reason(),
        };
        metrics::STORE_FETCHES.with_label_values(&[label]).inc();
        metrics::STORE_FETCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn resolve(&self, id: u32, language: &str) -> Result<StorePage, FetchFailure> {
        let start = self.app_url(id, language)?;
        debug!(app_id = id, url = %start, "Fetching store page");

        let mut response = self.transport.get(&start).await?;
        let mut hops = 0;

        while let Some(location) = response.redirect_location() {
            if hops == MAX_REDIRECTS {
                return Err(FetchFailure::TooManyRedirects);
            }

            let target = response
                .url
                .join(location)
                .map_err(|_| FetchFailure::UnknownRedirectTarget(location.to_string()))?;

            if is_store_root(&target, &self.base_url) {
                return Err(FetchFailure::RedirectedToRoot);
            }
            if target == response.url {
                return Err(FetchFailure::SelfRedirectLoop);
            }

            debug!(app_id = id, hop = hops + 1, target = %target, "Following redirect");
            metrics::STORE_REDIRECTS.inc();
            response = self.transport.get(&target).await?;
            hops += 1;
        }

        if !response.is_success() {
            return Err(FetchFailure::Transport(format!(
                "HTTP {} from {}",
                response.status, response.url
            )));
        }

        let alias_id = classify_route(&response.url, id)?;

        if response.body.trim().is_empty() {
            return Err(FetchFailure::EmptyBody);
        }
        if is_site_error(&response.body) {
            return Err(FetchFailure::SiteError);
        }
        if !looks_like_app_page(&response.body) {
            return Err(FetchFailure::UnrecognizedPage);
        }

        if let Some(alias) = alias_id {
            debug!(app_id = id, alias_id = alias, "Store page belongs to another id");
        }

        Ok(StorePage {
            requested_id: id,
            alias_id,
            final_url: response.url,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::StorePageBuilder;
    use crate::testing::MockStoreTransport;

    const BASE: &str = "https://store.example.com";

    fn fetcher(transport: &Arc<MockStoreTransport>) -> StorePageFetcher {
        StorePageFetcher::new(transport.clone(), Url::parse(BASE).unwrap())
    }

    fn app(id: u32) -> String {
        format!("{}/app/{}/?l=english", BASE, id)
    }

    #[tokio::test]
    async fn test_direct_page() {
        let transport = Arc::new(MockStoreTransport::new());
        let body = StorePageBuilder::game("Portal").build();
        transport.respond_ok(&app(400), &body).await;

        let page = fetcher(&transport).fetch(400, "english").await.unwrap();
        assert_eq!(page.requested_id, 400);
        assert_eq!(page.alias_id, None);
        assert_eq!(page.body, body);
        assert_eq!(transport.requests().await, vec![app(400)]);
    }

    #[tokio::test]
    async fn test_language_lowercased_in_url() {
        let transport = Arc::new(MockStoreTransport::new());
        transport
            .respond_ok(&format!("{}/app/1/?l=german", BASE), &StorePageBuilder::game("X").build())
            .await;

        assert!(fetcher(&transport).fetch(1, "German").await.is_ok());
    }

    #[tokio::test]
    async fn test_redirect_to_root_on_first_hop() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_redirect(&app(400), "/").await;

        let result = fetcher(&transport).fetch(400, "english").await;
        assert_eq!(result, Err(FetchFailure::RedirectedToRoot));
        assert_eq!(transport.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_self_redirect() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_redirect(&app(7), &app(7)).await;

        let result = fetcher(&transport).fetch(7, "english").await;
        assert_eq!(result, Err(FetchFailure::SelfRedirectLoop));
    }

    async fn chain(transport: &MockStoreTransport, id: u32, hops: usize) {
        let mut current = app(id);
        for hop in 1..=hops {
            let next = format!("{}/app/{}/?l=english&hop={}", BASE, id, hop);
            transport.respond_redirect(&current, &next).await;
            current = next;
        }
        transport
            .respond_ok(&current, &StorePageBuilder::game("Chained").build())
            .await;
    }

    #[tokio::test]
    async fn test_five_redirects_accepted() {
        let transport = Arc::new(MockStoreTransport::new());
        chain(&transport, 10, 5).await;

        let page = fetcher(&transport).fetch(10, "english").await.unwrap();
        assert_eq!(page.alias_id, None);
        assert_eq!(transport.request_count().await, 6);
    }

    #[tokio::test]
    async fn test_six_redirects_rejected() {
        let transport = Arc::new(MockStoreTransport::new());
        chain(&transport, 10, 6).await;

        let result = fetcher(&transport).fetch(10, "english").await;
        assert_eq!(result, Err(FetchFailure::TooManyRedirects));
    }

    #[tokio::test]
    async fn test_redirect_to_other_id_records_alias() {
        let transport = Arc::new(MockStoreTransport::new());
        transport
            .respond_redirect(&app(219), "/app/220/Half_Life_2/")
            .await;
        transport
            .respond_ok(
                &format!("{}/app/220/Half_Life_2/", BASE),
                &StorePageBuilder::game("Half-Life 2").build(),
            )
            .await;

        let page = fetcher(&transport).fetch(219, "english").await.unwrap();
        assert_eq!(page.requested_id, 219);
        assert_eq!(page.alias_id, Some(220));
    }

    #[tokio::test]
    async fn test_missing_id_segment() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_redirect(&app(400), "/app/").await;
        transport
            .respond_ok(&format!("{}/app/", BASE), &StorePageBuilder::game("X").build())
            .await;

        let result = fetcher(&transport).fetch(400, "english").await;
        assert_eq!(result, Err(FetchFailure::MissingIdSegment));
    }

    #[tokio::test]
    async fn test_age_gate_without_redirect() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_redirect(&app(500), "/agecheck/app/500/").await;
        transport
            .respond_ok(&format!("{}/agecheck/app/500/", BASE), "<html>age check</html>")
            .await;

        let result = fetcher(&transport).fetch(500, "english").await;
        assert_eq!(result, Err(FetchFailure::AgeGateNoRedirect));
    }

    #[tokio::test]
    async fn test_outside_item_route() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_redirect(&app(600), "/sub/600/").await;
        transport
            .respond_ok(&format!("{}/sub/600/", BASE), "<html>bundle</html>")
            .await;

        let result = fetcher(&transport).fetch(600, "english").await;
        assert!(matches!(result, Err(FetchFailure::OutsideItemRoute { .. })));
    }

    #[tokio::test]
    async fn test_body_checks() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_ok(&app(1), "   ").await;
        transport
            .respond_ok(&app(2), "<html><title>Site Error</title></html>")
            .await;
        transport.respond_ok(&app(3), "<html>hardware page</html>").await;

        let fetcher = fetcher(&transport);
        assert_eq!(fetcher.fetch(1, "english").await, Err(FetchFailure::EmptyBody));
        assert_eq!(fetcher.fetch(2, "english").await, Err(FetchFailure::SiteError));
        assert_eq!(
            fetcher.fetch(3, "english").await,
            Err(FetchFailure::UnrecognizedPage)
        );
    }

    #[tokio::test]
    async fn test_transport_errors_normalized() {
        let transport = Arc::new(MockStoreTransport::new());
        transport.respond_error(&app(9), "connection reset").await;
        transport.respond_status(&app(10), 503).await;

        let fetcher = fetcher(&transport);
        assert_eq!(
            fetcher.fetch(9, "english").await,
            Err(FetchFailure::Transport("connection reset".to_string()))
        );
        assert!(matches!(
            fetcher.fetch(10, "english").await,
            Err(FetchFailure::Transport(_))
        ));
        // Unscripted address
        assert!(matches!(
            fetcher.fetch(11, "english").await,
            Err(FetchFailure::Transport(_))
        ));
    }
}
