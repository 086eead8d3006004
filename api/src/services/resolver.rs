//! Collection image resolution: marketplace API, then og:image, then placeholder
//!
//! Resolution never fails once the input has been validated into a
//! [`CollectionRef`]. Every upstream problem is logged and degrades to the next
//! step; when all steps miss the caller gets a `ResolvedImage` with no image.

use crate::domain::collection::{CollectionRef, Platform, ResolvedImage};

use super::objkt::ObjktClient;
use super::og_image::{fetch_og_image, is_allowed_page};
use super::opensea::OpenSeaClient;
use super::upstream::{Upstream, UpstreamError};

/// Image and optional display name found by a marketplace API
struct ApiHit {
    image_url: String,
    name: Option<String>,
}

#[derive(Clone)]
pub struct CollectionResolver {
    opensea: OpenSeaClient,
    objkt: ObjktClient,
    pages: Upstream,
    page_hosts: Vec<String>,
}

impl CollectionResolver {
    pub fn new(
        opensea: OpenSeaClient,
        objkt: ObjktClient,
        pages: Upstream,
        page_hosts: Vec<String>,
    ) -> Self {
        Self {
            opensea,
            objkt,
            pages,
            page_hosts,
        }
    }

    pub async fn resolve(&self, collection: &CollectionRef) -> ResolvedImage {
        if let Some(hit) = self.from_api(collection).await {
            return ResolvedImage::found(collection, hit.image_url, hit.name);
        }

        if !is_allowed_page(&collection.url, &self.page_hosts) {
            tracing::warn!(url = %collection.url, "collection page host not allowed, skipping og:image");
            return ResolvedImage::placeholder(collection);
        }

        match fetch_og_image(&self.pages, &collection.url).await {
            Ok(Some(image_url)) => {
                tracing::debug!(url = %collection.url, "resolved collection image from og:image");
                return ResolvedImage::found(collection, image_url, None);
            }
            Ok(None) => {
                tracing::warn!(url = %collection.url, "collection page has no og:image");
            }
            Err(e) => {
                tracing::warn!(url = %collection.url, error = %e, "collection page fetch failed");
            }
        }

        ResolvedImage::placeholder(collection)
    }

    async fn from_api(&self, collection: &CollectionRef) -> Option<ApiHit> {
        let platform = collection.platform.label();
        let hit = match collection.platform {
            Platform::OpenSea => self.from_opensea(&collection.key).await,
            Platform::Objkt => self.from_objkt(&collection.key).await,
        };

        match hit {
            Ok(Some(hit)) => Some(hit),
            Ok(None) => {
                tracing::info!(platform, key = %collection.key, "API returned no image, trying og:image fallback");
                None
            }
            Err(e) => {
                tracing::warn!(platform, key = %collection.key, error = %e, "API not available, trying og:image fallback");
                None
            }
        }
    }

    async fn from_opensea(&self, slug: &str) -> Result<Option<ApiHit>, UpstreamError> {
        let collection = self.opensea.fetch_collection(slug).await?;
        Ok(collection.image().map(|image_url| ApiHit {
            image_url: image_url.to_string(),
            name: collection.name.clone().filter(|n| !n.is_empty()),
        }))
    }

    async fn from_objkt(&self, contract: &str) -> Result<Option<ApiHit>, UpstreamError> {
        let tokens = self.objkt.fetch_tokens(contract, 1).await?;
        Ok(tokens.into_iter().next().and_then(|token| {
            let image_url = token.preview_image(self.objkt.ipfs_gateway())?;
            Some(ApiHit {
                image_url,
                name: token.name.filter(|n| !n.is_empty()),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::constants::DEFAULT_IPFS_GATEWAY;
    use crate::services::rate_limit::{RateLimitConfig, UpstreamRateLimiter};
    use crate::services::upstream::test_support::upstream;
    use mockito::Matcher;
    use std::sync::Arc;
    use std::time::Duration;

    fn local_hosts() -> Vec<String> {
        vec!["127.0.0.1".to_string()]
    }

    /// Resolver whose marketplace APIs go through `api` and whose pages live on `server`
    fn resolver_with(server: &mockito::ServerGuard, api: Upstream) -> CollectionResolver {
        let base = server.url();
        CollectionResolver::new(
            OpenSeaClient::new(api.clone(), &format!("{}/opensea/api/v2", base), None),
            ObjktClient::new(api, &format!("{}/objkt/v3", base), DEFAULT_IPFS_GATEWAY),
            upstream(0),
            local_hosts(),
        )
    }

    fn resolver(server: &mockito::ServerGuard) -> CollectionResolver {
        resolver_with(server, upstream(0))
    }

    /// A collection URL served by the mock server whose path still carries the
    /// marketplace host, so detection and key extraction behave as in production.
    fn collection_on(server: &mockito::ServerGuard, path: &str) -> CollectionRef {
        CollectionRef::parse(Some(&format!("{}/{}", server.url(), path))).unwrap()
    }

    #[tokio::test]
    async fn test_opensea_api_hit() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", "/opensea/api/v2/collections/cosmic-hub")
            .with_status(200)
            .with_body(r#"{"name":"Cosmic Hub","image_url":"https://i.seadn.io/hub.png"}"#)
            .create_async()
            .await;

        let collection = collection_on(&server, "opensea.io/collection/cosmic-hub");
        let resolved = resolver(&server).resolve(&collection).await;

        assert!(resolved.success);
        assert_eq!(resolved.image_url.as_deref(), Some("https://i.seadn.io/hub.png"));
        assert_eq!(resolved.collection_name.as_deref(), Some("Cosmic Hub"));
        assert_eq!(resolved.collection_url, collection.url);
    }

    #[tokio::test]
    async fn test_api_500_falls_back_to_og_image() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", "/opensea/api/v2/collections/cosmic-hub")
            .with_status(500)
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/opensea.io/collection/cosmic-hub")
            .with_status(200)
            .with_body(r#"<head><meta property="og:image" content="https://cdn.example/og.png"></head>"#)
            .create_async()
            .await;

        let collection = collection_on(&server, "opensea.io/collection/cosmic-hub");
        let resolved = resolver(&server).resolve(&collection).await;

        assert!(resolved.success);
        assert_eq!(resolved.image_url.as_deref(), Some("https://cdn.example/og.png"));
        assert_eq!(resolved.collection_name.as_deref(), Some("cosmic-hub"));
    }

    #[tokio::test]
    async fn test_everything_failing_yields_null_image() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", Matcher::Regex("^/objkt/v3/tokens".to_string()))
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/objkt.com/collections/KT1abc123")
            .with_status(404)
            .create_async()
            .await;

        let collection = collection_on(&server, "objkt.com/collections/KT1abc123");
        let resolved = resolver(&server).resolve(&collection).await;

        assert!(resolved.success);
        assert_eq!(resolved.image_url, None);
        assert_eq!(resolved.collection_name.as_deref(), Some("KT1abc123"));
    }

    #[tokio::test]
    async fn test_objkt_first_token_image_rewritten() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", Matcher::Regex("^/objkt/v3/tokens".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("contract".into(), "KT1abc123".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"token_id":"1","name":"Orbit #1","display_uri":"ipfs://QmOrbit"}]"#)
            .create_async()
            .await;

        let collection = collection_on(&server, "objkt.com/collections/KT1abc123");
        let resolved = resolver(&server).resolve(&collection).await;

        assert_eq!(resolved.image_url.as_deref(), Some("https://ipfs.io/ipfs/QmOrbit"));
        assert_eq!(resolved.collection_name.as_deref(), Some("Orbit #1"));
    }

    #[tokio::test]
    async fn test_api_without_image_uses_page() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", Matcher::Regex("^/objkt/v3/tokens".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"tokens":[]}"#)
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/objkt.com/collections/KT1abc123")
            .with_status(200)
            .with_body(r#"<meta content="https://assets.objkt.media/cover.jpg" property="og:image">"#)
            .create_async()
            .await;

        let collection = collection_on(&server, "objkt.com/collections/KT1abc123");
        let resolved = resolver(&server).resolve(&collection).await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://assets.objkt.media/cover.jpg")
        );
    }

    #[tokio::test]
    async fn test_slow_api_times_out_and_uses_page() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", "/opensea/api/v2/collections/cosmic-hub")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1500));
                std::io::Write::write_all(w, br#"{"image_url":"https://i.seadn.io/late.png"}"#)
            })
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/opensea.io/collection/cosmic-hub")
            .with_status(200)
            .with_body(r#"<meta property="og:image" content="https://cdn.example/og.png">"#)
            .create_async()
            .await;

        let slow_api = Upstream::new(
            UpstreamConfig {
                timeout: Duration::from_millis(200),
                max_retries: 0,
                retry_base_delay: Duration::ZERO,
            },
            Arc::new(UpstreamRateLimiter::default()),
        )
        .unwrap();

        let collection = collection_on(&server, "opensea.io/collection/cosmic-hub");
        let resolved = resolver_with(&server, slow_api).resolve(&collection).await;

        assert_eq!(resolved.image_url.as_deref(), Some("https://cdn.example/og.png"));
    }

    #[tokio::test]
    async fn test_throttled_api_counts_as_miss() {
        let mut server = mockito::Server::new_async().await;
        let api = server
            .mock("GET", "/opensea/api/v2/collections/cosmic-hub")
            .with_status(200)
            .with_body(r#"{"image_url":"https://i.seadn.io/hub.png"}"#)
            .expect(0)
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/opensea.io/collection/cosmic-hub")
            .with_status(200)
            .with_body(r#"<meta property="og:image" content="https://cdn.example/og.png">"#)
            .create_async()
            .await;

        let drained = Upstream::new(
            UpstreamConfig::default(),
            Arc::new(UpstreamRateLimiter::new(RateLimitConfig {
                max_tokens: 0,
                refill_rate: 0.0,
                ..Default::default()
            })),
        )
        .unwrap();

        let collection = collection_on(&server, "opensea.io/collection/cosmic-hub");
        let resolved = resolver_with(&server, drained).resolve(&collection).await;

        assert_eq!(resolved.image_url.as_deref(), Some("https://cdn.example/og.png"));
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_on_foreign_host_is_not_fetched() {
        let mut server = mockito::Server::new_async().await;
        let _api = server
            .mock("GET", "/opensea/api/v2/collections/x")
            .with_status(404)
            .create_async()
            .await;
        let page = server
            .mock("GET", "/opensea.io/collection/x")
            .with_status(200)
            .with_body(r#"<meta property="og:image" content="https://cdn.example/og.png">"#)
            .expect(0)
            .create_async()
            .await;

        let base = server.url();
        let resolver = CollectionResolver::new(
            OpenSeaClient::new(upstream(0), &format!("{}/opensea/api/v2", base), None),
            ObjktClient::new(upstream(0), &format!("{}/objkt/v3", base), DEFAULT_IPFS_GATEWAY),
            upstream(0),
            vec!["opensea.io".to_string(), "objkt.com".to_string()],
        );

        let collection = collection_on(&server, "opensea.io/collection/x");
        let resolved = resolver.resolve(&collection).await;

        assert!(resolved.success);
        assert_eq!(resolved.image_url, None);
        assert_eq!(resolved.collection_name.as_deref(), Some("x"));
        page.assert_async().await;
    }
}
