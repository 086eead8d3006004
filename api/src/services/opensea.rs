//! OpenSea API v2 collections client

use percent_encoding::utf8_percent_encode;
use serde::Deserialize;

use super::upstream::{PATH_SEGMENT, Upstream, UpstreamError};

/// `GET /collections/{slug}` body. Both spellings of the image field have been observed.
#[derive(Debug, Default, Deserialize)]
pub struct OpenSeaCollection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, rename = "imageUrl")]
    image_url_camel: Option<String>,
}

impl OpenSeaCollection {
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .or(self.image_url_camel.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Clone)]
pub struct OpenSeaClient {
    upstream: Upstream,
    api_base: String,
    api_key: Option<String>,
}

impl OpenSeaClient {
    pub fn new(upstream: Upstream, api_base: &str, api_key: Option<String>) -> Self {
        Self {
            upstream,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn fetch_collection(&self, slug: &str) -> Result<OpenSeaCollection, UpstreamError> {
        let url = format!(
            "{}/collections/{}",
            self.api_base,
            utf8_percent_encode(slug, PATH_SEGMENT)
        );

        let mut headers = vec![("accept", "application/json")];
        if let Some(key) = &self.api_key {
            headers.push(("x-api-key", key.as_str()));
        }

        let resp = self.upstream.get(&url, &headers).await?;
        Ok(resp.json().await?)
    }
}
