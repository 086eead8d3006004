//! Objkt API v3 tokens client

use percent_encoding::utf8_percent_encode;
use reqwest::StatusCode;

use super::upstream::{PATH_SEGMENT, Upstream, UpstreamError};
use crate::constants::NFT_LISTING_LIMIT;
use crate::domain::nft::{NftToken, ObjktToken, ObjktTokensResponse};

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Objkt API error: {}", .0.as_u16())]
    Status(StatusCode),
    #[error("Failed to fetch NFT collection: {0}")]
    Upstream(UpstreamError),
}

impl From<UpstreamError> for ListingError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, .. } => ListingError::Status(status),
            other => ListingError::Upstream(other),
        }
    }
}

#[derive(Clone)]
pub struct ObjktClient {
    upstream: Upstream,
    api_base: String,
    ipfs_gateway: String,
}

impl ObjktClient {
    pub fn new(upstream: Upstream, api_base: &str, ipfs_gateway: &str) -> Self {
        Self {
            upstream,
            api_base: api_base.trim_end_matches('/').to_string(),
            ipfs_gateway: ipfs_gateway.to_string(),
        }
    }

    pub fn ipfs_gateway(&self) -> &str {
        &self.ipfs_gateway
    }

    /// Tokens minted under `contract`, at most `limit` of them.
    pub async fn fetch_tokens(
        &self,
        contract: &str,
        limit: usize,
    ) -> Result<Vec<ObjktToken>, UpstreamError> {
        let url = format!(
            "{}/tokens?contract={}&limit={}",
            self.api_base,
            utf8_percent_encode(contract, PATH_SEGMENT),
            limit
        );

        let resp = self
            .upstream
            .get(&url, &[("content-type", "application/json")])
            .await?;
        let body: ObjktTokensResponse = resp.json().await?;
        Ok(body.into_tokens())
    }

    /// Full listing of `contract` projected for the site. All-or-nothing.
    pub async fn list_collection(&self, contract: &str) -> Result<Vec<NftToken>, ListingError> {
        let tokens = self.fetch_tokens(contract, NFT_LISTING_LIMIT).await?;

        Ok(tokens
            .into_iter()
            .enumerate()
            .filter_map(|(index, token)| token.into_listing(index, contract, &self.ipfs_gateway))
            .take(NFT_LISTING_LIMIT)
            .collect())
    }
}
