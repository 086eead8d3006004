//! Marketplace collection endpoints (/api/opensea-collection, /api/nft-collection)

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::collection::{CollectionRef, ResolvedImage};
use crate::domain::nft::NftToken;
use crate::services::error::{ApiError, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/opensea-collection", get(resolve_collection))
        .route("/nft-collection", get(list_nft_collection))
}

#[derive(Deserialize)]
struct CollectionQuery {
    url: Option<String>,
}

/// GET /api/opensea-collection?url=... - Representative image for an OpenSea or Objkt collection
async fn resolve_collection(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CollectionQuery>, QueryRejection>,
) -> Result<Json<ResolvedImage>, ApiError> {
    let raw = query.ok().and_then(|Query(q)| q.url);
    let collection = CollectionRef::parse(raw.as_deref())?;

    tracing::debug!(
        platform = collection.platform.label(),
        key = %collection.key,
        raw = %collection.raw,
        "resolving collection image"
    );

    Ok(Json(state.resolver.resolve(&collection).await))
}

#[derive(Serialize)]
struct NftListingResponse {
    success: bool,
    count: usize,
    tokens: Vec<NftToken>,
}

/// GET /api/nft-collection - Tokens of the configured Objkt contract
async fn list_nft_collection(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NftListingResponse>, ApiError> {
    let tokens = state
        .objkt
        .list_collection(&state.nft_contract)
        .await
        .log_500("Error fetching NFT collection")?;

    Ok(Json(NftListingResponse {
        success: true,
        count: tokens.len(),
        tokens,
    }))
}
