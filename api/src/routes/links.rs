//! Saved links endpoints (/api/save-link, /api/links)

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::links::Link;
use crate::services::error::{ApiError, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/save-link", post(save_link))
        .route("/links", get(list_links))
}

#[derive(Deserialize)]
struct SaveLinkRequest {
    #[serde(default)]
    url: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SaveLinkResponse {
    success: bool,
    message: &'static str,
    link: Link,
    links: Vec<Link>,
}

/// POST /api/save-link - Append a URL to the links document
async fn save_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveLinkRequest>, JsonRejection>,
) -> Result<Json<SaveLinkResponse>, ApiError> {
    let url = match payload.ok().and_then(|Json(req)| req.url) {
        Some(serde_json::Value::String(url)) if !url.is_empty() => url,
        _ => return Err(ApiError::bad_request("URL is required and must be a string")),
    };

    if url::Url::parse(&url).is_err() {
        return Err(ApiError::bad_request("Invalid URL format"));
    }

    let saved = state.links.save_link(&url).await.log_status(
        "Error saving link to GitHub",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to save link to GitHub",
    )?;

    Ok(Json(SaveLinkResponse {
        success: true,
        message: "Link saved successfully",
        link: saved.link,
        links: saved.links,
    }))
}

#[derive(Serialize)]
struct LinksResponse {
    success: bool,
    links: Vec<Link>,
}

/// GET /api/links - Saved links, newest first
async fn list_links(State(state): State<Arc<AppState>>) -> Json<LinksResponse> {
    Json(LinksResponse {
        success: true,
        links: state.links.read_links().await,
    })
}
