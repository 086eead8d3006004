//! Collection references - URL normalization, platform detection and key extraction

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static OPENSEA_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)opensea\.io/collection/([a-z0-9\-]+)").expect("valid OpenSea slug regex")
});

static OBJKT_CONTRACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)objkt\.com/collections/([a-z0-9]+)").expect("valid Objkt contract regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing or invalid 'url' query parameter")]
    MissingUrl,
    #[error("URL must be from OpenSea (opensea.io) or Objkt (objkt.com)")]
    UnsupportedPlatform,
    #[error("Invalid OpenSea collection URL format")]
    InvalidOpenSeaUrl,
    #[error("Invalid Objkt collection URL format")]
    InvalidObjktUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    OpenSea,
    Objkt,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Platform::OpenSea => "opensea",
            Platform::Objkt => "objkt",
        }
    }
}

/// Prepend `https://` unless the input already carries an http(s) scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub fn detect_platform(url: &str) -> Option<Platform> {
    if url.contains("opensea.io") {
        Some(Platform::OpenSea)
    } else if url.contains("objkt.com") {
        Some(Platform::Objkt)
    } else {
        None
    }
}

/// Collection slug (OpenSea) or contract address (Objkt) embedded in `url`.
pub fn extract_key(platform: Platform, url: &str) -> Option<String> {
    let pattern = match platform {
        Platform::OpenSea => &*OPENSEA_SLUG,
        Platform::Objkt => &*OBJKT_CONTRACT,
    };
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A validated, user-supplied marketplace collection URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub raw: String,
    pub url: String,
    pub platform: Platform,
    pub key: String,
}

impl CollectionRef {
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        let raw = raw
            .filter(|value| !value.trim().is_empty())
            .ok_or(ValidationError::MissingUrl)?;

        let url = normalize_url(raw);
        let platform = detect_platform(&url).ok_or(ValidationError::UnsupportedPlatform)?;
        let key = extract_key(platform, &url).ok_or(match platform {
            Platform::OpenSea => ValidationError::InvalidOpenSeaUrl,
            Platform::Objkt => ValidationError::InvalidObjktUrl,
        })?;

        Ok(Self {
            raw: raw.to_string(),
            url,
            platform,
            key,
        })
    }
}

/// Outcome of a resolution. Never an error: a miss is a `None` image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    pub success: bool,
    pub image_url: Option<String>,
    pub collection_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl ResolvedImage {
    pub fn found(collection: &CollectionRef, image_url: String, name: Option<String>) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            collection_url: collection.url.clone(),
            collection_name: Some(name.unwrap_or_else(|| collection.key.clone())),
        }
    }

    pub fn placeholder(collection: &CollectionRef) -> Self {
        Self {
            success: true,
            image_url: None,
            collection_url: collection.url.clone(),
            collection_name: Some(collection.key.clone()),
        }
    }
}
