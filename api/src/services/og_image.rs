//! Open Graph image scraping, the fallback when a marketplace API has nothing

use regex::Regex;
use std::sync::LazyLock;

use super::upstream::{Upstream, UpstreamError};

static OG_IMAGE_PROPERTY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+property=["']og:image["']\s+content=["']([^"']+)["']"#)
        .expect("valid og:image regex")
});

static OG_IMAGE_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+content=["']([^"']+)["']\s+property=["']og:image["']"#)
        .expect("valid og:image regex")
});

/// `content` of the page's `og:image` meta tag, if any.
pub fn extract_og_image(html: &str) -> Option<String> {
    [&*OG_IMAGE_PROPERTY_FIRST, &*OG_IMAGE_CONTENT_FIRST]
        .into_iter()
        .find_map(|pattern| pattern.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().replace("&amp;", "&"))
        .filter(|url| !url.is_empty())
}

/// Whether `page_url` points at one of `allowed` hosts or a subdomain of one.
pub fn is_allowed_page(page_url: &str, allowed: &[String]) -> bool {
    let Some(host) = url::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return false;
    };

    allowed.iter().any(|entry| {
        host == *entry
            || host
                .strip_suffix(entry.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Fetch `page_url` and pull its og:image. `Ok(None)` when the page has no tag.
pub async fn fetch_og_image(
    upstream: &Upstream,
    page_url: &str,
) -> Result<Option<String>, UpstreamError> {
    let resp = upstream.get(page_url, &[("accept", "text/html")]).await?;
    let html = resp.text().await?;
    Ok(extract_og_image(&html))
}
