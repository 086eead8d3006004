//! Objkt token payloads and the listing projection served to the site

use serde::{Deserialize, Deserializer, Serialize};

use super::ipfs;

/// Objkt answers with either a bare array or `{ "tokens": [...] }`.
/// Anything else decodes as `Unrecognized` and yields no tokens. Elements are
/// decoded one by one so a malformed entry only drops itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ObjktTokensResponse {
    List(Vec<serde_json::Value>),
    Wrapped {
        #[serde(default)]
        tokens: Vec<serde_json::Value>,
    },
    Unrecognized(serde_json::Value),
}

impl ObjktTokensResponse {
    pub fn into_tokens(self) -> Vec<ObjktToken> {
        let elements = match self {
            ObjktTokensResponse::List(tokens) | ObjktTokensResponse::Wrapped { tokens } => tokens,
            ObjktTokensResponse::Unrecognized(_) => {
                tracing::warn!("unrecognized Objkt tokens payload");
                return Vec::new();
            }
        };

        let total = elements.len();
        let tokens: Vec<ObjktToken> = elements
            .into_iter()
            .filter_map(|element| serde_json::from_value(element).ok())
            .collect();

        if tokens.len() < total {
            tracing::debug!(skipped = total - tokens.len(), "dropped malformed Objkt tokens");
        }
        tokens
    }
}

/// The subset of an Objkt token we read. Fields of an unexpected type decode as `None`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ObjktToken {
    #[serde(default, deserialize_with = "lenient_id")]
    pub token_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

impl ObjktToken {
    /// Best preview image: display, then thumbnail, then image_url.
    pub fn preview_image(&self, gateway: &str) -> Option<String> {
        [&self.display_uri, &self.thumbnail_uri, &self.image_url]
            .into_iter()
            .flatten()
            .find(|uri| !uri.is_empty())
            .map(|uri| ipfs::to_gateway_url(uri, gateway))
    }

    /// Project into the listing shape. Tokens without a usable display URI are skipped.
    pub fn into_listing(self, index: usize, contract: &str, gateway: &str) -> Option<NftToken> {
        let display_uri = self
            .display_uri
            .filter(|uri| uri.starts_with("http") || ipfs::is_ipfs(uri))?;

        let token_id = self.token_id.unwrap_or_default();
        let id_part = if token_id.is_empty() {
            index.to_string()
        } else {
            token_id.clone()
        };
        let contract = self.contract.as_deref().unwrap_or(contract);

        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.title.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| format!("Token #{}", token_id));

        let image_url = ipfs::to_gateway_url(&display_uri, gateway);
        let thumbnail_url = self
            .thumbnail_uri
            .filter(|uri| !uri.is_empty())
            .map(|uri| ipfs::to_gateway_url(&uri, gateway))
            .unwrap_or_else(|| image_url.clone());

        Some(NftToken {
            id: format!("{}-{}", id_part, contract),
            token_id,
            name,
            image_url,
            thumbnail_url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftToken {
    pub id: String,
    pub token_id: String,
    pub name: String,
    pub image_url: String,
    pub thumbnail_url: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Token ids arrive as strings or numbers depending on the endpoint.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
