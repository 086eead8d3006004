//! GitHub contents API - read and conditionally write a single repository file

use base64::Engine;
use percent_encoding::utf8_percent_encode;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::upstream::{PATH_SEGMENT, Upstream, UpstreamError};
use crate::config::GitHubConfig;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("GITHUB_TOKEN environment variable is not set")]
    MissingToken,
    #[error("file revision is stale, the file changed since it was read")]
    Conflict,
    #[error("GitHub API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("could not decode file content: {0}")]
    Decode(String),
}

/// A file's bytes plus the blob sha needed to update it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevision {
    pub content: Vec<u8>,
    pub sha: String,
}

/// `GET /contents/{path}` answers with a file object, or an array for directories.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    File { content: String, sha: String },
    Other(serde_json::Value),
}

#[derive(Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Clone)]
pub struct GitHubContents {
    upstream: Upstream,
    config: GitHubConfig,
}

impl GitHubContents {
    pub fn new(upstream: Upstream, config: GitHubConfig) -> Self {
        Self { upstream, config }
    }

    fn file_url(&self) -> String {
        let path = self
            .config
            .links_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.repo.owner,
            self.config.repo.repo,
            path
        )
    }

    fn authorization(&self) -> Option<String> {
        self.config
            .token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }

    /// Current revision of the file, `None` when it does not exist yet.
    pub async fn get_file(&self) -> Result<Option<FileRevision>, GitHubError> {
        let url = self.file_url();
        let auth = self.authorization();

        let resp = self
            .upstream
            .execute(&url, |http| {
                let req = http
                    .get(&url)
                    .header("accept", GITHUB_ACCEPT)
                    .header("x-github-api-version", GITHUB_API_VERSION);
                match &auth {
                    Some(value) => req.header("authorization", value),
                    None => req,
                }
            })
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GitHubError::Api { status, body });
        }

        match resp.json::<ContentsResponse>().await.map_err(UpstreamError::from)? {
            ContentsResponse::File { content, sha } => {
                let compact: String = content.split_whitespace().collect();
                let content = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| GitHubError::Decode(e.to_string()))?;
                Ok(Some(FileRevision { content, sha }))
            }
            ContentsResponse::Other(_) => Ok(None),
        }
    }

    /// Create or update the file. With `sha` set the write only succeeds if the
    /// file is still at that revision; otherwise `GitHubError::Conflict`.
    pub async fn put_file(
        &self,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<(), GitHubError> {
        let auth = self.authorization().ok_or(GitHubError::MissingToken)?;
        let url = self.file_url();
        let body = PutFileRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha,
        };

        let resp = self
            .upstream
            .execute(&url, |http| {
                http.put(&url)
                    .header("accept", GITHUB_ACCEPT)
                    .header("x-github-api-version", GITHUB_API_VERSION)
                    .header("authorization", &auth)
                    .json(&body)
            })
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        if is_conflict(status, &body) {
            return Err(GitHubError::Conflict);
        }
        Err(GitHubError::Api { status, body })
    }
}

/// 409 on a stale sha; 422 when a sha was required but missing or wrong.
fn is_conflict(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("sha"))
}
