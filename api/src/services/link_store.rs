//! Link store backed by a JSON document in a GitHub repository

use chrono::Utc;

use super::github::{GitHubContents, GitHubError};
use crate::constants::MAX_LINK_SAVE_ATTEMPTS;
use crate::domain::links::{Link, LinksDocument, format_timestamp};

#[derive(Debug, thiserror::Error)]
pub enum LinkStoreError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error("links document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("links document kept changing, gave up after {0} attempts")]
    Contended(u32),
}

#[derive(Debug, Clone)]
pub struct SavedLink {
    pub link: Link,
    pub links: Vec<Link>,
}

#[derive(Clone)]
pub struct LinkStore {
    github: GitHubContents,
}

impl LinkStore {
    pub fn new(github: GitHubContents) -> Self {
        Self { github }
    }

    /// All saved links. Any failure reads as an empty list.
    pub async fn read_links(&self) -> Vec<Link> {
        match self.load().await {
            Ok((doc, _)) => doc.links,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching links from GitHub");
                Vec::new()
            }
        }
    }

    /// Append `url` stamped with the current time and write the document back.
    /// A stale revision re-reads and re-merges, up to `MAX_LINK_SAVE_ATTEMPTS` writes.
    pub async fn save_link(&self, url: &str) -> Result<SavedLink, LinkStoreError> {
        let link = Link::new(url, Utc::now());

        for attempt in 1..=MAX_LINK_SAVE_ATTEMPTS {
            let (mut doc, sha) = match self.load().await {
                Ok(loaded) => loaded,
                Err(LinkStoreError::GitHub(e)) => {
                    // Written as a fresh document; GitHub refuses it if the file does exist
                    tracing::warn!(error = %e, "could not read links document, writing a new one");
                    (LinksDocument::default(), None)
                }
                Err(e) => return Err(e),
            };

            doc.append(link.clone());
            let body = doc.to_pretty_json()?;
            let message = format!("Update links: {}", format_timestamp(Utc::now()));

            match self
                .github
                .put_file(body.as_bytes(), sha.as_deref(), &message)
                .await
            {
                Ok(()) => {
                    tracing::info!(url, count = doc.links.len(), "saved link");
                    return Ok(SavedLink {
                        link,
                        links: doc.links,
                    });
                }
                Err(GitHubError::Conflict) => {
                    tracing::warn!(attempt, "links document changed underneath us, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LinkStoreError::Contended(MAX_LINK_SAVE_ATTEMPTS))
    }

    async fn load(&self) -> Result<(LinksDocument, Option<String>), LinkStoreError> {
        match self.github.get_file().await? {
            Some(file) => {
                let doc: LinksDocument = serde_json::from_slice(&file.content)?;
                Ok((doc, Some(file.sha)))
            }
            None => Ok((LinksDocument::default(), None)),
        }
    }
}
