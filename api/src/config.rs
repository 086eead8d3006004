//! Runtime configuration read from the process environment
//!
//! Every setting has a default except the GitHub token; without it the link
//! store runs read-only against public repositories and writes fail.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLECTION_PAGE_HOSTS, DEFAULT_GITHUB_API_BASE, DEFAULT_GITHUB_REPO, DEFAULT_IPFS_GATEWAY, DEFAULT_LINKS_PATH,
    DEFAULT_NFT_CONTRACT, DEFAULT_OBJKT_API_BASE, DEFAULT_OPENSEA_API_BASE,
    DEFAULT_UPSTREAM_MAX_RETRIES, DEFAULT_UPSTREAM_RETRY_BASE_MS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("GITHUB_REPO must look like https://github.com/<owner>/<repo>, got {0:?}")]
    InvalidRepo(String),
}

/// Timeout and retry discipline for outbound calls
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            max_retries: DEFAULT_UPSTREAM_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_UPSTREAM_RETRY_BASE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    /// Parse `https://github.com/<owner>/<repo>` (a bare `<owner>/<repo>` is accepted too)
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value
            .trim()
            .trim_start_matches("https://github.com/")
            .trim_start_matches("http://github.com/")
            .trim_end_matches('/')
            .trim_end_matches(".git");

        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(ConfigError::InvalidRepo(value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub repo: RepoCoordinates,
    pub links_path: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ping_message: String,
    pub opensea_api_base: String,
    pub opensea_api_key: Option<String>,
    pub objkt_api_base: String,
    pub ipfs_gateway: String,
    pub nft_contract: String,
    /// Hosts the og:image fallback may fetch from
    pub page_hosts: Vec<String>,
    pub upstream: UpstreamConfig,
    pub github: GitHubConfig,
    pub spa_dist_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let upstream = UpstreamConfig {
            timeout: Duration::from_secs(env_number(
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
            max_retries: env_number("UPSTREAM_MAX_RETRIES", DEFAULT_UPSTREAM_MAX_RETRIES)?,
            retry_base_delay: Duration::from_millis(env_number(
                "UPSTREAM_RETRY_BASE_MS",
                DEFAULT_UPSTREAM_RETRY_BASE_MS,
            )?),
        };

        let github = GitHubConfig {
            api_base: env_or("GITHUB_API_BASE", DEFAULT_GITHUB_API_BASE),
            token: env_opt("GITHUB_TOKEN"),
            repo: RepoCoordinates::parse(&env_or("GITHUB_REPO", DEFAULT_GITHUB_REPO))?,
            links_path: env_or("LINKS_PATH", DEFAULT_LINKS_PATH),
        };

        Ok(Self {
            port: env_number("PORT", 3000)?,
            ping_message: env_or("PING_MESSAGE", "ping"),
            opensea_api_base: env_or("OPENSEA_API_BASE", DEFAULT_OPENSEA_API_BASE),
            opensea_api_key: env_opt("OPENSEA_API_KEY"),
            objkt_api_base: env_or("OBJKT_API_BASE", DEFAULT_OBJKT_API_BASE),
            ipfs_gateway: env_or("IPFS_GATEWAY", DEFAULT_IPFS_GATEWAY),
            nft_contract: env_or("NFT_CONTRACT_ADDRESS", DEFAULT_NFT_CONTRACT),
            page_hosts: host_list(&env_or("COLLECTION_PAGE_HOSTS", DEFAULT_COLLECTION_PAGE_HOSTS)),
            upstream,
            github,
            spa_dist_dir: env_opt("SPA_DIST_DIR").map(PathBuf::from),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|host| host.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

fn env_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env_opt(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
