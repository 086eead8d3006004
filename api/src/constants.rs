//! Application constants

/// User agent sent to every upstream marketplace and page fetch
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; Cosmic-Hub/1.0)";

/// Default OpenSea API v2 base URL
pub const DEFAULT_OPENSEA_API_BASE: &str = "https://api.opensea.io/api/v2";

/// Default Objkt API v3 base URL
pub const DEFAULT_OBJKT_API_BASE: &str = "https://api.objkt.com/v3";

/// Default HTTP gateway used to rewrite `ipfs://` URIs
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Contract listed by `/api/nft-collection` unless overridden
pub const DEFAULT_NFT_CONTRACT: &str = "KT1KS9HczgmgFuqkSSe3AeZsbu7eyH9MeRXZ";

/// Maximum number of tokens returned by the NFT listing
pub const NFT_LISTING_LIMIT: usize = 100;

/// Per-request timeout for upstream calls (seconds)
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 8;

/// Retries after the first attempt for 429/5xx/transport failures
pub const DEFAULT_UPSTREAM_MAX_RETRIES: u32 = 1;

/// First backoff delay; doubles per retry (milliseconds)
pub const DEFAULT_UPSTREAM_RETRY_BASE_MS: u64 = 250;

/// Hosts whose collection pages may be fetched for og:image (subdomains included)
pub const DEFAULT_COLLECTION_PAGE_HOSTS: &str = "opensea.io,objkt.com";

/// Idle time after which an upstream throttle bucket is dropped
pub const RATE_LIMIT_IDLE_SECS: u64 = 600;

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Repository used when GITHUB_REPO is unset
pub const DEFAULT_GITHUB_REPO: &str = "https://github.com/default/repo";

/// Path of the links document inside the repository
pub const DEFAULT_LINKS_PATH: &str = "data/links.json";

/// Attempts at a conditional links write before giving up
pub const MAX_LINK_SAVE_ATTEMPTS: u32 = 3;
