//! `ipfs://` URI rewriting

const IPFS_SCHEME: &str = "ipfs://";

/// Rewrite `ipfs://<hash>` to `<gateway><hash>`. Other URIs pass through untouched.
pub fn to_gateway_url(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix(IPFS_SCHEME) {
        Some(hash) => {
            let gateway = gateway.trim_end_matches('/');
            format!("{}/{}", gateway, hash)
        }
        None => uri.to_string(),
    }
}

pub fn is_ipfs(uri: &str) -> bool {
    uri.starts_with(IPFS_SCHEME)
}
