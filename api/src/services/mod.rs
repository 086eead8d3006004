pub mod error;
pub mod github;
pub mod link_store;
pub mod objkt;
pub mod og_image;
pub mod opensea;
pub mod rate_limit;
pub mod resolver;
pub mod upstream;
