pub mod collection;
pub mod ipfs;
pub mod links;
pub mod nft;
