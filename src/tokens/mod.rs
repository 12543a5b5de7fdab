//! Token descriptive data
//!
//! Mint facts (decimals, supply, authorities) come from the ledger node via
//! `rpc`; this module covers the optional display metadata from a DAS index.

pub mod metadata;

pub use metadata::{DasMetadataClient, MetadataSource, NoMetadata, TokenMetadata};
