/// Cache configuration per entity type
///
/// - Mint facts: long TTL (decimals never change)
/// - Token metadata: medium TTL (names and images change rarely)
use crate::config::CacheSettings;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries (LRU eviction when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    pub fn mint_facts(settings: &CacheSettings) -> Self {
        Self::custom(settings.mint_ttl_secs, settings.mint_capacity)
    }

    pub fn token_metadata(settings: &CacheSettings) -> Self {
        Self::custom(settings.metadata_ttl_secs, settings.metadata_capacity)
    }

    /// Custom configuration
    pub fn custom(ttl_secs: u64, capacity: usize) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_secs), capacity)
    }

    pub fn with_ttl(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
        }
    }
}
