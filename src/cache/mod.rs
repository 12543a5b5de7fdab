//! Memoization of per-mint data shared across scans
//!
//! `MetadataCache` holds mint facts, display metadata and the rent-exempt
//! minimum. Misses are resolved in one batched upstream call per request.
//! Wallet-specific data (token accounts) is never cached here.

mod config;
mod manager;

pub use config::CacheConfig;
pub use manager::{CacheManager, CacheMetrics};

use crate::config::CacheSettings;
use crate::constants::TOKEN_ACCOUNT_SIZE;
use crate::errors::ReclaimResult;
use crate::logger::{self, LogTag};
use crate::rpc::{parse_pubkey, LedgerRpc, MintFact};
use crate::tokens::{MetadataSource, TokenMetadata};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

pub struct MetadataCache {
    mints: CacheManager<String, MintFact>,
    // `None` records a mint the index does not know
    metadata: CacheManager<String, Option<TokenMetadata>>,
    rent_minimum: Mutex<Option<(u64, Instant)>>,
    rent_ttl: Duration,
}

impl MetadataCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            mints: CacheManager::new(CacheConfig::mint_facts(settings)),
            metadata: CacheManager::new(CacheConfig::token_metadata(settings)),
            rent_minimum: Mutex::new(None),
            rent_ttl: Duration::from_secs(settings.rent_ttl_secs),
        }
    }

    /// Mint facts for every resolvable mint; unknown mints are absent
    pub async fn mint_facts(
        &self,
        rpc: &dyn LedgerRpc,
        mints: &[String],
    ) -> ReclaimResult<HashMap<String, MintFact>> {
        let mut found = HashMap::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for mint in mints {
            if !seen.insert(mint.as_str()) {
                continue;
            }
            match self.mints.get(mint) {
                Some(fact) => {
                    found.insert(mint.clone(), fact);
                }
                None => match parse_pubkey(mint) {
                    Ok(key) => missing.push(key),
                    Err(_) => logger::debug(LogTag::Cache, &format!("Unparsable mint {}", mint)),
                },
            }
        }

        if !missing.is_empty() {
            logger::debug(
                LogTag::Cache,
                &format!("Mint facts: {} cached, fetching {}", found.len(), missing.len()),
            );
            let fetched = rpc.get_mint_facts(&missing).await?;
            for fact in fetched.into_iter().flatten() {
                self.mints.insert(fact.address.clone(), fact.clone());
                found.insert(fact.address.clone(), fact);
            }
        }

        Ok(found)
    }

    pub async fn mint_fact(&self, rpc: &dyn LedgerRpc, mint: &str) -> ReclaimResult<Option<MintFact>> {
        let mut facts = self.mint_facts(rpc, &[mint.to_string()]).await?;
        Ok(facts.remove(mint))
    }

    /// Rent-exempt minimum for a token account, fetched once per TTL
    pub async fn rent_minimum(&self, rpc: &dyn LedgerRpc) -> ReclaimResult<u64> {
        let cached = *self.rent_minimum.lock();
        if let Some((lamports, fetched_at)) = cached {
            if fetched_at.elapsed() <= self.rent_ttl {
                return Ok(lamports);
            }
        }

        let lamports = rpc
            .get_minimum_balance_for_rent_exemption(TOKEN_ACCOUNT_SIZE)
            .await?;
        *self.rent_minimum.lock() = Some((lamports, Instant::now()));
        logger::debug(
            LogTag::Cache,
            &format!("Rent-exempt minimum for token accounts: {} lamports", lamports),
        );
        Ok(lamports)
    }

    /// Best-effort metadata; lookup failures yield whatever was cached
    pub async fn metadata(
        &self,
        source: &dyn MetadataSource,
        mints: &[String],
    ) -> HashMap<String, TokenMetadata> {
        let mut found = HashMap::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for mint in mints {
            if !seen.insert(mint.as_str()) {
                continue;
            }
            match self.metadata.get(mint) {
                Some(Some(metadata)) => {
                    found.insert(mint.clone(), metadata);
                }
                Some(None) => {}
                None => missing.push(mint.clone()),
            }
        }

        if missing.is_empty() {
            return found;
        }

        match source.get_assets(&missing).await {
            Ok(mut fetched) => {
                for mint in missing {
                    let entry = fetched.remove(&mint);
                    self.metadata.insert(mint.clone(), entry.clone());
                    if let Some(metadata) = entry {
                        found.insert(mint, metadata);
                    }
                }
            }
            Err(e) => {
                // Not cached, so the next scan tries again
                logger::warning(LogTag::Cache, &format!("Metadata lookup failed: {}", e));
            }
        }

        found
    }

    pub fn mint_metrics(&self) -> CacheMetrics {
        self.mints.metrics()
    }

    pub fn metadata_metrics(&self) -> CacheMetrics {
        self.metadata.metrics()
    }
}
