//! Reclaim entry points: wallet scans and transaction building

use super::builder::TransactionBuilder;
use super::classifier::{AccountClassifier, ClassificationPolicy, HeuristicPolicy};
use super::fees;
use super::types::{BuiltTransaction, BulkScanEntry, ReclaimAction, WalletScan};
use crate::cache::MetadataCache;
use crate::config::Config;
use crate::constants::lamports_to_sol;
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use crate::rpc::{parse_pubkey, LedgerRpc};
use crate::tokens::MetadataSource;
use std::sync::Arc;

pub struct ReclaimService {
    classifier: AccountClassifier,
    cache: Arc<MetadataCache>,
    // None when no fee wallet is configured; scans still work
    builder: Option<TransactionBuilder>,
}

impl ReclaimService {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        cache: Arc<MetadataCache>,
        metadata: Arc<dyn MetadataSource>,
        policy: Arc<dyn ClassificationPolicy>,
        builder: Option<TransactionBuilder>,
    ) -> Self {
        Self {
            classifier: AccountClassifier::new(rpc, cache.clone(), metadata, policy),
            cache,
            builder,
        }
    }

    /// Wire the service from configuration
    pub fn from_config(
        config: &Config,
        rpc: Arc<dyn LedgerRpc>,
        metadata: Arc<dyn MetadataSource>,
    ) -> ReclaimResult<Self> {
        let cache = Arc::new(MetadataCache::new(&config.cache));
        let policy: Arc<dyn ClassificationPolicy> =
            Arc::new(HeuristicPolicy::from_config(&config.reclaim));

        let fee_wallet = config.reclaim.fee_wallet.trim();
        let builder = if fee_wallet.is_empty() {
            logger::debug(
                LogTag::Reclaim,
                "No fee wallet configured, transaction building disabled",
            );
            None
        } else {
            let fee_wallet = parse_pubkey(fee_wallet).map_err(|e| {
                ReclaimError::Configuration(format!("reclaim.fee_wallet: {}", e))
            })?;
            Some(TransactionBuilder::new(
                rpc.clone(),
                cache.clone(),
                metadata.clone(),
                policy.clone(),
                fee_wallet,
                config.reclaim.max_accounts_per_transaction,
            ))
        };

        Ok(Self::new(rpc, cache, metadata, policy, builder))
    }

    /// Actionable accounts of one wallet with fee-adjusted totals
    pub async fn scan_wallet(&self, wallet: &str) -> ReclaimResult<WalletScan> {
        let classified = self.classifier.classify(wallet).await?;
        let seen = classified.len();

        let accounts: Vec<_> = classified.into_iter().filter(|c| c.is_actionable()).collect();
        let totals = fees::split_each(accounts.iter().map(|c| c.gross_recoverable));

        logger::info(
            LogTag::Reclaim,
            &format!(
                "Scanned {}: {} actionable of {}, net {:.6} SOL",
                wallet,
                accounts.len(),
                seen,
                lamports_to_sol(totals.net)
            ),
        );

        Ok(WalletScan {
            wallet: wallet.trim().to_string(),
            ignored: seen - accounts.len(),
            accounts,
            total_gross: totals.gross,
            total_fee: totals.fee,
            total_net: totals.net,
        })
    }

    /// Scan several wallets one after another; failures stay per wallet
    pub async fn scan_wallets(&self, wallets: &[String]) -> Vec<BulkScanEntry> {
        let mut entries = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let entry = match self.scan_wallet(wallet).await {
                Ok(scan) => BulkScanEntry {
                    wallet: wallet.clone(),
                    scan: Some(scan),
                    error: None,
                },
                Err(e) => {
                    let hint = if e.is_recoverable() { ", retry later" } else { "" };
                    logger::warning(
                        LogTag::Reclaim,
                        &format!("Scan of {} failed: {}{}", wallet, e, hint),
                    );
                    BulkScanEntry {
                        wallet: wallet.clone(),
                        scan: None,
                        error: Some(e.to_response()),
                    }
                }
            };
            entries.push(entry);
        }
        self.log_cache_metrics();
        entries
    }

    fn log_cache_metrics(&self) {
        let mints = self.cache.mint_metrics();
        let metadata = self.cache.metadata_metrics();
        logger::debug(
            LogTag::Cache,
            &format!(
                "Mint cache {:.0}% hits ({}/{}), metadata cache {:.0}% hits ({}/{})",
                mints.hit_rate() * 100.0,
                mints.hits,
                mints.hits + mints.misses,
                metadata.hit_rate() * 100.0,
                metadata.hits,
                metadata.hits + metadata.misses
            ),
        );
    }

    pub async fn build_transaction(
        &self,
        wallet: &str,
        account_ids: &[String],
        action: ReclaimAction,
    ) -> ReclaimResult<BuiltTransaction> {
        let builder = self.builder.as_ref().ok_or_else(|| {
            ReclaimError::Configuration("reclaim.fee_wallet is not set".to_string())
        })?;
        builder.build(wallet, account_ids, action).await
    }
}
