//! Token account classification
//!
//! Decides, per account, whether the wallet can close it, burn and close it,
//! or should leave it alone. The mint-level heuristics sit behind
//! `ClassificationPolicy` so better detection can replace them.

use super::types::{AccountCategory, ClassifiedAccount, ReclaimAction};
use crate::cache::MetadataCache;
use crate::config::ReclaimConfig;
use crate::errors::ReclaimResult;
use crate::logger::{self, LogTag};
use crate::rpc::{parse_wallet_address, LedgerRpc, MintFact, TokenAccountFact};
use crate::tokens::MetadataSource;
use std::collections::HashSet;
use std::sync::Arc;

pub trait ClassificationPolicy: Send + Sync {
    /// Mint looks like a compressed collectible; its accounts are never closed
    fn is_compressed_collectible(&self, mint: &MintFact) -> bool;

    /// Single-supply collectible, burned as an NFT
    fn is_nft(&self, mint: &MintFact) -> bool;

    /// Mint whose balances must never be burned
    fn is_non_burnable(&self, mint: &str) -> bool;
}

/// Default detection: supply/decimals heuristics plus a mint deny-list
pub struct HeuristicPolicy {
    non_burnable: HashSet<String>,
}

impl HeuristicPolicy {
    pub fn new<I, S>(non_burnable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_burnable: non_burnable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ReclaimConfig) -> Self {
        Self::new(config.non_burnable_mints.iter().cloned())
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::from_config(&ReclaimConfig::default())
    }
}

fn single_supply_zero_decimals(mint: &MintFact) -> bool {
    mint.decimals == 0 && mint.supply_raw() == Some(1)
}

impl ClassificationPolicy for HeuristicPolicy {
    fn is_compressed_collectible(&self, mint: &MintFact) -> bool {
        single_supply_zero_decimals(mint)
    }

    fn is_nft(&self, mint: &MintFact) -> bool {
        single_supply_zero_decimals(mint)
    }

    fn is_non_burnable(&self, mint: &str) -> bool {
        self.non_burnable.contains(mint)
    }
}

/// Category plus the reason an account is not actionable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub category: AccountCategory,
    pub reason: Option<String>,
}

impl Verdict {
    fn actionable(category: AccountCategory) -> Self {
        Self {
            category,
            reason: None,
        }
    }

    fn held(category: AccountCategory, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: Some(reason.into()),
        }
    }
}

/// Classify one account against its mint facts
///
/// A missing mint fact is not an error: the collectible heuristics simply
/// do not apply and burns use the account's own decimals.
pub fn classify_account(
    account: &TokenAccountFact,
    mint: Option<&MintFact>,
    policy: &dyn ClassificationPolicy,
) -> Verdict {
    let Some(balance) = account.balance() else {
        return Verdict::held(
            AccountCategory::Ignored,
            format!("unparsable balance '{}'", account.amount),
        );
    };
    if !account.is_initialized {
        return Verdict::held(AccountCategory::Ignored, "account not initialized");
    }
    if account.is_frozen {
        return Verdict::held(AccountCategory::Ignored, "account is frozen");
    }

    if balance == 0 {
        if mint.is_some_and(|m| policy.is_compressed_collectible(m)) {
            return Verdict::held(AccountCategory::Ignored, "compressed collectible mint");
        }
        return Verdict::actionable(AccountCategory::Closeable);
    }

    if account.is_native {
        return Verdict::held(AccountCategory::NonBurnable, "native balance cannot be burned");
    }
    if policy.is_non_burnable(&account.mint) {
        return Verdict::held(AccountCategory::NonBurnable, "protected mint");
    }
    if mint.is_some_and(|m| policy.is_nft(m)) {
        return Verdict::actionable(AccountCategory::BurnableNft);
    }
    Verdict::actionable(AccountCategory::BurnableToken)
}

pub struct AccountClassifier {
    rpc: Arc<dyn LedgerRpc>,
    cache: Arc<MetadataCache>,
    metadata: Arc<dyn MetadataSource>,
    policy: Arc<dyn ClassificationPolicy>,
}

impl AccountClassifier {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        cache: Arc<MetadataCache>,
        metadata: Arc<dyn MetadataSource>,
        policy: Arc<dyn ClassificationPolicy>,
    ) -> Self {
        Self {
            rpc,
            cache,
            metadata,
            policy,
        }
    }

    /// Classify every token account owned by `wallet`, in enumeration order
    pub async fn classify(&self, wallet: &str) -> ReclaimResult<Vec<ClassifiedAccount>> {
        let owner = parse_wallet_address(wallet)?;

        let accounts = self.rpc.get_token_accounts_by_owner(&owner).await?;
        if accounts.is_empty() {
            logger::debug(LogTag::Reclaim, &format!("{} owns no token accounts", wallet));
            return Ok(Vec::new());
        }

        let mints: Vec<String> = accounts.iter().map(|a| a.mint.clone()).collect();
        let mint_facts = self.cache.mint_facts(self.rpc.as_ref(), &mints).await?;
        let rent_minimum = self.cache.rent_minimum(self.rpc.as_ref()).await?;

        let mut classified: Vec<ClassifiedAccount> = accounts
            .into_iter()
            .map(|account| {
                let verdict =
                    classify_account(&account, mint_facts.get(&account.mint), self.policy.as_ref());
                let action = verdict.category.action();
                if let Some(reason) = &verdict.reason {
                    logger::verbose(
                        LogTag::Reclaim,
                        &format!("{} not actionable: {}", account.address, reason),
                    );
                }
                ClassifiedAccount {
                    gross_recoverable: if action == ReclaimAction::Ignore { 0 } else { rent_minimum },
                    account,
                    category: verdict.category,
                    action,
                    reason: verdict.reason,
                    metadata: None,
                }
            })
            .collect();

        let actionable_mints: Vec<String> = classified
            .iter()
            .filter(|c| c.is_actionable())
            .map(|c| c.account.mint.clone())
            .collect();
        if !actionable_mints.is_empty() {
            let metadata = self
                .cache
                .metadata(self.metadata.as_ref(), &actionable_mints)
                .await;
            for entry in classified.iter_mut().filter(|c| c.is_actionable()) {
                entry.metadata = metadata.get(&entry.account.mint).cloned();
            }
        }

        logger::debug(
            LogTag::Reclaim,
            &format!(
                "Classified {} accounts for {} ({} actionable)",
                classified.len(),
                wallet,
                classified.iter().filter(|c| c.is_actionable()).count()
            ),
        );
        Ok(classified)
    }
}
