//! Typed ledger queries
//!
//! The reclaim pipeline and lock ledger only see `LedgerRpc`, so tests can
//! swap in `rpc::testing::MockLedger`.

use super::HttpLedgerClient;
use crate::constants::{MAX_MULTIPLE_ACCOUNTS, SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID};
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use crate::rpc::types::{MintFact, TokenAccountFact};
use crate::rpc::utils::{parse_mint_account, parse_token_account};
use async_trait::async_trait;
use serde_json::Value;
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use std::str::FromStr;

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Every token account owned by `owner`, SPL Token first then Token-2022
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> ReclaimResult<Vec<TokenAccountFact>>;

    /// One entry per requested mint, in order; `None` when the account is
    /// missing or is not a mint
    async fn get_mint_facts(&self, mints: &[Pubkey]) -> ReclaimResult<Vec<Option<MintFact>>>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> ReclaimResult<u64>;

    async fn get_latest_blockhash(&self) -> ReclaimResult<Hash>;

    /// Current state of a single token account
    async fn get_token_account(&self, address: &Pubkey) -> ReclaimResult<Option<TokenAccountFact>>;
}

#[async_trait]
impl LedgerRpc for HttpLedgerClient {
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> ReclaimResult<Vec<TokenAccountFact>> {
        let mut accounts = Vec::new();

        for program_id in [SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID] {
            let params = serde_json::json!([
                owner.to_string(),
                { "programId": program_id },
                { "encoding": "jsonParsed", "commitment": "confirmed" }
            ]);

            let result = self.execute_raw("getTokenAccountsByOwner", params).await?;
            let entries = value_array(&result, "getTokenAccountsByOwner")?;

            for entry in entries {
                let Some(address) = entry.get("pubkey").and_then(|p| p.as_str()) else {
                    continue;
                };
                let Some(account) = entry.get("account") else {
                    continue;
                };
                match parse_token_account(address, account) {
                    Ok(fact) => accounts.push(fact),
                    Err(e) => logger::debug(
                        LogTag::Rpc,
                        &format!("Skipping unparsable token account {}: {}", address, e),
                    ),
                }
            }
        }

        logger::debug(
            LogTag::Rpc,
            &format!("{} token accounts owned by {}", accounts.len(), owner),
        );
        Ok(accounts)
    }

    async fn get_mint_facts(&self, mints: &[Pubkey]) -> ReclaimResult<Vec<Option<MintFact>>> {
        let mut facts = Vec::with_capacity(mints.len());

        for chunk in mints.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let keys: Vec<String> = chunk.iter().map(|p| p.to_string()).collect();
            let params = serde_json::json!([
                keys,
                { "encoding": "jsonParsed", "commitment": "confirmed" }
            ]);

            let result = self.execute_raw("getMultipleAccounts", params).await?;
            let values = value_array(&result, "getMultipleAccounts")?;

            for (key, value) in keys.iter().zip(values.iter()) {
                if value.is_null() {
                    facts.push(None);
                    continue;
                }
                match parse_mint_account(key, value) {
                    Ok(fact) => facts.push(Some(fact)),
                    Err(e) => {
                        logger::debug(LogTag::Rpc, &format!("Mint {} not decodable: {}", key, e));
                        facts.push(None);
                    }
                }
            }
            // Short responses leave the tail unknown
            for _ in values.len()..keys.len() {
                facts.push(None);
            }
        }

        Ok(facts)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> ReclaimResult<u64> {
        let result = self
            .execute_raw("getMinimumBalanceForRentExemption", serde_json::json!([data_len]))
            .await?;
        result.as_u64().ok_or_else(|| {
            ReclaimError::upstream("getMinimumBalanceForRentExemption", "result is not an integer")
        })
    }

    async fn get_latest_blockhash(&self) -> ReclaimResult<Hash> {
        let params = serde_json::json!([{ "commitment": "confirmed" }]);
        let result = self.execute_raw("getLatestBlockhash", params).await?;

        let blockhash = result
            .get("value")
            .and_then(|v| v.get("blockhash"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| ReclaimError::upstream("getLatestBlockhash", "missing blockhash"))?;

        Hash::from_str(blockhash)
            .map_err(|e| ReclaimError::upstream("getLatestBlockhash", format!("invalid blockhash: {}", e)))
    }

    async fn get_token_account(&self, address: &Pubkey) -> ReclaimResult<Option<TokenAccountFact>> {
        let params = serde_json::json!([
            address.to_string(),
            { "encoding": "jsonParsed", "commitment": "confirmed" }
        ]);
        let result = self.execute_raw("getAccountInfo", params).await?;

        let value = match result.get("value") {
            Some(v) if !v.is_null() => v,
            _ => return Ok(None),
        };

        match parse_token_account(&address.to_string(), value) {
            Ok(fact) => Ok(Some(fact)),
            Err(e) => {
                logger::debug(
                    LogTag::Rpc,
                    &format!("{} is not a token account: {}", address, e),
                );
                Ok(None)
            }
        }
    }
}

fn value_array<'a>(result: &'a Value, method: &str) -> ReclaimResult<&'a Vec<Value>> {
    result
        .get("value")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ReclaimError::upstream(method, "missing value array"))
}
