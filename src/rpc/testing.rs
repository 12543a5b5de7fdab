//! In-memory ledger double for tests

use crate::errors::{ReclaimError, ReclaimResult};
use crate::rpc::client::LedgerRpc;
use crate::rpc::types::{MintFact, TokenAccountFact};
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use std::collections::HashMap;

/// Rent-exempt minimum for a 165-byte token account on mainnet
pub const TEST_RENT_MINIMUM: u64 = 2_039_280;

pub struct MockLedger {
    accounts: Mutex<Vec<TokenAccountFact>>,
    mints: Mutex<HashMap<String, MintFact>>,
    rent_minimum: u64,
    blockhash: Hash,
    failure: Mutex<Option<ReclaimError>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            mints: Mutex::new(HashMap::new()),
            rent_minimum: TEST_RENT_MINIMUM,
            blockhash: Hash::new_unique(),
            failure: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_account(self, account: TokenAccountFact) -> Self {
        self.accounts.lock().push(account);
        self
    }

    pub fn with_mint(self, mint: MintFact) -> Self {
        self.mints.lock().insert(mint.address.clone(), mint);
        self
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Replace an account's state (or add it)
    pub fn upsert_account(&self, account: TokenAccountFact) {
        let mut accounts = self.accounts.lock();
        accounts.retain(|a| a.address != account.address);
        accounts.push(account);
    }

    pub fn remove_account(&self, address: &str) {
        self.accounts.lock().retain(|a| a.address != address);
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: ReclaimError) {
        *self.failure.lock() = Some(error);
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) -> ReclaimResult<()> {
        *self.calls.lock().entry(method).or_insert(0) += 1;
        match self.failure.lock().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> ReclaimResult<Vec<TokenAccountFact>> {
        self.record("getTokenAccountsByOwner")?;
        let owner = owner.to_string();
        let accounts = self.accounts.lock();
        // SPL Token accounts first, like the real enumeration
        let mut owned: Vec<TokenAccountFact> =
            accounts.iter().filter(|a| a.owner == owner).cloned().collect();
        owned.sort_by_key(|a| a.is_token_2022);
        Ok(owned)
    }

    async fn get_mint_facts(&self, mints: &[Pubkey]) -> ReclaimResult<Vec<Option<MintFact>>> {
        self.record("getMultipleAccounts")?;
        let known = self.mints.lock();
        Ok(mints
            .iter()
            .map(|m| known.get(&m.to_string()).cloned())
            .collect())
    }

    async fn get_minimum_balance_for_rent_exemption(&self, _data_len: usize) -> ReclaimResult<u64> {
        self.record("getMinimumBalanceForRentExemption")?;
        Ok(self.rent_minimum)
    }

    async fn get_latest_blockhash(&self) -> ReclaimResult<Hash> {
        self.record("getLatestBlockhash")?;
        Ok(self.blockhash)
    }

    async fn get_token_account(&self, address: &Pubkey) -> ReclaimResult<Option<TokenAccountFact>> {
        self.record("getAccountInfo")?;
        let address = address.to_string();
        Ok(self
            .accounts
            .lock()
            .iter()
            .find(|a| a.address == address)
            .cloned())
    }
}

/// Token account fixture holding the rent-exempt minimum
pub fn token_account(owner: &Pubkey, mint: &Pubkey, amount: u64, decimals: u8) -> TokenAccountFact {
    TokenAccountFact {
        address: Pubkey::new_unique().to_string(),
        owner: owner.to_string(),
        mint: mint.to_string(),
        amount: amount.to_string(),
        decimals,
        is_initialized: true,
        is_frozen: false,
        is_native: false,
        is_token_2022: false,
        lamports: TEST_RENT_MINIMUM,
    }
}

pub fn mint_fact(mint: &Pubkey, decimals: u8, supply: u64) -> MintFact {
    MintFact {
        address: mint.to_string(),
        decimals,
        supply: supply.to_string(),
        has_mint_authority: false,
        has_freeze_authority: false,
        is_initialized: true,
    }
}
