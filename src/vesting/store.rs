//! Record storage behind a swappable interface

use super::types::{TokenLock, VestingSchedule};
use crate::errors::{ReclaimError, ReclaimResult};
use parking_lot::RwLock;
use std::collections::HashMap;

pub trait LedgerStore: Send + Sync {
    fn insert_lock(&self, lock: TokenLock) -> ReclaimResult<()>;
    fn get_lock(&self, id: &str) -> ReclaimResult<Option<TokenLock>>;
    /// Replace an existing lock; `NotFound` if it was never inserted
    fn update_lock(&self, lock: TokenLock) -> ReclaimResult<()>;

    fn insert_vesting(&self, vesting: VestingSchedule) -> ReclaimResult<()>;
    fn get_vesting(&self, id: &str) -> ReclaimResult<Option<VestingSchedule>>;
    fn update_vesting(&self, vesting: VestingSchedule) -> ReclaimResult<()>;

    /// Locks where `wallet` is owner or beneficiary, oldest first
    fn locks_for_wallet(&self, wallet: &str) -> ReclaimResult<Vec<TokenLock>>;
    fn vestings_for_wallet(&self, wallet: &str) -> ReclaimResult<Vec<VestingSchedule>>;
}

/// Process-local store; contents do not survive a restart
#[derive(Default)]
pub struct InMemoryLedgerStore {
    locks: RwLock<HashMap<String, TokenLock>>,
    vestings: RwLock<HashMap<String, VestingSchedule>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert_lock(&self, lock: TokenLock) -> ReclaimResult<()> {
        let mut locks = self.locks.write();
        if locks.contains_key(&lock.id) {
            return Err(ReclaimError::InvalidRequest(format!("duplicate lock id {}", lock.id)));
        }
        locks.insert(lock.id.clone(), lock);
        Ok(())
    }

    fn get_lock(&self, id: &str) -> ReclaimResult<Option<TokenLock>> {
        Ok(self.locks.read().get(id).cloned())
    }

    fn update_lock(&self, lock: TokenLock) -> ReclaimResult<()> {
        match self.locks.write().get_mut(&lock.id) {
            Some(existing) => {
                *existing = lock;
                Ok(())
            }
            None => Err(ReclaimError::NotFound { id: lock.id }),
        }
    }

    fn insert_vesting(&self, vesting: VestingSchedule) -> ReclaimResult<()> {
        let mut vestings = self.vestings.write();
        if vestings.contains_key(&vesting.id) {
            return Err(ReclaimError::InvalidRequest(format!(
                "duplicate vesting id {}",
                vesting.id
            )));
        }
        vestings.insert(vesting.id.clone(), vesting);
        Ok(())
    }

    fn get_vesting(&self, id: &str) -> ReclaimResult<Option<VestingSchedule>> {
        Ok(self.vestings.read().get(id).cloned())
    }

    fn update_vesting(&self, vesting: VestingSchedule) -> ReclaimResult<()> {
        match self.vestings.write().get_mut(&vesting.id) {
            Some(existing) => {
                *existing = vesting;
                Ok(())
            }
            None => Err(ReclaimError::NotFound { id: vesting.id }),
        }
    }

    fn locks_for_wallet(&self, wallet: &str) -> ReclaimResult<Vec<TokenLock>> {
        let mut found: Vec<TokenLock> = self
            .locks
            .read()
            .values()
            .filter(|l| l.owner == wallet || l.beneficiary == wallet)
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(found)
    }

    fn vestings_for_wallet(&self, wallet: &str) -> ReclaimResult<Vec<VestingSchedule>> {
        let mut found: Vec<VestingSchedule> = self
            .vestings
            .read()
            .values()
            .filter(|v| v.owner == wallet || v.beneficiary == wallet)
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(found)
    }
}
