//! Lock and vesting ledger
//!
//! Records are bookkeeping only: the creation transfer moves tokens from the
//! owner's account to itself and nothing is escrowed on chain. Claims and
//! revokes return a `transfer_checked` out of the recorded token account,
//! which the owner of that account signs.

use super::clock::{Clock, SystemClock};
use super::locks::RecordLocks;
use super::math::vested_amount_at;
use super::store::{InMemoryLedgerStore, LedgerStore};
use super::types::{
    ClaimQuote, CreateLockRequest, CreateVestingRequest, CreatedRecord, TokenLock,
    TransferOutcome, VestingSchedule, VestingType, WalletRecords,
};
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use crate::reclaim::InstructionView;
use crate::rpc::{parse_pubkey, parse_wallet_address, LedgerRpc, TokenAccountFact};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use std::sync::Arc;
use uuid::Uuid;

pub struct LockVestingLedger {
    rpc: Arc<dyn LedgerRpc>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    locks: RecordLocks,
}

/// Source account checked against chain state at creation
struct VerifiedSource {
    owner: Pubkey,
    beneficiary: Pubkey,
    mint: Pubkey,
    token_account: Pubkey,
    fact: TokenAccountFact,
}

impl LockVestingLedger {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rpc,
            store,
            clock,
            locks: RecordLocks::new(),
        }
    }

    /// In-memory store and wall clock
    pub fn in_memory(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self::new(rpc, Arc::new(InMemoryLedgerStore::new()), Arc::new(SystemClock))
    }

    pub async fn create_lock(
        &self,
        owner: &str,
        req: CreateLockRequest,
    ) -> ReclaimResult<CreatedRecord> {
        let now = self.clock.now();
        if req.unlock_time <= now {
            return Err(ReclaimError::InvalidRequest(
                "unlock_time must be in the future".to_string(),
            ));
        }
        let source = self
            .verify_source(owner, &req.token_mint, &req.token_account, &req.beneficiary, req.amount)
            .await?;

        // Self-transfer: proves authority over the amount, moves nothing
        let instruction = build_transfer(
            &source.token_account,
            &source.token_account,
            &source.mint,
            &source.owner,
            source.fact.decimals,
            source.fact.is_token_2022,
            req.amount,
        )?;

        let lock = TokenLock {
            id: Uuid::new_v4().to_string(),
            token_mint: source.mint.to_string(),
            token_account: source.token_account.to_string(),
            owner: source.owner.to_string(),
            beneficiary: source.beneficiary.to_string(),
            total_amount: req.amount,
            locked_amount: req.amount,
            unlock_time: req.unlock_time,
            is_revocable: req.is_revocable,
            is_revoked: false,
            decimals: source.fact.decimals,
            is_token_2022: source.fact.is_token_2022,
            created_at: now,
            updated_at: now,
        };
        let id = lock.id.clone();
        self.store.insert_lock(lock)?;

        logger::info(
            LogTag::Vesting,
            &format!(
                "Lock {} created: {} units of {} for {} until {}",
                id, req.amount, source.mint, source.beneficiary, req.unlock_time
            ),
        );
        Ok(CreatedRecord {
            id,
            transfer_instruction: InstructionView::from(&instruction),
        })
    }

    pub async fn create_vesting(
        &self,
        owner: &str,
        req: CreateVestingRequest,
    ) -> ReclaimResult<CreatedRecord> {
        validate_schedule(&req)?;
        let source = self
            .verify_source(owner, &req.token_mint, &req.token_account, &req.beneficiary, req.amount)
            .await?;

        // Self-transfer: proves authority over the amount, moves nothing
        let instruction = build_transfer(
            &source.token_account,
            &source.token_account,
            &source.mint,
            &source.owner,
            source.fact.decimals,
            source.fact.is_token_2022,
            req.amount,
        )?;

        let now = self.clock.now();
        let vesting = VestingSchedule {
            id: Uuid::new_v4().to_string(),
            token_mint: source.mint.to_string(),
            token_account: source.token_account.to_string(),
            owner: source.owner.to_string(),
            beneficiary: source.beneficiary.to_string(),
            total_amount: req.amount,
            vested_amount: 0,
            start_time: req.start_time,
            end_time: req.end_time,
            cliff_time: req.cliff_time,
            vesting_type: req.vesting_type,
            is_revocable: req.is_revocable,
            is_revoked: false,
            decimals: source.fact.decimals,
            is_token_2022: source.fact.is_token_2022,
            created_at: now,
            updated_at: now,
        };
        let id = vesting.id.clone();
        self.store.insert_vesting(vesting)?;

        logger::info(
            LogTag::Vesting,
            &format!(
                "Vesting {} created: {} units of {} ({}) for {}",
                id, req.amount, source.mint, req.vesting_type, source.beneficiary
            ),
        );
        Ok(CreatedRecord {
            id,
            transfer_instruction: InstructionView::from(&instruction),
        })
    }

    pub async fn claim_from_lock(
        &self,
        id: &str,
        beneficiary: &str,
    ) -> ReclaimResult<TransferOutcome> {
        let _guard = self.locks.acquire(id).await;
        let now = self.clock.now();

        let mut lock = self.require_lock(id)?;
        if lock.beneficiary != beneficiary.trim() {
            return Err(ReclaimError::NotBeneficiary {
                id: id.to_string(),
                caller: beneficiary.to_string(),
            });
        }
        if lock.is_revoked {
            return Err(ReclaimError::AlreadyRevoked { id: id.to_string() });
        }
        if now < lock.unlock_time {
            return Err(ReclaimError::NotYetUnlocked {
                id: id.to_string(),
                unlock_time: lock.unlock_time,
            });
        }
        if lock.locked_amount == 0 {
            return Err(ReclaimError::NothingToClaim { id: id.to_string() });
        }

        let amount = lock.locked_amount;
        let instruction = payout_instruction(
            &lock.token_account,
            &lock.token_mint,
            &lock.owner,
            &lock.beneficiary,
            lock.decimals,
            lock.is_token_2022,
            amount,
        )?;

        lock.locked_amount = 0;
        lock.updated_at = now;
        self.store.update_lock(lock)?;

        logger::info(
            LogTag::Vesting,
            &format!("Lock {} claimed: {} units to {}", id, amount, beneficiary),
        );
        Ok(TransferOutcome {
            id: id.to_string(),
            amount,
            transfer_instruction: InstructionView::from(&instruction),
        })
    }

    pub async fn claim_from_vesting(
        &self,
        id: &str,
        beneficiary: &str,
    ) -> ReclaimResult<TransferOutcome> {
        let _guard = self.locks.acquire(id).await;
        let now = self.clock.now();

        let mut vesting = self.require_vesting(id)?;
        if vesting.beneficiary != beneficiary.trim() {
            return Err(ReclaimError::NotBeneficiary {
                id: id.to_string(),
                caller: beneficiary.to_string(),
            });
        }
        if vesting.is_revoked {
            return Err(ReclaimError::AlreadyRevoked { id: id.to_string() });
        }
        if now < vesting.start_time {
            return Err(ReclaimError::NotStarted {
                id: id.to_string(),
                start_time: vesting.start_time,
            });
        }

        let vested = vested_amount_at(&vesting, now);
        let amount = vested.saturating_sub(vesting.vested_amount);
        if amount == 0 {
            return Err(ReclaimError::NothingToClaim { id: id.to_string() });
        }

        let instruction = payout_instruction(
            &vesting.token_account,
            &vesting.token_mint,
            &vesting.owner,
            &vesting.beneficiary,
            vesting.decimals,
            vesting.is_token_2022,
            amount,
        )?;

        vesting.vested_amount = vesting.vested_amount.max(vested);
        vesting.updated_at = now;
        self.store.update_vesting(vesting)?;

        logger::info(
            LogTag::Vesting,
            &format!("Vesting {} released {} units to {}", id, amount, beneficiary),
        );
        Ok(TransferOutcome {
            id: id.to_string(),
            amount,
            transfer_instruction: InstructionView::from(&instruction),
        })
    }

    /// Revoke a lock or vesting; the unreleased remainder goes back to the owner
    pub async fn revoke(&self, id: &str, owner: &str) -> ReclaimResult<TransferOutcome> {
        let _guard = self.locks.acquire(id).await;
        let now = self.clock.now();
        let caller = owner.trim();

        if let Some(mut lock) = self.store.get_lock(id)? {
            check_revocable(id, &lock.owner, caller, lock.is_revocable, lock.is_revoked)?;
            if lock.locked_amount == 0 {
                return Err(ReclaimError::NothingToClaim { id: id.to_string() });
            }

            let amount = lock.locked_amount;
            let instruction = payout_instruction(
                &lock.token_account,
                &lock.token_mint,
                &lock.owner,
                &lock.owner,
                lock.decimals,
                lock.is_token_2022,
                amount,
            )?;

            lock.locked_amount = 0;
            lock.is_revoked = true;
            lock.updated_at = now;
            self.store.update_lock(lock)?;

            logger::info(
                LogTag::Vesting,
                &format!("Lock {} revoked, {} units returned", id, amount),
            );
            return Ok(TransferOutcome {
                id: id.to_string(),
                amount,
                transfer_instruction: InstructionView::from(&instruction),
            });
        }

        let mut vesting = self.require_vesting(id)?;
        check_revocable(id, &vesting.owner, caller, vesting.is_revocable, vesting.is_revoked)?;
        let amount = vesting.total_amount.saturating_sub(vesting.vested_amount);
        if amount == 0 {
            return Err(ReclaimError::NothingToClaim { id: id.to_string() });
        }

        let instruction = payout_instruction(
            &vesting.token_account,
            &vesting.token_mint,
            &vesting.owner,
            &vesting.owner,
            vesting.decimals,
            vesting.is_token_2022,
            amount,
        )?;

        vesting.is_revoked = true;
        vesting.updated_at = now;
        self.store.update_vesting(vesting)?;

        logger::info(
            LogTag::Vesting,
            &format!("Vesting {} revoked, {} units returned", id, amount),
        );
        Ok(TransferOutcome {
            id: id.to_string(),
            amount,
            transfer_instruction: InstructionView::from(&instruction),
        })
    }

    /// Locks and vestings where `wallet` is owner or beneficiary
    pub fn list_for_wallet(&self, wallet: &str) -> ReclaimResult<WalletRecords> {
        let wallet = parse_pubkey(wallet)?.to_string();
        Ok(WalletRecords {
            locks: self.store.locks_for_wallet(&wallet)?,
            vestings: self.store.vestings_for_wallet(&wallet)?,
        })
    }

    pub fn get_lock(&self, id: &str) -> ReclaimResult<TokenLock> {
        self.require_lock(id)
    }

    pub fn get_vesting(&self, id: &str) -> ReclaimResult<VestingSchedule> {
        self.require_vesting(id)
    }

    /// Amount the beneficiary could claim at this moment
    pub fn claimable_now(&self, id: &str) -> ReclaimResult<ClaimQuote> {
        let now = self.clock.now();

        if let Some(lock) = self.store.get_lock(id)? {
            let claimable = if lock.is_revoked || now < lock.unlock_time {
                0
            } else {
                lock.locked_amount
            };
            return Ok(ClaimQuote {
                id: lock.id.clone(),
                total_amount: lock.total_amount,
                released_amount: lock.total_amount - lock.locked_amount,
                claimable_amount: claimable,
                status: lock.status(),
                as_of: now,
            });
        }

        let vesting = self.require_vesting(id)?;
        let claimable = if vesting.is_revoked {
            0
        } else {
            vested_amount_at(&vesting, now).saturating_sub(vesting.vested_amount)
        };
        Ok(ClaimQuote {
            id: vesting.id.clone(),
            total_amount: vesting.total_amount,
            released_amount: vesting.vested_amount,
            claimable_amount: claimable,
            status: vesting.status(),
            as_of: now,
        })
    }

    fn require_lock(&self, id: &str) -> ReclaimResult<TokenLock> {
        self.store
            .get_lock(id)?
            .ok_or_else(|| ReclaimError::NotFound { id: id.to_string() })
    }

    fn require_vesting(&self, id: &str) -> ReclaimResult<VestingSchedule> {
        self.store
            .get_vesting(id)?
            .ok_or_else(|| ReclaimError::NotFound { id: id.to_string() })
    }

    /// Check the source token account against the chain, not the ledger
    async fn verify_source(
        &self,
        owner: &str,
        token_mint: &str,
        token_account: &str,
        beneficiary: &str,
        amount: u64,
    ) -> ReclaimResult<VerifiedSource> {
        if amount == 0 {
            return Err(ReclaimError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        let owner = parse_wallet_address(owner)?;
        let beneficiary = parse_wallet_address(beneficiary)?;
        let mint = parse_pubkey(token_mint)?;
        let token_account = parse_pubkey(token_account)?;

        let fact = self.rpc.get_token_account(&token_account).await?.ok_or_else(|| {
            ReclaimError::InvalidRequest(format!("token account {} not found", token_account))
        })?;

        if fact.owner != owner.to_string() {
            return Err(ReclaimError::NotOwner {
                subject: token_account.to_string(),
                caller: owner.to_string(),
            });
        }
        if fact.mint != mint.to_string() {
            return Err(ReclaimError::InvalidRequest(format!(
                "token account {} holds {}, not {}",
                token_account, fact.mint, mint
            )));
        }
        let available = fact.balance().ok_or_else(|| {
            ReclaimError::upstream("getAccountInfo", format!("unparsable balance '{}'", fact.amount))
        })?;
        if available < amount {
            return Err(ReclaimError::InsufficientBalance {
                account: token_account.to_string(),
                required: amount,
                available,
            });
        }

        Ok(VerifiedSource {
            owner,
            beneficiary,
            mint,
            token_account,
            fact,
        })
    }
}

fn validate_schedule(req: &CreateVestingRequest) -> ReclaimResult<()> {
    // A cliff must sit inside [start, end], so this bounds every timestamp
    if req.start_time < 0 {
        return Err(ReclaimError::InvalidRequest(
            "start_time must not be negative".to_string(),
        ));
    }
    if req.end_time <= req.start_time {
        return Err(ReclaimError::InvalidRequest(
            "end_time must be after start_time".to_string(),
        ));
    }
    if let Some(cliff) = req.cliff_time {
        if cliff < req.start_time || cliff > req.end_time {
            return Err(ReclaimError::InvalidRequest(
                "cliff_time must fall between start_time and end_time".to_string(),
            ));
        }
    }
    if req.vesting_type == VestingType::Cliff && req.cliff_time.is_none() {
        return Err(ReclaimError::InvalidRequest(
            "cliff vesting requires cliff_time".to_string(),
        ));
    }
    Ok(())
}

fn check_revocable(
    id: &str,
    owner: &str,
    caller: &str,
    is_revocable: bool,
    is_revoked: bool,
) -> ReclaimResult<()> {
    // Non-revocable records refuse every caller alike
    if !is_revocable {
        return Err(ReclaimError::NotRevocable { id: id.to_string() });
    }
    if owner != caller {
        return Err(ReclaimError::NotOwner {
            subject: id.to_string(),
            caller: caller.to_string(),
        });
    }
    if is_revoked {
        return Err(ReclaimError::AlreadyRevoked { id: id.to_string() });
    }
    Ok(())
}

fn token_program_id(is_token_2022: bool) -> Pubkey {
    if is_token_2022 {
        spl_token_2022::id()
    } else {
        spl_token::id()
    }
}

/// Transfer out of a recorded token account into `recipient`'s associated account
fn payout_instruction(
    token_account: &str,
    token_mint: &str,
    owner: &str,
    recipient: &str,
    decimals: u8,
    is_token_2022: bool,
    amount: u64,
) -> ReclaimResult<Instruction> {
    let source = parse_pubkey(token_account)?;
    let mint = parse_pubkey(token_mint)?;
    let authority = parse_pubkey(owner)?;
    let recipient = parse_pubkey(recipient)?;
    let destination = get_associated_token_address_with_program_id(
        &recipient,
        &mint,
        &token_program_id(is_token_2022),
    );
    build_transfer(&source, &destination, &mint, &authority, decimals, is_token_2022, amount)
}

fn build_transfer(
    source: &Pubkey,
    destination: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    decimals: u8,
    is_token_2022: bool,
    amount: u64,
) -> ReclaimResult<Instruction> {
    let program_id = token_program_id(is_token_2022);
    let instruction = if is_token_2022 {
        spl_token_2022::instruction::transfer_checked(
            &program_id, source, mint, destination, authority, &[], amount, decimals,
        )
    } else {
        spl_token::instruction::transfer_checked(
            &program_id, source, mint, destination, authority, &[], amount, decimals,
        )
    };
    instruction.map_err(|e| {
        ReclaimError::InvalidRequest(format!("failed to build transfer instruction: {}", e))
    })
}
