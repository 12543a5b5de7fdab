//! Token locks and vesting schedules
//!
//! - `math`: vesting curves (linear, cliff, step)
//! - `ledger`: create / claim / revoke state machine
//! - `store`: record storage interface and in-memory backing
//! - `locks`: per-record single-writer locks
//! - `clock`: injectable time source

pub mod clock;
pub mod ledger;
pub mod locks;
pub mod math;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::LockVestingLedger;
pub use locks::RecordLocks;
pub use math::{vested_amount, vested_amount_at, MONTH_SECONDS};
pub use store::{InMemoryLedgerStore, LedgerStore};
pub use types::{
    ClaimQuote, CreateLockRequest, CreateVestingRequest, CreatedRecord, RecordStatus, TokenLock,
    TransferOutcome, VestingSchedule, VestingType, WalletRecords,
};
