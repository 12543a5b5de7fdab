//! Rent reclaim engine
//!
//! - `classifier`: decides close / burn / ignore per token account
//! - `fees`: platform fee split shared by quotes and transactions
//! - `builder`: assembles one unsigned batch transaction
//! - `service`: wallet scans, bulk scans and build requests

pub mod builder;
pub mod classifier;
pub mod fees;
pub mod service;
pub mod types;

pub use builder::TransactionBuilder;
pub use classifier::{classify_account, AccountClassifier, ClassificationPolicy, HeuristicPolicy};
pub use fees::{split, FeeBreakdown, FEE_RATE_BPS};
pub use service::ReclaimService;
pub use types::{
    AccountCategory, BuiltTransaction, BulkScanEntry, ClassifiedAccount, InstructionView,
    ReclaimAction, SkippedAccount, WalletScan,
};
