//! Ledger node access
//!
//! - `client`: JSON-RPC client and the `LedgerRpc` trait
//! - `rate_limiter`: spacing, retry and deadline discipline for every call
//! - `types`: token account and mint facts
//! - `utils`: address validation and account decoding

pub mod client;
pub mod rate_limiter;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod testing;

pub use client::{HttpLedgerClient, LedgerRpc};
pub use rate_limiter::{RateLimitedCaller, RetryPolicy};
pub use types::{MintFact, RpcCallError, TokenAccountFact};
pub use utils::{parse_pubkey, parse_wallet_address};
