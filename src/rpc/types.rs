use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of one token account as the ledger node reported it
///
/// Balances stay as raw integer strings; never converted to floats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccountFact {
    /// Token account address
    pub address: String,
    /// Wallet that owns the token account
    pub owner: String,
    /// Token mint address
    pub mint: String,
    /// Raw balance in base units
    pub amount: String,
    /// Decimals reported alongside the balance
    pub decimals: u8,
    pub is_initialized: bool,
    pub is_frozen: bool,
    /// Wrapped SOL account
    pub is_native: bool,
    /// Owned by the Token-2022 program rather than SPL Token
    pub is_token_2022: bool,
    /// Lamports currently held by the account
    pub lamports: u64,
}

impl TokenAccountFact {
    /// Raw balance as an integer, `None` if the node returned garbage
    pub fn balance(&self) -> Option<u64> {
        self.amount.parse::<u64>().ok()
    }
}

/// Per-mint facts used by classification and burn instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintFact {
    pub address: String,
    pub decimals: u8,
    /// Total supply in base units
    pub supply: String,
    pub has_mint_authority: bool,
    pub has_freeze_authority: bool,
    pub is_initialized: bool,
}

impl MintFact {
    pub fn supply_raw(&self) -> Option<u64> {
        self.supply.parse::<u64>().ok()
    }
}

/// Failure of one outbound attempt, before retry handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCallError {
    /// HTTP 429 or a JSON-RPC throttling error
    RateLimited { retry_after: Option<Duration> },
    /// JSON-RPC error object other than throttling
    Rpc { code: i64, message: String },
    /// Connection, TLS or non-success HTTP status
    Transport(String),
    /// Response did not have the expected shape
    Decode(String),
    /// Attempt exceeded its deadline
    Timeout,
}

impl std::fmt::Display for RpcCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcCallError::RateLimited { .. } => write!(f, "rate limited"),
            RpcCallError::Rpc { code, message } => write!(f, "RPC error {}: {}", code, message),
            RpcCallError::Transport(msg) => write!(f, "transport error: {}", msg),
            RpcCallError::Decode(msg) => write!(f, "invalid response: {}", msg),
            RpcCallError::Timeout => write!(f, "request timeout"),
        }
    }
}

impl std::error::Error for RpcCallError {}
