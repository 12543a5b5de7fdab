//! Types for account reclaim operations

use super::fees::FeeBreakdown;
use crate::errors::{ErrorResponse, ReclaimError};
use crate::rpc::TokenAccountFact;
use crate::tokens::TokenMetadata;
use base64::Engine;
use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// What a reclaim transaction does with an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReclaimAction {
    Close,
    Burn,
    Ignore,
}

impl ReclaimAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReclaimAction::Close => "close",
            ReclaimAction::Burn => "burn",
            ReclaimAction::Ignore => "ignore",
        }
    }
}

impl fmt::Display for ReclaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReclaimAction {
    type Err = ReclaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(ReclaimAction::Close),
            "burn" => Ok(ReclaimAction::Burn),
            "ignore" => Ok(ReclaimAction::Ignore),
            other => Err(ReclaimError::InvalidRequest(format!(
                "unknown action '{}', expected close or burn",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Empty account, close returns its deposit
    Closeable,
    /// Fungible balance to burn before closing
    BurnableToken,
    /// Single-supply collectible to burn before closing
    BurnableNft,
    /// Holds a balance of a protected mint
    NonBurnable,
    /// Frozen, uninitialized, undecodable or otherwise out of reach
    Ignored,
}

impl AccountCategory {
    pub fn action(&self) -> ReclaimAction {
        match self {
            AccountCategory::Closeable => ReclaimAction::Close,
            AccountCategory::BurnableToken | AccountCategory::BurnableNft => ReclaimAction::Burn,
            AccountCategory::NonBurnable | AccountCategory::Ignored => ReclaimAction::Ignore,
        }
    }
}

/// A token account with its verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedAccount {
    pub account: TokenAccountFact,
    pub category: AccountCategory,
    pub action: ReclaimAction,
    /// Lamports freed by the action, before the platform fee (0 when ignored)
    pub gross_recoverable: u64,
    /// Why the account was not actionable
    pub reason: Option<String>,
    pub metadata: Option<TokenMetadata>,
}

impl ClassifiedAccount {
    pub fn is_actionable(&self) -> bool {
        self.action != ReclaimAction::Ignore
    }
}

// =============================================================================
// SCAN RESULTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletScan {
    pub wallet: String,
    /// Actionable accounts, in enumeration order
    pub accounts: Vec<ClassifiedAccount>,
    pub total_gross: u64,
    pub total_fee: u64,
    pub total_net: u64,
    /// Accounts seen but not actionable
    pub ignored: usize,
}

/// One wallet's outcome in a bulk scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkScanEntry {
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<WalletScan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

// =============================================================================
// BUILT TRANSACTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetaView {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Serializable form of an instruction for API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionView {
    pub program_id: String,
    pub accounts: Vec<AccountMetaView>,
    /// Base64 instruction data
    pub data: String,
}

impl From<&Instruction> for InstructionView {
    fn from(ix: &Instruction) -> Self {
        Self {
            program_id: ix.program_id.to_string(),
            accounts: ix
                .accounts
                .iter()
                .map(|meta| AccountMetaView {
                    pubkey: meta.pubkey.to_string(),
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: base64::engine::general_purpose::STANDARD.encode(&ix.data),
        }
    }
}

/// Account dropped during re-validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAccount {
    pub account: String,
    pub reason: String,
}

/// Unsigned transaction ready for the wallet to sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltTransaction {
    pub wallet: String,
    pub action: ReclaimAction,
    pub instructions: Vec<InstructionView>,
    pub blockhash: String,
    pub fee_payer: String,
    /// Base64 of the bincode-serialized unsigned transaction
    pub transaction: String,
    pub included: Vec<String>,
    pub skipped: Vec<SkippedAccount>,
    /// Totals over included accounts; `fees.fee` is the fee transfer amount
    pub fees: FeeBreakdown,
}
