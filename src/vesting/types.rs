//! Lock and vesting records

use crate::errors::ReclaimError;
use crate::reclaim::InstructionView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VestingType {
    /// Proportional to elapsed time
    Linear,
    /// Everything at the cliff
    Cliff,
    /// Whole 30-day months
    Step,
}

impl fmt::Display for VestingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VestingType::Linear => "linear",
            VestingType::Cliff => "cliff",
            VestingType::Step => "step",
        })
    }
}

impl FromStr for VestingType {
    type Err = ReclaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(VestingType::Linear),
            "cliff" => Ok(VestingType::Cliff),
            "step" => Ok(VestingType::Step),
            other => Err(ReclaimError::InvalidRequest(format!(
                "unknown vesting type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    PartiallyClaimed,
    /// Lock claimed or vesting fully released
    Completed,
    Revoked,
}

/// Time lock; all amounts in raw token units, times in unix seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLock {
    pub id: String,
    pub token_mint: String,
    pub token_account: String,
    pub owner: String,
    pub beneficiary: String,
    pub total_amount: u64,
    pub locked_amount: u64,
    pub unlock_time: i64,
    pub is_revocable: bool,
    pub is_revoked: bool,
    pub decimals: u8,
    pub is_token_2022: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TokenLock {
    pub fn status(&self) -> RecordStatus {
        if self.is_revoked {
            RecordStatus::Revoked
        } else if self.locked_amount == 0 {
            RecordStatus::Completed
        } else {
            RecordStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub id: String,
    pub token_mint: String,
    pub token_account: String,
    pub owner: String,
    pub beneficiary: String,
    pub total_amount: u64,
    /// Cumulative amount already released to the beneficiary
    pub vested_amount: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub cliff_time: Option<i64>,
    pub vesting_type: VestingType,
    pub is_revocable: bool,
    pub is_revoked: bool,
    pub decimals: u8,
    pub is_token_2022: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl VestingSchedule {
    pub fn status(&self) -> RecordStatus {
        if self.is_revoked {
            RecordStatus::Revoked
        } else if self.vested_amount >= self.total_amount {
            RecordStatus::Completed
        } else if self.vested_amount > 0 {
            RecordStatus::PartiallyClaimed
        } else {
            RecordStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLockRequest {
    pub token_mint: String,
    pub token_account: String,
    pub beneficiary: String,
    pub amount: u64,
    pub unlock_time: i64,
    #[serde(default)]
    pub is_revocable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVestingRequest {
    pub token_mint: String,
    pub token_account: String,
    pub beneficiary: String,
    pub amount: u64,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub cliff_time: Option<i64>,
    pub vesting_type: VestingType,
    #[serde(default)]
    pub is_revocable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
    pub transfer_instruction: InstructionView,
}

/// Result of a claim or revoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub id: String,
    pub amount: u64,
    pub transfer_instruction: InstructionView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecords {
    pub locks: Vec<TokenLock>,
    pub vestings: Vec<VestingSchedule>,
}

/// What a beneficiary could claim right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimQuote {
    pub id: String,
    pub total_amount: u64,
    pub released_amount: u64,
    pub claimable_amount: u64,
    pub status: RecordStatus,
    pub as_of: i64,
}
