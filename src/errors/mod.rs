//! Error taxonomy for the reclaim engine and the lock/vesting ledger
//!
//! Every failure that crosses the crate boundary carries a stable
//! [`ErrorKind`] plus a human-readable message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidAddress,
    InvalidRequest,
    InsufficientBalance,
    NotOwner,
    NotBeneficiary,
    NotFound,
    NotYetUnlocked,
    NotStarted,
    AlreadyRevoked,
    NotRevocable,
    NothingToClaim,
    EmptyBatch,
    MissingFeePayer,
    MissingBlockhash,
    UpstreamRateLimited,
    UpstreamUnavailable,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAddress => "INVALID_ADDRESS",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::NotOwner => "NOT_OWNER",
            ErrorKind::NotBeneficiary => "NOT_BENEFICIARY",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NotYetUnlocked => "NOT_YET_UNLOCKED",
            ErrorKind::NotStarted => "NOT_STARTED",
            ErrorKind::AlreadyRevoked => "ALREADY_REVOKED",
            ErrorKind::NotRevocable => "NOT_REVOCABLE",
            ErrorKind::NothingToClaim => "NOTHING_TO_CLAIM",
            ErrorKind::EmptyBatch => "EMPTY_BATCH",
            ErrorKind::MissingFeePayer => "MISSING_FEE_PAYER",
            ErrorKind::MissingBlockhash => "MISSING_BLOCKHASH",
            ErrorKind::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::Configuration => "CONFIGURATION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReclaimError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient balance in {account}: need {required}, have {available}")]
    InsufficientBalance {
        account: String,
        required: u64,
        available: u64,
    },

    #[error("{caller} is not the owner of {subject}")]
    NotOwner { subject: String, caller: String },

    #[error("{caller} is not the beneficiary of {id}")]
    NotBeneficiary { id: String, caller: String },

    #[error("No lock or vesting record with id {id}")]
    NotFound { id: String },

    #[error("Lock {id} unlocks at {unlock_time}")]
    NotYetUnlocked { id: String, unlock_time: i64 },

    #[error("Vesting {id} starts at {start_time}")]
    NotStarted { id: String, start_time: i64 },

    #[error("Record {id} has been revoked")]
    AlreadyRevoked { id: String },

    #[error("Record {id} is not revocable")]
    NotRevocable { id: String },

    #[error("Nothing to claim on {id}")]
    NothingToClaim { id: String },

    #[error("No account qualified for {action} after re-validation")]
    EmptyBatch { action: String },

    #[error("Assembled transaction has no fee payer")]
    MissingFeePayer,

    #[error("Assembled transaction has no recent blockhash")]
    MissingBlockhash,

    #[error("Rate limited by upstream on {method} after {attempts} attempts")]
    UpstreamRateLimited { method: String, attempts: u32 },

    #[error("Upstream unavailable on {method}: {message}")]
    UpstreamUnavailable { method: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Boundary shape of an error: stable kind plus message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    /// Set for upstream failures that may clear up on a later attempt
    pub retryable: bool,
}

pub type ReclaimResult<T> = Result<T, ReclaimError>;

impl ReclaimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReclaimError::InvalidAddress { .. } => ErrorKind::InvalidAddress,
            ReclaimError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ReclaimError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            ReclaimError::NotOwner { .. } => ErrorKind::NotOwner,
            ReclaimError::NotBeneficiary { .. } => ErrorKind::NotBeneficiary,
            ReclaimError::NotFound { .. } => ErrorKind::NotFound,
            ReclaimError::NotYetUnlocked { .. } => ErrorKind::NotYetUnlocked,
            ReclaimError::NotStarted { .. } => ErrorKind::NotStarted,
            ReclaimError::AlreadyRevoked { .. } => ErrorKind::AlreadyRevoked,
            ReclaimError::NotRevocable { .. } => ErrorKind::NotRevocable,
            ReclaimError::NothingToClaim { .. } => ErrorKind::NothingToClaim,
            ReclaimError::EmptyBatch { .. } => ErrorKind::EmptyBatch,
            ReclaimError::MissingFeePayer => ErrorKind::MissingFeePayer,
            ReclaimError::MissingBlockhash => ErrorKind::MissingBlockhash,
            ReclaimError::UpstreamRateLimited { .. } => ErrorKind::UpstreamRateLimited,
            ReclaimError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            ReclaimError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Upstream failures may succeed if the caller tries again later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReclaimError::UpstreamRateLimited { .. } | ReclaimError::UpstreamUnavailable { .. }
        )
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.is_recoverable(),
        }
    }

    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ReclaimError::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(method: impl Into<String>, message: impl Into<String>) -> Self {
        ReclaimError::UpstreamUnavailable {
            method: method.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ReclaimError {
    fn from(err: reqwest::Error) -> Self {
        ReclaimError::upstream("http", format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for ReclaimError {
    fn from(err: serde_json::Error) -> Self {
        ReclaimError::upstream("decode", format!("Malformed JSON: {}", err))
    }
}
