//! Address validation and account decoding helpers
//!
//! Accounts arrive as `jsonParsed` JSON; when the node falls back to base64
//! (it does for mints it cannot parse) the raw bytes are unpacked with the
//! SPL Token layouts.

use crate::constants::{SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID};
use crate::errors::ReclaimError;
use crate::rpc::types::{MintFact, TokenAccountFact};
use base64::Engine;
use serde_json::Value;
use solana_program::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token::state::{Account as SplAccount, AccountState, Mint as SplMint};
use std::str::FromStr;

/// Parse any base58 public key (token accounts are often off-curve PDAs)
pub fn parse_pubkey(address: &str) -> Result<Pubkey, ReclaimError> {
    Pubkey::from_str(address.trim())
        .map_err(|e| ReclaimError::invalid_address(address, e.to_string()))
}

/// Parse a wallet address: well-formed and on the ed25519 curve
pub fn parse_wallet_address(address: &str) -> Result<Pubkey, ReclaimError> {
    let pubkey = parse_pubkey(address)?;
    if !pubkey.is_on_curve() {
        return Err(ReclaimError::invalid_address(
            address,
            "not on the ed25519 curve",
        ));
    }
    Ok(pubkey)
}

/// Which token program owns an account, if any
pub fn token_program_kind(owner_program: &str) -> Option<bool> {
    match owner_program {
        SPL_TOKEN_PROGRAM_ID => Some(false),
        TOKEN_2022_PROGRAM_ID => Some(true),
        _ => None,
    }
}

/// Decode a token account from an RPC account object
pub fn parse_token_account(address: &str, account: &Value) -> Result<TokenAccountFact, String> {
    let owner_program = account
        .get("owner")
        .and_then(|v| v.as_str())
        .ok_or("Missing owner program")?;
    let is_token_2022 = token_program_kind(owner_program)
        .ok_or_else(|| format!("Account {} is not owned by a token program", address))?;
    let lamports = account.get("lamports").and_then(|v| v.as_u64()).unwrap_or(0);
    let data = account.get("data").ok_or("Missing account data")?;

    if let Some(info) = data.get("parsed").and_then(|p| p.get("info")) {
        let account_type = data
            .get("parsed")
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
            .unwrap_or("account");
        if account_type != "account" {
            return Err(format!("Account {} is a {}, not a token account", address, account_type));
        }
        return parse_token_account_info(address, info, is_token_2022, lamports);
    }

    let bytes = decode_base64_data(data)?;
    if bytes.len() < SplAccount::LEN {
        return Err(format!(
            "Invalid token account data length: expected at least {}, got {}",
            SplAccount::LEN,
            bytes.len()
        ));
    }
    let unpacked = SplAccount::unpack_from_slice(&bytes[..SplAccount::LEN])
        .map_err(|e| format!("Failed to unpack token account: {}", e))?;

    Ok(TokenAccountFact {
        address: address.to_string(),
        owner: unpacked.owner.to_string(),
        mint: unpacked.mint.to_string(),
        amount: unpacked.amount.to_string(),
        // Raw layout carries no decimals; the mint fact supplies them later
        decimals: 0,
        is_initialized: unpacked.state != AccountState::Uninitialized,
        is_frozen: unpacked.state == AccountState::Frozen,
        is_native: unpacked.is_native.is_some(),
        is_token_2022,
        lamports,
    })
}

fn parse_token_account_info(
    address: &str,
    info: &Value,
    is_token_2022: bool,
    lamports: u64,
) -> Result<TokenAccountFact, String> {
    let mint = info.get("mint").and_then(|v| v.as_str()).ok_or("Missing mint")?;
    let owner = info.get("owner").and_then(|v| v.as_str()).ok_or("Missing owner")?;
    let token_amount = info.get("tokenAmount").ok_or("Missing tokenAmount")?;
    let amount = token_amount
        .get("amount")
        .and_then(|v| v.as_str())
        .ok_or("Missing amount")?;
    let decimals = token_amount
        .get("decimals")
        .and_then(|v| v.as_u64())
        .ok_or("Missing decimals")? as u8;
    let state = info.get("state").and_then(|v| v.as_str()).unwrap_or("initialized");

    Ok(TokenAccountFact {
        address: address.to_string(),
        owner: owner.to_string(),
        mint: mint.to_string(),
        amount: amount.to_string(),
        decimals,
        is_initialized: state != "uninitialized",
        is_frozen: state == "frozen",
        is_native: info.get("isNative").and_then(|v| v.as_bool()).unwrap_or(false),
        is_token_2022,
        lamports,
    })
}

/// Decode a mint from an RPC account object
pub fn parse_mint_account(address: &str, account: &Value) -> Result<MintFact, String> {
    let data = account.get("data").ok_or("Missing account data")?;

    if let Some(info) = data.get("parsed").and_then(|p| p.get("info")) {
        let decimals = info
            .get("decimals")
            .and_then(|v| v.as_u64())
            .ok_or("Missing decimals")? as u8;
        let supply = info
            .get("supply")
            .and_then(|v| v.as_str())
            .ok_or("Missing supply")?;
        return Ok(MintFact {
            address: address.to_string(),
            decimals,
            supply: supply.to_string(),
            has_mint_authority: info.get("mintAuthority").map_or(false, |v| !v.is_null()),
            has_freeze_authority: info.get("freezeAuthority").map_or(false, |v| !v.is_null()),
            is_initialized: info
                .get("isInitialized")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
        });
    }

    // Token-2022 mints carry extensions after the base layout
    let bytes = decode_base64_data(data)?;
    if bytes.len() < SplMint::LEN {
        return Err(format!(
            "Invalid mint data length: expected at least {}, got {}",
            SplMint::LEN,
            bytes.len()
        ));
    }
    let mint = SplMint::unpack_from_slice(&bytes[..SplMint::LEN])
        .map_err(|e| format!("Failed to unpack mint: {}", e))?;

    Ok(MintFact {
        address: address.to_string(),
        decimals: mint.decimals,
        supply: mint.supply.to_string(),
        has_mint_authority: mint.mint_authority.is_some(),
        has_freeze_authority: mint.freeze_authority.is_some(),
        is_initialized: mint.is_initialized,
    })
}

fn decode_base64_data(data: &Value) -> Result<Vec<u8>, String> {
    let encoded = data
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|v| v.as_str())
        .ok_or("Unsupported account data encoding")?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("Invalid base64 account data: {}", e))
}

/// Check if an error message indicates throttling
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit")
}
