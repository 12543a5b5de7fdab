/// Global constants used across solreclaim
///
/// System-wide values that are not configurable.

// ============================================================================
// PROGRAM IDS
// ============================================================================

/// SPL Token program
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 (Token Extensions) program
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

// ============================================================================
// MINTS
// ============================================================================

/// Wrapped SOL mint
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

// ============================================================================
// ACCOUNT LAYOUT
// ============================================================================

/// Byte size of a plain token account; every reclaim uses its rent-exempt minimum
pub const TOKEN_ACCOUNT_SIZE: usize = 165;

/// Lamports per SOL (10^9)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Maximum pubkeys per getMultipleAccounts request
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Converts lamports to SOL for display only
pub fn lamports_to_sol(lamports: u64) -> f64 {
    (lamports as f64) / (LAMPORTS_PER_SOL as f64)
}
