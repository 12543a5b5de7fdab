/// Configuration schemas - every config structure defined once with defaults
use crate::config_struct;
use crate::constants::{USDC_MINT, USDT_MINT, WSOL_MINT};

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// Ledger node endpoint and outbound call discipline
    pub struct RpcConfig {
        /// JSON-RPC endpoint of the ledger node
        url: String = "https://api.mainnet-beta.solana.com".to_string(),

        /// Deadline for a single outbound attempt
        call_timeout_secs: u64 = 15,

        /// Minimum spacing between successive outbound calls, process-wide
        min_call_spacing_ms: u64 = 500,

        /// Retry policy for throttled calls
        retry: RetryConfig = RetryConfig::default(),
    }
}

config_struct! {
    /// Exponential backoff settings applied to rate-limit errors
    pub struct RetryConfig {
        /// Total attempts including the first one
        max_attempts: u32 = 5,

        /// Delay before the first retry, doubled per attempt
        base_delay_ms: u64 = 1_000,

        /// Upper bound on a single backoff delay
        max_delay_ms: u64 = 16_000,
    }
}

// ============================================================================
// METADATA CONFIGURATION
// ============================================================================

config_struct! {
    /// Asset metadata index (DAS compatible JSON-RPC)
    pub struct MetadataConfig {
        /// Enable metadata lookups during scans
        enabled: bool = true,

        /// DAS endpoint; empty reuses the RPC url
        url: String = String::new(),

        /// Request timeout
        timeout_secs: u64 = 10,

        /// Maximum ids per getAssetBatch request
        batch_size: usize = 100,
    }
}

// ============================================================================
// RECLAIM CONFIGURATION
// ============================================================================

config_struct! {
    /// Account classification and transaction building
    pub struct ReclaimConfig {
        /// Wallet receiving the aggregated platform fee
        fee_wallet: String = String::new(),

        /// Mints never offered for burning
        non_burnable_mints: Vec<String> = vec![
            USDC_MINT.to_string(),
            USDT_MINT.to_string(),
            WSOL_MINT.to_string(),
        ],

        /// Upper bound on account ids accepted in one build request; accounts
        /// that would push the transaction past the packet size are still skipped
        max_accounts_per_transaction: usize = 20,
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// In-memory cache sizing
    pub struct CacheSettings {
        /// Mint facts TTL (decimals never change, supply rarely matters)
        mint_ttl_secs: u64 = 6 * 3600,

        /// Mint facts capacity
        mint_capacity: usize = 10_000,

        /// Metadata TTL
        metadata_ttl_secs: u64 = 3600,

        /// Metadata capacity
        metadata_capacity: usize = 5_000,

        /// Rent-exempt minimum TTL
        rent_ttl_secs: u64 = 600,
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

config_struct! {
    /// Logger settings (command-line flags are merged on top)
    pub struct LoggingConfig {
        /// Minimum level: error, warning, info, debug, verbose
        level: String = "info".to_string(),

        /// Tags with debug output enabled
        debug_tags: Vec<String> = Vec::new(),

        /// Optional log file path
        file_path: Option<String> = None,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        metadata: MetadataConfig = MetadataConfig::default(),
        reclaim: ReclaimConfig = ReclaimConfig::default(),
        cache: CacheSettings = CacheSettings::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}
