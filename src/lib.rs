pub mod cache;
pub mod config;
pub mod constants;
pub mod errors; // Structured error taxonomy
pub mod logger;
pub mod reclaim; // Rent reclamation: scan, classify, build
pub mod rpc;
pub mod tokens;
pub mod vesting; // Token locks and vesting schedules
