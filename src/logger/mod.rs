//! Structured, tag-based logging for solreclaim
//!
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via `--debug-<tag>` flags or `logging.debug_tags` in config
//! - Dual output: colored console + optional log file
//!
//! ## Usage
//!
//! ```rust
//! use solreclaim::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "Ledger node unreachable");
//! logger::warning(LogTag::Builder, "Account no longer qualifies, skipping");
//! logger::info(LogTag::Reclaim, "Scan completed");
//! logger::debug(LogTag::Cache, "Mint facts hit"); // Only if --debug-cache
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Call once at startup, before any logging occurs. Scans command-line
/// arguments for debug flags and opens the log file if one is configured.
pub fn init() {
    config::init_from_args();
    file::init_file_logging(get_logger_config().file_path.as_deref());
}

/// Initialize with an explicit configuration (config file driven startup)
pub fn init_with(config: LoggerConfig) {
    let file_path = config.file_path.clone();
    set_logger_config(config);
    file::init_file_logging(file_path.as_deref());
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, shown only when debug is enabled for the tag
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, shown only with --verbose
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending log file writes
pub fn flush() {
    file::flush_file_logging();
}
