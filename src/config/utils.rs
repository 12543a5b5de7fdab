/// Configuration utilities - loading and access helpers
use super::schemas::Config;
use crate::errors::ReclaimError;
use crate::logger::{LogLevel, LoggerConfig};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), ReclaimError> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults from the schema are used.
pub fn load_config_from_path(path: &str) -> Result<(), ReclaimError> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| ReclaimError::Configuration("Config already initialized".to_string()))
}

/// Parse a config file without touching the global instance
pub fn read_config_file(path: &str) -> Result<Config, ReclaimError> {
    if !std::path::Path::new(path).exists() {
        eprintln!("⚠️  Config file '{}' not found, using default values", path);
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        ReclaimError::Configuration(format!("Failed to read config file '{}': {}", path, e))
    })?;

    toml::from_str::<Config>(&contents).map_err(|e| {
        ReclaimError::Configuration(format!("Failed to parse config file '{}': {}", path, e))
    })
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when `load_config` has not run yet.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Clone of the entire configuration, usable across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Translate the logging section into a logger configuration
pub fn logger_config_from(config: &Config) -> LoggerConfig {
    let mut logger_config = LoggerConfig::default();
    if let Some(level) = LogLevel::parse(&config.logging.level) {
        logger_config.min_level = level;
    }
    logger_config.debug_tags = config
        .logging
        .debug_tags
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect();
    logger_config.file_path = config.logging.file_path.clone();
    logger_config
}
