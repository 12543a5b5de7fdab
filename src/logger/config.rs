/// Logger configuration and per-tag debug gating
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level printed (Debug/Verbose still require tag gating)
    pub min_level: LogLevel,
    /// Tags with debug output enabled (`--debug-<tag>`)
    pub debug_tags: HashSet<String>,
    /// Tags with verbose output enabled (`--verbose-<tag>`)
    pub verbose_tags: HashSet<String>,
    /// Optional log file path
    pub file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            file_path: None,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build configuration from process arguments
pub fn init_from_args() {
    let args: Vec<String> = std::env::args().collect();
    let mut config = get_logger_config();
    apply_args(&mut config, &args);
    set_logger_config(config);
}

fn apply_args(config: &mut LoggerConfig, args: &[String]) {
    for arg in args {
        if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if arg == "--quiet" {
            config.min_level = LogLevel::Error;
        } else if let Some(tag) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(tag.to_lowercase());
        } else if let Some(tag) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(tag.to_lowercase());
        }
    }
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    config.min_level >= LogLevel::Debug && config.debug_tags.is_empty()
        || config.debug_tags.contains(&tag.to_debug_key())
        || config.debug_tags.contains("all")
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_args_collects_debug_tags() {
        let mut config = LoggerConfig::default();
        let args = vec![
            "solreclaim".to_string(),
            "--debug-rpc".to_string(),
            "--verbose-cache".to_string(),
        ];
        apply_args(&mut config, &args);

        assert!(config.debug_tags.contains("rpc"));
        assert!(config.verbose_tags.contains("cache"));
        assert_eq!(config.min_level, LogLevel::Info);
    }

    #[test]
    fn test_quiet_lowers_threshold() {
        let mut config = LoggerConfig::default();
        apply_args(&mut config, &["--quiet".to_string()]);
        assert_eq!(config.min_level, LogLevel::Error);
    }
}
