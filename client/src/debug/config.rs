//! Logging configuration from environment variables

use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    /// Log directory (for rotation)
    pub log_dir: PathBuf,
    /// File name prefix of the rolling log
    pub log_file_name: String,
    /// Log level filter (e.g., "client=debug,info")
    pub log_level: String,
    /// Write JSON lines instead of plain text
    pub json: bool,
    /// Mirror log output to stderr
    pub console: bool,
}

pub const DEFAULT_LOG_LEVEL: &str = "client=info,warn";

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file_name: "tiertreff.log".to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
            console: false,
        }
    }
}

fn flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl DebugConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_dir: std::env::var("TIERTREFF_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_file_name: defaults.log_file_name,
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            json: flag("TIERTREFF_LOG_JSON", false),
            console: flag("TIERTREFF_LOG_CONSOLE", false),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebugConfig::default();
        assert_eq!(config.log_file(), PathBuf::from("logs/tiertreff.log"));
        assert!(!config.is_debug_enabled());

        let verbose = DebugConfig {
            log_level: "client=trace".into(),
            ..config
        };
        assert!(verbose.is_debug_enabled());
    }
}
