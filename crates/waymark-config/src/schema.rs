//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with
//! defaults, so a file only needs to name what it changes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use waymark_telemetry::{LogConfig, LogFormat};

/// Serve loop settings.
///
/// # Example
///
/// ```
/// use waymark_config::ServerSettings;
///
/// let settings = ServerSettings::default();
/// assert_eq!(settings.http_addr, "0.0.0.0:8080");
/// assert_eq!(settings.shutdown_timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Listen address, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// How long open connections may take to finish after shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    /// Returns the shutdown timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Dispatch settings applied when the router is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterSettings {
    /// Request body cap in bytes; `0` selects the 2 MiB default.
    #[serde(default)]
    pub max_body_size: usize,

    /// Always use the transport peer as the client address.
    #[serde(default)]
    pub disable_auto_proxy: bool,

    /// Replaces the built-in trusted proxy table.
    #[serde(default)]
    pub trusted_proxies_file: Option<PathBuf>,

    /// Maximum number of parts read from a multipart body.
    #[serde(default = "default_multipart_max_fields")]
    pub multipart_max_fields: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_body_size: 0,
            disable_auto_proxy: false,
            trusted_proxies_file: None,
            multipart_max_fields: default_multipart_max_fields(),
        }
    }
}

fn default_multipart_max_fields() -> usize {
    100
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default filter directive. `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line of each event.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

impl LoggingSettings {
    /// Converts to the subscriber configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parses a log format name, case-insensitively.
pub(crate) fn parse_log_format(value: &str) -> Option<LogFormat> {
    match value.to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_defaults() {
        let settings = RouterSettings::default();
        assert_eq!(settings.max_body_size, 0);
        assert!(!settings.disable_auto_proxy);
        assert_eq!(settings.multipart_max_fields, 100);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let settings: RouterSettings = toml::from_str("disable_auto_proxy = true").unwrap();
        assert!(settings.disable_auto_proxy);
        assert_eq!(settings.multipart_max_fields, 100);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RouterSettings, _> = toml::from_str("body_limit = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_conversion() {
        let settings: LoggingSettings =
            toml::from_str("level = \"debug\"\nformat = \"pretty\"\ninclude_location = true").unwrap();
        let config = settings.to_log_config();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file_line_info);
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("JSON"), Some(LogFormat::Json));
        assert_eq!(parse_log_format("pretty"), Some(LogFormat::Pretty));
        assert_eq!(parse_log_format("xml"), None);
    }
}
