//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::schema::{LoggingSettings, RouterSettings, ServerSettings};
use crate::ConfigError;

/// Complete waymark configuration.
///
/// # Example
///
/// ```
/// use waymark_config::WaymarkConfig;
///
/// let config = WaymarkConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.router.max_body_size, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WaymarkConfig {
    /// Serve loop settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Dispatch settings.
    #[serde(default)]
    pub router: RouterSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl WaymarkConfig {
    /// Checks values the schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable listen
    /// address, an empty log level or a zero multipart field limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.router.multipart_max_fields == 0 {
            return Err(ConfigError::invalid_value(
                "router.multipart_max_fields",
                "must be at least 1",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Debug logging in the pretty format.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = waymark_telemetry::LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_addr() {
        let mut config = WaymarkConfig::default();
        config.server.http_addr = "localhost".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.http_addr"
        ));
    }

    #[test]
    fn test_zero_multipart_fields() {
        let mut config = WaymarkConfig::default();
        config.router.multipart_max_fields = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_development_preset() {
        let config = WaymarkConfig::development();
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<WaymarkConfig, _> = toml::from_str("[metrics]\nenabled = true");
        assert!(result.is_err());
    }
}
