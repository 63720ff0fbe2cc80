//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::parse_log_format;
use crate::{ConfigError, WaymarkConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "WAYMARK";

/// Loads a [`WaymarkConfig`] in layers, later layers overriding earlier
/// ones:
///
/// 1. built-in defaults
/// 2. a TOML or JSON file
/// 3. environment variables named `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use waymark_config::ConfigLoader;
///
/// # fn main() -> Result<(), waymark_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("waymark.toml")?
///     .with_env_prefix("WAYMARK")
///     .load()?;
///
/// println!("listening on {}", config.server.http_addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: WaymarkConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`WaymarkConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = WaymarkConfig::development();
        self
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// Sections the file leaves out keep their defaults; unknown fields are
    /// an error.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in `format` (`toml` or `json`).
    ///
    /// ```
    /// use waymark_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[router]\nmax_body_size = 1024", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.router.max_body_size, 1024);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `WAYMARK`, `WAYMARK__ROUTER__MAX_BODY_SIZE=4096` sets
    /// `router.max_body_size`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads `.env` from the current directory or its parents into the
    /// process environment. A missing file is not an error.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Reads a specific env file into the process environment.
    pub fn with_dotenv_path(self, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.into())?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<WaymarkConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but not the separator, e.g. WAYMARKER_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["ROUTER", "MAX_BODY_SIZE"] => config.router.max_body_size = parse_number(key, value)?,
            ["ROUTER", "DISABLE_AUTO_PROXY"] => {
                config.router.disable_auto_proxy = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["ROUTER", "TRUSTED_PROXIES_FILE"] => {
                config.router.trusted_proxies_file =
                    (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ["ROUTER", "MULTIPART_MAX_FIELDS"] => {
                config.router.multipart_max_fields = parse_number(key, value)?;
            }
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = parse_log_format(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            [section, field] => {
                return Err(ConfigError::unknown_field(
                    field.to_lowercase(),
                    section.to_lowercase(),
                ))
            }
            _ => return Err(ConfigError::env_parse_error(key, "expected PREFIX__SECTION__KEY")),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<WaymarkConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use waymark_telemetry::LogFormat;

    #[test]
    fn test_defaults_load() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, WaymarkConfig::default());
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:3000\"\n\n[router]\nmax_body_size = 4096\ndisable_auto_proxy = true"
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.router.max_body_size, 4096);
        assert!(config.router.disable_auto_proxy);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"logging": {{"level": "debug", "format": "pretty"}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_field_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[router]\nmax_body = 1").unwrap();

        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_files() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/waymark.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/waymark.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let result = ConfigLoader::new()
            .with_string("[server]\nhttp_addr = \"nowhere\"", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_dotenv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "WAYMARK_CONFIG_TEST_DOTENV=loaded").unwrap();

        ConfigLoader::new().with_dotenv_path(file.path()).unwrap();
        assert_eq!(env::var("WAYMARK_CONFIG_TEST_DOTENV").unwrap(), "loaded");
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__HTTP_ADDR", "192.168.1.1:9000", "TEST").unwrap();
        loader.apply_env_var("TEST__ROUTER__MAX_BODY_SIZE", "1024", "TEST").unwrap();
        loader.apply_env_var("TEST__ROUTER__DISABLE_AUTO_PROXY", "yes", "TEST").unwrap();
        loader.apply_env_var("TEST__ROUTER__TRUSTED_PROXIES_FILE", "/etc/proxies", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "Pretty", "TEST").unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.server.http_addr, "192.168.1.1:9000");
        assert_eq!(config.router.max_body_size, 1024);
        assert!(config.router.disable_auto_proxy);
        assert_eq!(config.router.trusted_proxies_file, Some(PathBuf::from("/etc/proxies")));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_errors() {
        let mut loader = ConfigLoader::new();
        assert!(matches!(
            loader.apply_env_var("TEST__ROUTER__MAX_BODY_SIZE", "lots", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("TEST__ROUTER__BODY_LIMIT", "1", "TEST"),
            Err(ConfigError::UnknownField { .. })
        ));
        assert!(loader.apply_env_var("TESTING", "1", "TEST").is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
