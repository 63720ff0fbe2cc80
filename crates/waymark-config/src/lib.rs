//! Typed configuration for waymark.
//!
//! [`WaymarkConfig`] has three sections:
//!
//! - [`ServerSettings`]: listen address and shutdown timeout
//! - [`RouterSettings`]: body cap, proxy handling, multipart limits
//! - [`LoggingSettings`]: level and output format
//!
//! [`ConfigLoader`] layers defaults, a file and the environment.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//!
//! [router]
//! max_body_size = 0              # 0 selects 2 MiB
//! disable_auto_proxy = false
//! trusted_proxies_file = "/etc/waymark/proxies.txt"
//! multipart_max_fields = 100
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/waymark-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::WaymarkConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LoggingSettings, RouterSettings, ServerSettings};
pub use waymark_telemetry::LogFormat;
