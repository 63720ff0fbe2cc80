//! Structured logging for waymark services.
//!
//! Every waymark crate logs through [`tracing`]. This crate installs the
//! subscriber that turns those events into output: JSON lines for
//! production, or a multi-line pretty format while developing.
//!
//! `RUST_LOG` takes precedence over the configured level when it is set.
//!
//! # Example
//!
//! ```rust,ignore
//! use waymark_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig::default().format(LogFormat::Pretty))?;
//! tracing::info!(addr = "0.0.0.0:8080", "starting");
//! ```

#![doc(html_root_url = "https://docs.rs/waymark-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
