//! # Waymark Core
//!
//! Types shared by every layer of the Waymark routing engine:
//!
//! - [`Error`] - the dispatch error taxonomy (route not found, bad request,
//!   user-facing, internal) and its fallback classification
//! - [`UserFacingError`] - an error that carries its own status and body
//! - [`TrustedProxies`] - the CIDR table that decides which forwarded
//!   client-IP header a peer is allowed to supply

#![doc(html_root_url = "https://docs.rs/waymark-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod proxy;

pub use error::{BoxError, Error, ErrorClass, UserFacingError, WaymarkResult};
pub use proxy::{ProxyTableError, TrustedProxies, KNOWN_PROXIES};
