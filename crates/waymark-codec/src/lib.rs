//! # Waymark Codec
//!
//! Content negotiation for the Waymark routing engine: which wire format a
//! response is rendered in, and how a request body is decoded.
//!
//! ## Rendering
//!
//! Handler results implement [`Render`]. A [`Negotiator`] walks the
//! request's `Accept` header (then `Content-Type`, then `application/json`)
//! and uses the first [`Format`] from the [`CodecRegistry`] that can encode
//! the value, falling back to JSON.
//!
//! ```rust
//! use http::{HeaderMap, HeaderValue, StatusCode};
//! use waymark_codec::{CodecRegistry, Negotiator};
//!
//! let registry = CodecRegistry::default();
//! let mut headers = HeaderMap::new();
//! headers.insert("accept", HeaderValue::from_static("text/plain"));
//!
//! let response = Negotiator::new(&registry)
//!     .render(&headers, StatusCode::OK, &"Hello, world".to_string())
//!     .unwrap();
//! assert_eq!(response.body().as_ref(), b"Hello, world");
//! ```
//!
//! ## Decoding
//!
//! | Target | Source |
//! |--------|--------|
//! | [`Payload<T>`] | body decoded by `Content-Type` (query string for GET) |
//! | [`RawBody`] | body bytes as-is |
//! | `(A, B)`, `(A, B, C)` | several targets from the same body |
//!
//! Decode failures are reported as [`CodecError::Decode`] and are the
//! client's fault.

#![doc(html_root_url = "https://docs.rs/waymark-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod format;
mod input;
mod multipart;
mod negotiate;
mod render;

pub use error::CodecError;
pub use format::{CodecEntry, CodecRegistry, Format};
pub use input::{FromInput, Input, InputKind, Payload, RawBody};
pub use multipart::{collect_text_fields, MultipartConfig, DEFAULT_MAX_FIELDS};
pub use negotiate::{candidates, preferred_media_types, Negotiator, DEFAULT_MEDIA_TYPE};
pub use render::{Capability, DynRender, Html, Redirect, Render};
