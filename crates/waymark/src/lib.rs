//! # Waymark
//!
//! **Continuation-based HTTP routing for Rust services**
//!
//! Waymark matches a request path one segment at a time. Each matcher owns a
//! continuation that registers what comes next (deeper matchers, checks,
//! method handlers or a WebSocket handler) once it has claimed its part of
//! the path. Handler results are rendered in the first format the client's
//! `Accept` header asks for that the value supports, falling back to JSON.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waymark::prelude::*;
//!
//! #[derive(serde::Serialize)]
//! struct User {
//!     id: u64,
//! }
//!
//! impl Render for User {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::builder().build()?;
//!     router.literal("users", |ctx| {
//!         ctx.uint(|ctx, id| {
//!             ctx.get(move || async move { Ok::<_, Error>(User { id }) });
//!         });
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     waymark::server::serve(listener, Arc::new(router)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`router`] | path cursor, segment matchers, priority-ordered matcher sets |
//! | [`codec`] | formats, output negotiation, request body decoding |
//! | [`core`] | dispatch errors, trusted proxy table |
//! | [`ws`] | WebSocket handshake and connections |
//! | [`server`] | router, request context, serve loop |
//! | [`config`] | layered configuration |
//! | [`telemetry`] | logging setup |

#![doc(html_root_url = "https://docs.rs/waymark/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use waymark_codec as codec;
pub use waymark_config as config;
pub use waymark_core as core;
pub use waymark_router as router;
pub use waymark_server as server;
pub use waymark_telemetry as telemetry;
pub use waymark_ws as ws;

/// Prelude module for convenient imports.
///
/// ```rust
/// use waymark::prelude::*;
///
/// let mut router = Router::builder().build().unwrap();
/// router.literal("ping", |ctx| {
///     ctx.get(|| async { Ok::<_, Error>("pong") });
/// });
/// ```
pub mod prelude {
    pub use waymark_codec::{Capability, Html, Payload, RawBody, Redirect, Render};
    pub use waymark_core::{Error, UserFacingError, WaymarkResult};
    pub use waymark_server::{Context, ErrorContext, Router, RouterBuilder, Routes};
    pub use waymark_ws::{CloseCode, Message, UpgradedWebSocket, WebSocketConfig, WsError};
}
