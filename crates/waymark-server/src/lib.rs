//! # Waymark Server
//!
//! Continuation-based request dispatch for waymark.
//!
//! Routes are not declared up front as patterns. Each matcher carries a
//! continuation that runs once the matcher has claimed part of the path and
//! registers what comes next on a fresh [`Context`]: deeper matchers,
//! checks, method handlers or a WebSocket handler. The tree is therefore
//! built lazily, one request at a time, and can depend on anything already
//! known about the request.
//!
//! ```text
//! Router::handle
//!   └─ descend(matchers at "/")         literal & remainder first, then captures
//!        └─ continuation(ctx, value)    registers on the child context
//!             └─ after_execute          checks → upgrade → handler → descend
//! ```
//!
//! Exactly one response is written per request: the first commit wins and
//! later ones are dropped. Errors resolve through the user-facing body of
//! the error, then the router's error handler, then a fixed JSON body.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waymark_core::Error;
//! use waymark_server::{Router, Routes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::builder().build()?;
//!     router.literal("hello", |ctx| {
//!         ctx.string(|ctx, name| {
//!             ctx.get(move || async move { Ok::<_, Error>(format!("Hello, {name}")) });
//!         });
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     waymark_server::serve(listener, Arc::new(router)).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/waymark-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod context;
mod exchange;
mod handler;
mod resolve;
mod router;
mod routes;
mod serve;
mod shutdown;

pub use body::{RequestBody, DEFAULT_MAX_BODY_SIZE};
pub use context::Context;
pub use exchange::RemoteAddr;
pub use handler::{Handler, HandlerFuture};
pub use resolve::{ErrorContext, ErrorHandler};
pub use router::{BuildError, Router, RouterBuilder};
pub use routes::{route, Route, Routes};
pub use serve::{run, serve, serve_with_shutdown, ServeError, DEFAULT_SHUTDOWN_TIMEOUT};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
