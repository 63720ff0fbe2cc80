//! # Waymark Test
//!
//! In-memory testing for waymark routers. Requests go through
//! [`Router::handle`](waymark_server::Router::handle) directly: no socket,
//! no port, the same dispatch as production.
//!
//! ## Example
//!
//! ```ignore
//! use http::StatusCode;
//! use waymark_test::TestClient;
//!
//! #[tokio::test]
//! async fn hello() {
//!     let client = TestClient::new(app_router());
//!
//!     client
//!         .get("/hello/world")
//!         .accept("text/plain")
//!         .send()
//!         .await
//!         .assert_status(StatusCode::OK)
//!         .assert_body_eq("Hello, world");
//! }
//! ```
//!
//! Every request carries a peer address of [`DEFAULT_REMOTE_ADDR`] unless
//! [`TestRequest::remote_addr`] says otherwise, so proxy resolution can be
//! exercised as well.

#![doc(html_root_url = "https://docs.rs/waymark-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestRequest, DEFAULT_REMOTE_ADDR};
pub use error::TestError;
pub use response::TestResponse;
