//! WebSocket support for the Waymark router.
//!
//! The router answers an upgrade request itself: it validates the request
//! with [`Handshake::from_headers`], commits the `101 Switching Protocols`
//! response built by [`Handshake::response`], and then hands the transport
//! to the registered handler through [`accept`].
//!
//! ```text
//! GET + Connection: upgrade + Upgrade: websocket
//!        │
//!        ▼
//! Handshake::from_headers ──► 101 response ──► accept(OnUpgrade) ──► handler(WebSocket)
//! ```
//!
//! Handshake failures are answered with `400 Bad Request` by the router and
//! never reach the handler.

#![doc(html_root_url = "https://docs.rs/waymark-ws/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod upgrade;

pub use config::WebSocketConfig;
pub use connection::{ConnectionId, WebSocket};
pub use error::{CloseCode, WsError, WsResult};
pub use message::{CloseFrame, Message};
pub use upgrade::{
    accept, compute_accept_key, is_upgrade_request, Handshake, UpgradedWebSocket, WEBSOCKET_GUID,
};
