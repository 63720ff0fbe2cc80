//! HTTP upgrade handshake (RFC 6455 §4.2).
//!
//! The handshake is split in two so the router can answer the request with
//! `101 Switching Protocols` through its normal response path and take over
//! the transport afterwards:
//!
//! 1. [`Handshake::from_headers`] validates the request and computes the
//!    `Sec-WebSocket-Accept` value; [`Handshake::response`] builds the 101.
//! 2. [`accept`] waits for hyper to release the connection and wraps it in a
//!    [`WebSocket`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{
    CONNECTION, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_PROTOCOL,
    SEC_WEBSOCKET_VERSION, UPGRADE,
};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use hyper::upgrade::{OnUpgrade, Upgraded};
use hyper_util::rt::TokioIo;
use sha1::{Digest, Sha1};
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;

use crate::config::WebSocketConfig;
use crate::connection::WebSocket;
use crate::error::{WsError, WsResult};

/// GUID appended to the client key before hashing.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Protocol version this crate speaks.
pub const WEBSOCKET_VERSION: &str = "13";

/// Connection type produced by [`accept`].
pub type UpgradedWebSocket = WebSocket<TokioIo<Upgraded>>;

/// Returns `true` if the request asks to switch to WebSocket: `Connection`
/// contains `upgrade` and `Upgrade` is `websocket`, both case-insensitive.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("upgrade"));

    let upgrade = headers
        .get(UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"));

    connection && upgrade
}

/// Computes `Sec-WebSocket-Accept` for a client key.
pub fn compute_accept_key(key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key);
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// A validated handshake, ready to be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    accept: String,
    protocol: Option<String>,
}

impl Handshake {
    /// Validates the request headers against `config`.
    ///
    /// The caller has already checked [`is_upgrade_request`]; this checks
    /// the version and key and picks the first client subprotocol the
    /// server also supports.
    pub fn from_headers(headers: &HeaderMap, config: &WebSocketConfig) -> WsResult<Self> {
        let version = headers
            .get(SEC_WEBSOCKET_VERSION)
            .ok_or_else(|| WsError::handshake("missing Sec-WebSocket-Version"))?;
        if version.as_bytes() != WEBSOCKET_VERSION.as_bytes() {
            return Err(WsError::handshake(format!(
                "unsupported version {:?}",
                String::from_utf8_lossy(version.as_bytes())
            )));
        }

        let key = headers
            .get(SEC_WEBSOCKET_KEY)
            .ok_or_else(|| WsError::handshake("missing Sec-WebSocket-Key"))?;
        let decoded = STANDARD
            .decode(key.as_bytes())
            .map_err(|_| WsError::handshake("Sec-WebSocket-Key is not base64"))?;
        if decoded.len() != 16 {
            return Err(WsError::handshake("Sec-WebSocket-Key must encode 16 bytes"));
        }

        Ok(Self {
            accept: compute_accept_key(key.as_bytes()),
            protocol: select_protocol(headers, &config.protocols),
        })
    }

    /// Returns the `Sec-WebSocket-Accept` value.
    pub fn accept_key(&self) -> &str {
        &self.accept
    }

    /// Returns the negotiated subprotocol.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Builds the `101 Switching Protocols` response.
    pub fn response(&self) -> WsResult<Response<Bytes>> {
        let mut response = Response::new(Bytes::new());
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;

        let headers = response.headers_mut();
        headers.insert(UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(CONNECTION, HeaderValue::from_static("Upgrade"));
        headers.insert(SEC_WEBSOCKET_ACCEPT, header_value(&self.accept)?);
        if let Some(protocol) = &self.protocol {
            headers.insert(SEC_WEBSOCKET_PROTOCOL, header_value(protocol)?);
        }

        Ok(response)
    }
}

fn header_value(value: &str) -> WsResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| WsError::handshake(format!("invalid header value {value:?}")))
}

fn select_protocol(headers: &HeaderMap, supported: &[String]) -> Option<String> {
    if supported.is_empty() {
        return None;
    }
    headers
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find(|offered| supported.iter().any(|name| name == offered))
        .map(str::to_owned)
}

/// Waits for hyper to hand over the transport and wraps it.
///
/// Resolves only after the 101 response has been flushed to the client.
pub async fn accept(on_upgrade: OnUpgrade, config: WebSocketConfig) -> WsResult<UpgradedWebSocket> {
    let upgraded = on_upgrade.await?;
    let stream = WebSocketStream::from_raw_socket(
        TokioIo::new(upgraded),
        Role::Server,
        Some(config.protocol_config()),
    )
    .await;
    Ok(WebSocket::new(stream, config))
}
