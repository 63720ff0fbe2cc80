//! Custom error rendering.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode, Uri};
use waymark_codec::DynRender;
use waymark_core::Error;

use crate::exchange::Exchange;

/// Installed error handler: maps a failed request to a body and status.
pub type ErrorHandler =
    Arc<dyn Fn(&ErrorContext<'_>, &Error) -> (Box<dyn DynRender>, StatusCode) + Send + Sync>;

/// Read-only view of the failed request, passed to the error handler.
pub struct ErrorContext<'a> {
    exchange: &'a Exchange,
}

impl<'a> ErrorContext<'a> {
    pub(crate) fn new(exchange: &'a Exchange) -> Self {
        Self { exchange }
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.exchange.parts.method
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.exchange.parts.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.exchange.parts.headers
    }

    /// Returns the effective client address.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.exchange.remote_ip()
    }
}

impl fmt::Debug for ErrorContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorContext")
            .field("method", self.method())
            .field("uri", self.uri())
            .finish_non_exhaustive()
    }
}
