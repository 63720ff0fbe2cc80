//! Output negotiation.
//!
//! Picks the wire format for a value from the request headers and renders
//! the response head and body.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, Response, StatusCode};

use crate::error::CodecError;
use crate::format::{CodecRegistry, Format};
use crate::render::{DynRender, Redirect};

/// Media type assumed when the request names none.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Chooses formats and renders values against a [`CodecRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Negotiator<'a> {
    registry: &'a CodecRegistry,
}

impl<'a> Negotiator<'a> {
    /// Creates a negotiator over `registry`.
    #[must_use]
    pub const fn new(registry: &'a CodecRegistry) -> Self {
        Self { registry }
    }

    /// Renders `value` with `status` for a request carrying `headers`.
    ///
    /// * `204 No Content` writes no body at all.
    /// * A redirect value answers with 307/308 and `Location`.
    /// * Otherwise each media type of `Accept` (falling back to
    ///   `Content-Type`, then `application/json`) is tried in header order;
    ///   the first one whose format can encode the value wins. When none
    ///   does, JSON is used.
    pub fn render(
        &self,
        headers: &HeaderMap,
        status: StatusCode,
        value: &dyn DynRender,
    ) -> Result<Response<Bytes>, CodecError> {
        if status == StatusCode::NO_CONTENT {
            return Ok(empty(status));
        }

        if let Some(redirect) = value.redirect() {
            return redirect_response(redirect);
        }

        for token in candidates(preferred_media_types(headers)) {
            let Some(format) = self.registry.lookup(token) else {
                continue;
            };
            match value.encode_as(format) {
                Ok(body) => return with_body(status, format.content_type(token), body),
                Err(err) => {
                    tracing::trace!(%token, error = %err, "candidate format rejected, trying next");
                }
            }
        }

        let body = value.encode_as(Format::Json)?;
        with_body(status, DEFAULT_MEDIA_TYPE, body)
    }
}

/// Returns the header value negotiation reads: `Accept`, else
/// `Content-Type`, else `application/json`. Empty headers count as absent.
#[must_use]
pub fn preferred_media_types(headers: &HeaderMap) -> &str {
    [ACCEPT, CONTENT_TYPE]
        .iter()
        .find_map(|name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.trim().is_empty())
        })
        .unwrap_or(DEFAULT_MEDIA_TYPE)
}

/// Splits a media-type list into bare tokens, in header order.
///
/// Parameters such as `q=0.8` or `charset=utf-8` are dropped; no ranking is
/// applied.
pub fn candidates(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(',')
        .map(|item| item.split(';').next().unwrap_or_default().trim())
        .filter(|token| !token.is_empty())
}

fn empty(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn redirect_response(redirect: &Redirect) -> Result<Response<Bytes>, CodecError> {
    let location = HeaderValue::from_str(redirect.location())
        .map_err(|_| CodecError::InvalidRedirect(redirect.location().to_owned()))?;
    let mut response = empty(redirect.status());
    response.headers_mut().insert(LOCATION, location);
    response
        .headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from(0_u64));
    Ok(response)
}

fn with_body(
    status: StatusCode,
    content_type: &str,
    body: Vec<u8>,
) -> Result<Response<Bytes>, CodecError> {
    let content_type = HeaderValue::from_str(content_type)
        .map_err(|e| CodecError::InvalidHeader(e.to_string()))?;
    let length = HeaderValue::from(body.len());
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response.headers_mut().insert(CONTENT_LENGTH, length);
    Ok(response)
}
