//! Per-request state shared by every context of one dispatch.
//!
//! The [`Exchange`] is owned by [`Router::handle`](crate::Router::handle) and
//! lent to each context in turn, so the response slot is a single cell for
//! the whole chain. Once a response has been committed, later commits are
//! dropped.

use std::net::{IpAddr, SocketAddr};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use waymark_codec::{CodecError, DynRender, Input, Negotiator};
use waymark_core::{BoxError, Error, ErrorClass};

use crate::body::{effective_limit, read_capped, RequestBody};
use crate::resolve::ErrorContext;
use crate::router::Shared;

/// Transport peer address of a request.
///
/// The serve loop inserts it as a request extension; requests dispatched
/// without one have no remote IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteAddr(pub SocketAddr);

pub(crate) struct Exchange {
    pub(crate) parts: Parts,
    body: Option<RequestBody>,
    remote_addr: Option<SocketAddr>,
    staged_headers: HeaderMap,
    response: Option<Response<Bytes>>,
    pub(crate) shared: Arc<Shared>,
}

impl Exchange {
    pub(crate) fn new<B>(request: Request<B>, shared: Arc<Shared>) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let remote_addr = parts.extensions.get::<RemoteAddr>().map(|addr| addr.0);
        Self {
            parts,
            body: Some(body.map_err(Into::<BoxError>::into).boxed_unsync()),
            remote_addr,
            staged_headers: HeaderMap::new(),
            response: None,
            shared,
        }
    }

    pub(crate) fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub(crate) fn remaining(&self, offset: usize) -> &str {
        self.path().get(offset..).unwrap_or_default()
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.response.is_some()
    }

    pub(crate) fn stage_header(&mut self, name: http::HeaderName, value: HeaderValue) {
        self.staged_headers.append(name, value);
    }

    pub(crate) fn remote_ip(&self) -> Option<IpAddr> {
        let peer = self.remote_addr?.ip();
        Some(match &self.shared.proxies {
            Some(table) => table.effective_ip(peer, &self.parts.headers),
            None => peer,
        })
    }

    /// Writes the response unless one was already written.
    pub(crate) fn commit(&mut self, mut response: Response<Bytes>) {
        if self.is_consumed() {
            tracing::debug!(status = %response.status(), "response already written, dropping");
            return;
        }

        let staged = std::mem::take(&mut self.staged_headers);
        for name in staged.keys() {
            if response.headers().contains_key(name) {
                continue;
            }
            for value in staged.get_all(name) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }

        self.response = Some(response);
    }

    /// Negotiates and commits `value`.
    pub(crate) fn render(&mut self, status: StatusCode, value: &dyn DynRender) -> Result<(), CodecError> {
        let response = Negotiator::new(&self.shared.codecs).render(&self.parts.headers, status, value)?;
        self.commit(response);
        Ok(())
    }

    /// Reads the capped request body. GET requests never read one.
    pub(crate) async fn read_body(&mut self) -> Result<Bytes, Error> {
        if self.parts.method == Method::GET {
            return Ok(Bytes::new());
        }
        match self.body.take() {
            Some(body) => read_capped(body, effective_limit(self.shared.max_body_size)).await,
            None => Ok(Bytes::new()),
        }
    }

    pub(crate) async fn input(&mut self) -> Result<Input, Error> {
        let body = self.read_body().await?;
        let input = Input::collect(
            &self.parts.method,
            &self.parts.uri,
            &self.parts.headers,
            body,
            &self.shared.multipart,
        )
        .await?;
        Ok(input)
    }

    /// Answers `err`: its user-facing rendering first, then the configured
    /// error handler, then the fixed fallback.
    pub(crate) fn resolve(&mut self, err: Error) {
        if self.is_consumed() {
            tracing::debug!(error = %err, "error raised after the response was written");
            return;
        }

        if let Some(facing) = err.as_user_facing() {
            match self.render(facing.status(), facing.body()) {
                Ok(()) => return,
                Err(render_err) => {
                    tracing::warn!(error = %render_err, "failed to render user-facing error");
                }
            }
        }

        if let Some(handler) = self.shared.error_handler.clone() {
            let output = {
                let ctx = ErrorContext::new(self);
                std::panic::catch_unwind(AssertUnwindSafe(|| handler(&ctx, &err)))
            };
            match output {
                Ok((body, status)) => match self.render(status, body.as_ref()) {
                    Ok(()) => return,
                    Err(render_err) => {
                        tracing::warn!(error = %render_err, "failed to render error handler output");
                    }
                },
                Err(_) => tracing::error!(error = %err, "error handler panicked"),
            }
        }

        let class = err.class();
        match class {
            ErrorClass::Internal => tracing::error!(error = %err, "request failed"),
            ErrorClass::BadRequest => tracing::debug!(error = %err, "bad request"),
            ErrorClass::RouteNotFound => tracing::debug!(path = %self.path(), "route not found"),
        }
        self.commit(fallback_response(class));
    }

    pub(crate) fn into_response(self) -> Response<Bytes> {
        self.response
            .unwrap_or_else(|| fallback_response(ErrorClass::RouteNotFound))
    }
}

/// Fixed `{"message": ...}` answer for an error class.
pub(crate) fn fallback_response(class: ErrorClass) -> Response<Bytes> {
    let body = Bytes::from(format!(r#"{{"message":"{}"}}"#, class.message()));
    let mut response = Response::new(body);
    *response.status_mut() = class.status();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let length = HeaderValue::from(response.body().len());
    response.headers_mut().insert(CONTENT_LENGTH, length);
    response
}
