//! The per-descent execution context.
//!
//! Dispatch walks the path one matcher at a time. Every time a matcher
//! claims part of the path, its continuation runs with a fresh child
//! [`Context`] positioned after the claimed part. The continuation only
//! *registers* things on the child (more matchers, checks, method handlers,
//! a WebSocket handler); once it returns, the child executes:
//!
//! 1. nothing happens if a response was already written;
//! 2. checks run in registration order, the first failure answers the request;
//! 3. with the path fully consumed, a GET carrying `Connection: upgrade` and
//!    `Upgrade: websocket` is upgraded if a WebSocket handler is registered;
//! 4. with the path fully consumed, the handler for the request method runs;
//! 5. otherwise the child's own matchers are tried against the rest of the
//!    path, highest priority first, until one of them writes a response.

use std::net::IpAddr;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::header::AsHeaderName;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use waymark_codec::DynRender;
use waymark_core::{Error, ErrorClass};
use waymark_router::{Matcher, MatcherKind, MatcherSet};
use waymark_ws::{is_upgrade_request, Handshake, UpgradedWebSocket, WebSocketConfig};

use crate::exchange::{fallback_response, Exchange};
use crate::handler::{boxed, BoxedHandler, Handler};
use crate::routes::{Route, Routes};

type Check = Box<dyn FnOnce() -> Result<(), Error> + Send>;

type SocketHandler = Box<dyn FnOnce(UpgradedWebSocket) -> BoxFuture<'static, Result<(), Error>> + Send>;

struct WebSocketBinding {
    config: WebSocketConfig,
    handler: SocketHandler,
}

/// Per-request routing state at one depth of the path.
///
/// See the [module documentation](self) for the execution order.
pub struct Context<'r> {
    exchange: &'r mut Exchange,
    offset: usize,
    matchers: MatcherSet<Route>,
    checks: Vec<Check>,
    handlers: Vec<(Method, BoxedHandler)>,
    websocket: Option<WebSocketBinding>,
}

impl<'r> Context<'r> {
    pub(crate) fn new(exchange: &'r mut Exchange, offset: usize) -> Self {
        Self {
            exchange,
            offset,
            matchers: MatcherSet::new(),
            checks: Vec::new(),
            handlers: Vec::new(),
            websocket: None,
        }
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

    /// Returns a request header as text, if present and visible ASCII.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers().get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the request extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.exchange.parts.extensions
    }

    /// Returns the part of the path no matcher has claimed yet.
    pub fn remaining_path(&self) -> &str {
        self.exchange.remaining(self.offset)
    }

    /// Returns `true` once a response has been written for this request.
    pub fn is_consumed(&self) -> bool {
        self.exchange.is_consumed()
    }

    /// Returns the client address.
    ///
    /// When the transport peer is a trusted proxy and sent its forwarded-IP
    /// header, that address is returned instead, unless automatic proxy
    /// detection was disabled on the router.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.exchange.remote_ip()
    }

    /// Adds a header to whatever response is eventually written.
    ///
    /// Headers set by negotiation (`Content-Type`, `Content-Length`) or by a
    /// redirect take precedence over staged ones with the same name.
    pub fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.exchange.stage_header(name, value);
    }

    /// Registers a pre-condition. Checks run in order before anything else
    /// registered on this context; the first error answers the request.
    pub fn check<F, E>(&mut self, check: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<Error>,
    {
        if self.is_consumed() {
            return;
        }
        self.checks.push(Box::new(move || check().map_err(Into::into)));
    }

    /// Registers a handler for `method`, run when the path is fully
    /// consumed. The first handler registered for a method wins.
    pub fn on<H, Args>(&mut self, method: Method, handler: H)
    where
        H: Handler<Args>,
    {
        if self.is_consumed() {
            return;
        }
        self.handlers.push((method, boxed(handler)));
    }

    /// Registers a GET handler.
    pub fn get<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::GET, handler);
    }

    /// Registers a POST handler.
    pub fn post<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::POST, handler);
    }

    /// Registers a PUT handler.
    pub fn put<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::PUT, handler);
    }

    /// Registers a DELETE handler.
    pub fn delete<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::DELETE, handler);
    }

    /// Registers a PATCH handler.
    pub fn patch<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::PATCH, handler);
    }

    /// Registers an OPTIONS handler.
    pub fn options<H: Handler<Args>, Args>(&mut self, handler: H) {
        self.on(Method::OPTIONS, handler);
    }

    /// Registers a WebSocket handler.
    ///
    /// An upgrade request for this path is answered with
    /// `101 Switching Protocols` and `handler` then owns the connection.
    /// Plain GET requests still reach the GET handler.
    pub fn websocket<F, Fut, E>(&mut self, config: WebSocketConfig, handler: F)
    where
        F: FnOnce(UpgradedWebSocket) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), E>> + Send + 'static,
        E: Into<Error>,
    {
        if self.is_consumed() {
            return;
        }
        self.websocket = Some(WebSocketBinding {
            config,
            handler: Box::new(move |socket| {
                async move { handler(socket).await.map_err(Into::into) }.boxed()
            }),
        });
    }

    pub(crate) fn after_execute(mut self) -> BoxFuture<'r, ()> {
        Box::pin(async move {
            if self.exchange.is_consumed() {
                return;
            }

            for check in std::mem::take(&mut self.checks) {
                if let Err(err) = check() {
                    tracing::debug!(error = %err, "check rejected request");
                    self.exchange.resolve(err);
                    return;
                }
            }

            if self.remaining_path().is_empty() {
                if *self.method() == Method::GET && is_upgrade_request(self.headers()) {
                    if let Some(binding) = self.websocket.take() {
                        upgrade(self.exchange, binding);
                        return;
                    }
                }

                let method = self.method().clone();
                let index = self.handlers.iter().position(|(m, _)| *m == method);
                if let Some(index) = index {
                    let (_, handler) = self.handlers.swap_remove(index);
                    run_handler(self.exchange, handler).await;
                    return;
                }
            }

            let Self {
                exchange,
                offset,
                matchers,
                ..
            } = self;
            descend(exchange, offset, &matchers).await;
        })
    }
}

impl Routes for Context<'_> {
    fn add_matcher(&mut self, kind: MatcherKind, route: Route) {
        if self.is_consumed() {
            return;
        }
        self.matchers.insert(Matcher::new(kind, route));
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("remaining_path", &self.remaining_path())
            .field("matchers", &self.matchers.len())
            .field("checks", &self.checks.len())
            .field("handlers", &self.handlers.len())
            .field("websocket", &self.websocket.is_some())
            .finish()
    }
}

/// Tries `matchers` against the path after `offset`, stopping at the first
/// subtree that writes a response.
pub(crate) async fn descend(exchange: &mut Exchange, offset: usize, matchers: &MatcherSet<Route>) {
    for matcher in matchers {
        let matched = {
            let remaining = exchange.remaining(offset);
            matcher
                .check(remaining)
                .map(|(value, rest)| (value, exchange.path().len() - rest.len()))
        };
        let Some((value, child_offset)) = matched else {
            continue;
        };

        tracing::trace!(matcher = %matcher.kind(), offset = child_offset, "matched");
        let mut child = Context::new(exchange, child_offset);
        let route = matcher.execute();
        route(&mut child, value);
        child.after_execute().await;

        if exchange.is_consumed() {
            return;
        }
    }
}

async fn run_handler(exchange: &mut Exchange, handler: BoxedHandler) {
    let value = match invoke(exchange, handler).await {
        Ok(value) => value,
        Err(err) => {
            exchange.resolve(err);
            return;
        }
    };

    let status = if value.absent() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::OK
    };
    if let Err(err) = exchange.render(status, value.as_ref()) {
        exchange.resolve(err.into());
    }
}

async fn invoke(exchange: &mut Exchange, handler: BoxedHandler) -> Result<Box<dyn DynRender>, Error> {
    let input = exchange.input().await?;
    handler(&input)?.await
}

fn upgrade(exchange: &mut Exchange, binding: WebSocketBinding) {
    let WebSocketBinding { config, handler } = binding;

    let response = Handshake::from_headers(&exchange.parts.headers, &config).and_then(|h| h.response());
    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting websocket handshake");
            exchange.commit(fallback_response(ErrorClass::BadRequest));
            return;
        }
    };

    let on_upgrade = exchange.parts.extensions.remove::<hyper::upgrade::OnUpgrade>();
    exchange.commit(response);

    let Some(on_upgrade) = on_upgrade else {
        tracing::warn!("transport does not support connection upgrades");
        return;
    };

    tokio::spawn(async move {
        match waymark_ws::accept(on_upgrade, config).await {
            Ok(socket) => {
                let id = socket.id();
                tracing::debug!(connection_id = %id, "websocket connected");
                if let Err(err) = handler(socket).await {
                    tracing::warn!(connection_id = %id, error = %err, "websocket handler failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "websocket upgrade failed"),
        }
    });
}
