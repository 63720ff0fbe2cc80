//! The root of the route tree.
//!
//! A [`Router`] is built once, populated through [`Routes`], and then shared
//! (usually behind an `Arc`) by every connection. Each call to
//! [`Router::handle`] runs one dispatch and always produces a response.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use waymark_codec::{CodecRegistry, DynRender, MultipartConfig, Render};
use waymark_config::RouterSettings;
use waymark_core::{BoxError, Error, ProxyTableError, TrustedProxies};
use waymark_router::{Matcher, MatcherKind, MatcherSet};

use crate::context::descend;
use crate::exchange::{fallback_response, Exchange};
use crate::resolve::{ErrorContext, ErrorHandler};
use crate::routes::{Route, Routes};

/// Settings shared by every request dispatched through one router.
pub(crate) struct Shared {
    pub(crate) max_body_size: usize,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) proxies: Option<TrustedProxies>,
    pub(crate) codecs: CodecRegistry,
    pub(crate) multipart: MultipartConfig,
}

/// Error building a [`Router`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The trusted-proxy table could not be loaded.
    #[error("failed to load trusted proxy table: {0}")]
    ProxyTable(#[from] ProxyTableError),
}

/// Request router.
///
/// # Example
///
/// ```rust,ignore
/// use waymark_server::{Router, Routes};
///
/// let mut router = Router::builder().build()?;
/// router.literal("hello", |ctx| {
///     ctx.literal("world", |ctx| {
///         ctx.get(|| async { Ok::<_, waymark_core::Error>("Hello, world") });
///     });
/// });
/// ```
pub struct Router {
    routes: MatcherSet<Route>,
    shared: Arc<Shared>,
}

impl Router {
    /// Starts a [`RouterBuilder`].
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Returns the effective body limit in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        crate::body::effective_limit(self.shared.max_body_size)
    }

    /// Returns `true` if client addresses are resolved through a proxy table.
    #[must_use]
    pub fn resolves_proxies(&self) -> bool {
        self.shared.proxies.is_some()
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    /// Dispatches one request.
    ///
    /// Never fails: a request nothing answers gets a 404, errors are
    /// resolved to responses, and a panicking handler becomes a 500.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let mut exchange = Exchange::new(request, self.shared());
        tracing::debug!(method = %exchange.parts.method, path = %exchange.path(), "dispatching request");

        let outcome = AssertUnwindSafe(descend(&mut exchange, 0, &self.routes))
            .catch_unwind()
            .await;

        let unanswered = match outcome {
            Ok(()) if exchange.is_consumed() => None,
            Ok(()) => Some(Error::RouteNotFound),
            Err(payload) => Some(Error::from_panic(payload)),
        };
        if let Some(err) = unanswered {
            resolve_guarded(&mut exchange, err);
        }

        let response = exchange.into_response();
        tracing::debug!(status = %response.status(), "request finished");
        response.map(Full::new)
    }
}

impl Routes for Router {
    fn add_matcher(&mut self, kind: MatcherKind, route: Route) {
        self.routes.insert(Matcher::new(kind, route));
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("max_body_size", &self.max_body_size())
            .field("resolves_proxies", &self.resolves_proxies())
            .finish_non_exhaustive()
    }
}

/// Resolves `err`, falling back to the fixed body if rendering panics.
fn resolve_guarded(exchange: &mut Exchange, err: Error) {
    let class = err.class();
    let resolved = std::panic::catch_unwind(AssertUnwindSafe(|| exchange.resolve(err)));
    if resolved.is_err() {
        tracing::error!("error resolution panicked");
        exchange.commit(fallback_response(class));
    }
}

/// Builder for [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    max_body_size: usize,
    error_handler: Option<ErrorHandler>,
    disable_auto_proxy: bool,
    trusted_proxies: Option<TrustedProxies>,
    proxy_table_path: Option<PathBuf>,
    codecs: CodecRegistry,
    multipart: MultipartConfig,
}

impl RouterBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the router section of a loaded configuration.
    #[must_use]
    pub fn from_settings(settings: &RouterSettings) -> Self {
        let mut builder = Self::new()
            .max_body_size(settings.max_body_size)
            .multipart(MultipartConfig::default().max_fields(settings.multipart_max_fields));
        builder.disable_auto_proxy = settings.disable_auto_proxy;
        builder.proxy_table_path.clone_from(&settings.trusted_proxies_file);
        builder
    }

    /// Caps request bodies at `bytes`. Zero selects the 2 MiB default.
    ///
    /// Longer bodies are truncated, not rejected.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Installs a handler rendering errors that are not user-facing.
    #[must_use]
    pub fn error_handler<F, B>(mut self, handler: F) -> Self
    where
        F: Fn(&ErrorContext<'_>, &Error) -> (B, StatusCode) + Send + Sync + 'static,
        B: Render + Send + Sync + 'static,
    {
        self.error_handler = Some(erase_error_handler(handler));
        self
    }

    /// Turns off forwarded-address resolution; the transport peer is
    /// always the client address.
    #[must_use]
    pub fn disable_auto_proxy(mut self) -> Self {
        self.disable_auto_proxy = true;
        self
    }

    /// Uses `table` instead of the built-in proxy table.
    #[must_use]
    pub fn trusted_proxies(mut self, table: TrustedProxies) -> Self {
        self.trusted_proxies = Some(table);
        self
    }

    /// Loads the proxy table from `path` when the router is built.
    #[must_use]
    pub fn proxy_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxy_table_path = Some(path.into());
        self
    }

    /// Replaces the media-type table used for negotiation and decoding.
    #[must_use]
    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Sets multipart limits.
    #[must_use]
    pub fn multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Builds the router.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ProxyTable`] if the proxy table cannot be read
    /// or parsed.
    pub fn build(self) -> Result<Router, BuildError> {
        let proxies = if self.disable_auto_proxy {
            None
        } else if let Some(table) = self.trusted_proxies {
            Some(table)
        } else if let Some(path) = &self.proxy_table_path {
            Some(TrustedProxies::from_file(path)?)
        } else {
            Some(TrustedProxies::known()?)
        };

        if let Some(table) = &proxies {
            tracing::debug!(networks = table.len(), "trusted proxy table loaded");
        }

        Ok(Router {
            routes: MatcherSet::new(),
            shared: Arc::new(Shared {
                max_body_size: self.max_body_size,
                error_handler: self.error_handler,
                proxies,
                codecs: self.codecs,
                multipart: self.multipart,
            }),
        })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("max_body_size", &self.max_body_size)
            .field("error_handler", &self.error_handler.is_some())
            .field("disable_auto_proxy", &self.disable_auto_proxy)
            .field("proxy_table_path", &self.proxy_table_path)
            .finish_non_exhaustive()
    }
}

fn erase_error_handler<F, B>(handler: F) -> ErrorHandler
where
    F: Fn(&ErrorContext<'_>, &Error) -> (B, StatusCode) + Send + Sync + 'static,
    B: Render + Send + Sync + 'static,
{
    Arc::new(move |ctx: &ErrorContext<'_>, err: &Error| {
        let (body, status) = handler(ctx, err);
        (Box::new(body) as Box<dyn DynRender>, status)
    })
}
