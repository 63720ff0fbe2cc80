//! Matcher registration shared by [`Router`](crate::Router) and
//! [`Context`].

use std::sync::Arc;

use waymark_router::{Extracted, MatcherKind};

use crate::context::Context;

/// Continuation stored in a matcher: called with the child context and the
/// value the matcher extracted.
pub type Route = Arc<dyn Fn(&mut Context<'_>, Extracted) + Send + Sync>;

/// Wraps a closure into a [`Route`].
pub fn route<F>(continuation: F) -> Route
where
    F: Fn(&mut Context<'_>, Extracted) + Send + Sync + 'static,
{
    Arc::new(continuation)
}

/// Attaching matchers to a routing level.
///
/// Literal and remainder matchers are tried before numeric and string
/// captures at the same level; otherwise registration order decides.
///
/// # Example
///
/// ```rust,ignore
/// router.literal("users", |ctx| {
///     ctx.literal("me", |ctx| ctx.get(|| async { current_user().await }));
///     ctx.uint(|ctx, id| ctx.get(move || async move { load_user(id).await }));
/// });
/// ```
pub trait Routes {
    /// Attaches a matcher with a raw continuation.
    fn add_matcher(&mut self, kind: MatcherKind, route: Route);

    /// Matches one segment equal to `text`.
    fn literal<F>(&mut self, text: impl Into<String>, continuation: F)
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::literal(text),
            route(move |ctx, _| continuation(ctx)),
        );
    }

    /// Matches one segment parsing as an `i64`.
    fn int<F>(&mut self, continuation: F)
    where
        F: Fn(&mut Context<'_>, i64) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::SignedInt,
            route(move |ctx, value| {
                if let Extracted::Int(value) = value {
                    continuation(ctx, value);
                }
            }),
        );
    }

    /// Matches one segment parsing as a `u64`.
    fn uint<F>(&mut self, continuation: F)
    where
        F: Fn(&mut Context<'_>, u64) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::UnsignedInt,
            route(move |ctx, value| {
                if let Extracted::Uint(value) = value {
                    continuation(ctx, value);
                }
            }),
        );
    }

    /// Matches one segment parsing as an `f64`.
    fn float<F>(&mut self, continuation: F)
    where
        F: Fn(&mut Context<'_>, f64) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::Float,
            route(move |ctx, value| {
                if let Extracted::Float(value) = value {
                    continuation(ctx, value);
                }
            }),
        );
    }

    /// Matches one non-empty segment, percent-decoded.
    fn string<F>(&mut self, continuation: F)
    where
        F: Fn(&mut Context<'_>, String) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::String,
            route(move |ctx, value| {
                if let Extracted::Text(value) = value {
                    continuation(ctx, value);
                }
            }),
        );
    }

    /// Matches the whole rest of the path (more than a lone `/`), raw.
    fn remainder<F>(&mut self, continuation: F)
    where
        F: Fn(&mut Context<'_>, String) + Send + Sync + 'static,
    {
        self.add_matcher(
            MatcherKind::Remainder,
            route(move |ctx, value| {
                if let Extracted::Text(value) = value {
                    continuation(ctx, value);
                }
            }),
        );
    }
}
