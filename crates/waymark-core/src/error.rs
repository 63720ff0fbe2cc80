//! Dispatch errors.
//!
//! Every failure that reaches the error resolver is an [`Error`]. Its
//! variants mirror how the failure is answered:
//!
//! | Variant | Default answer |
//! |---------|----------------|
//! | [`Error::RouteNotFound`] | `404 {"message":"Not Found"}` |
//! | [`Error::BadRequest`] | `400 {"message":"Bad Request"}` |
//! | [`Error::UserFacing`] | its own status and body |
//! | [`Error::Internal`] | `500 {"message":"Internal Server Error"}` |
//!
//! Classification looks through the whole `source()` chain, so a
//! [`UserFacingError`] wrapped in an `anyhow` context is still found.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;
use waymark_codec::{CodecError, DynRender, Redirect, Render};

/// Boxed error used as the cause of bad requests.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result type alias using [`Error`].
pub type WaymarkResult<T> = Result<T, Error>;

/// Fallback classes used when no custom rendering applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// No matcher or handler claimed the request.
    RouteNotFound,
    /// The request content was invalid.
    BadRequest,
    /// Everything else.
    Internal,
}

impl ErrorClass {
    /// Returns the status of the fixed fallback response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message of the fixed fallback response.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::RouteNotFound => "Not Found",
            Self::BadRequest => "Bad Request",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// An error that decides its own client-visible status and body.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use serde_json::json;
/// use waymark_core::{Error, UserFacingError};
///
/// fn lookup(id: u64) -> Result<String, Error> {
///     Err(UserFacingError::new(StatusCode::CONFLICT, json!({"id": id, "reason": "locked"})).into())
/// }
///
/// let err = lookup(7).unwrap_err();
/// assert_eq!(err.as_user_facing().unwrap().status(), StatusCode::CONFLICT);
/// ```
#[derive(Debug)]
pub struct UserFacingError {
    status: StatusCode,
    body: Box<dyn DynRender>,
    message: String,
}

impl UserFacingError {
    /// Creates a user-facing error.
    #[must_use]
    pub fn new<B>(status: StatusCode, body: B) -> Self
    where
        B: Render + Send + Sync + 'static,
    {
        Self {
            status,
            body: Box::new(body),
            message: status.canonical_reason().unwrap_or("error").to_owned(),
        }
    }

    /// Replaces the message used in logs and `Display`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the status to answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the body to render.
    #[must_use]
    pub fn body(&self) -> &dyn DynRender {
        self.body.as_ref()
    }
}

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status.as_u16())
    }
}

impl StdError for UserFacingError {}

/// Error raised while dispatching a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No matcher or handler claimed the request.
    #[error("route not found")]
    RouteNotFound,

    /// The request could not be decoded or failed validation.
    #[error("bad request: {0}")]
    BadRequest(#[source] BoxError),

    /// An error with its own status and body.
    #[error("{0}")]
    UserFacing(#[from] UserFacingError),

    /// Any other failure, including caught panics.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message (not sent to clients).
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl Error {
    /// Creates a bad-request error.
    #[must_use]
    pub fn bad_request(cause: impl Into<BoxError>) -> Self {
        Self::BadRequest(cause.into())
    }

    /// Creates a user-facing error.
    #[must_use]
    pub fn user_facing<B>(status: StatusCode, body: B) -> Self
    where
        B: Render + Send + Sync + 'static,
    {
        Self::UserFacing(UserFacingError::new(status, body))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source.
    #[must_use]
    pub fn internal_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Converts a caught panic payload into an internal error.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_owned());
        Self::internal(format!("handler panicked: {detail}"))
    }

    /// Iterates this error and all of its sources.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let root: &(dyn StdError + 'static) = self;
        std::iter::successors(Some(root), |&err| err.source())
    }

    /// Finds the first user-facing error in the chain.
    #[must_use]
    pub fn as_user_facing(&self) -> Option<&UserFacingError> {
        self.chain().find_map(|link| {
            link.downcast_ref::<UserFacingError>().or_else(|| match link.downcast_ref::<Self>() {
                Some(Self::UserFacing(inner)) => Some(inner),
                _ => None,
            })
        })
    }

    /// Returns `true` if any error in the chain is a route-not-found.
    #[must_use]
    pub fn is_route_not_found(&self) -> bool {
        self.chain()
            .any(|link| matches!(link.downcast_ref::<Self>(), Some(Self::RouteNotFound)))
    }

    /// Returns `true` if any error in the chain is a bad request.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.chain().any(|link| {
            matches!(link.downcast_ref::<Self>(), Some(Self::BadRequest(_)))
                || link.downcast_ref::<CodecError>().is_some_and(CodecError::is_decode)
        })
    }

    /// Returns the fallback class: route-not-found wins over bad-request,
    /// everything else is internal.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        if self.is_route_not_found() {
            ErrorClass::RouteNotFound
        } else if self.is_bad_request() {
            ErrorClass::BadRequest
        } else {
            ErrorClass::Internal
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => Self::Internal {
                message: err.to_string(),
                source: Some(err),
            },
        }
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        if err.is_decode() {
            Self::BadRequest(Box::new(err))
        } else {
            Self::internal_with_source("failed to render response", err)
        }
    }
}

impl From<Redirect> for Error {
    fn from(redirect: Redirect) -> Self {
        let status = redirect.status();
        Self::UserFacing(UserFacingError::new(status, redirect).with_message("redirect"))
    }
}
