//! Renderable values.
//!
//! Every value a handler returns implements [`Render`]: it is `Serialize`
//! (for JSON, XML, YAML and MessagePack) and declares which textual
//! capability it has through [`Render::capability`]. The negotiator never
//! guesses: a value that does not declare [`Capability::Plain`] is simply
//! not renderable as `text/plain`.
//!
//! [`DynRender`] is the object-safe face of [`Render`], used wherever values
//! of different types have to be stored side by side (handler results,
//! user-facing error bodies).

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::CodecError;
use crate::format::Format;

/// The textual capability a value offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<'a> {
    /// The value converts to a plain string.
    Plain(Cow<'a, str>),
    /// The value renders itself as HTML.
    Html(Cow<'a, str>),
    /// Structured data only.
    Opaque,
}

/// A value that can be sent as a response body.
///
/// All methods have defaults, so for most types an empty impl is enough:
///
/// ```rust
/// use serde::Serialize;
/// use waymark_codec::Render;
///
/// #[derive(Serialize)]
/// struct Greeting {
///     message: String,
/// }
///
/// impl Render for Greeting {
///     fn xml_root(&self) -> Option<&str> {
///         Some("greeting")
///     }
/// }
/// ```
pub trait Render: Serialize {
    /// Textual capability. Defaults to [`Capability::Opaque`].
    fn capability(&self) -> Capability<'_> {
        Capability::Opaque
    }

    /// Root element name for XML. Values without one cannot be rendered as
    /// XML.
    fn xml_root(&self) -> Option<&str> {
        None
    }

    /// `true` for "nothing to send" values, which are answered with
    /// `204 No Content`.
    fn is_absent(&self) -> bool {
        false
    }

    /// Returns the redirect this value stands for, if any.
    fn as_redirect(&self) -> Option<&Redirect> {
        None
    }
}

/// Object-safe rendering, implemented for every [`Render`] type.
pub trait DynRender: Send + Sync {
    /// See [`Render::is_absent`].
    fn absent(&self) -> bool;

    /// See [`Render::as_redirect`].
    fn redirect(&self) -> Option<&Redirect>;

    /// Encodes the value in `format`.
    fn encode_as(&self, format: Format) -> Result<Vec<u8>, CodecError>;
}

impl<T: Render + Send + Sync> DynRender for T {
    fn absent(&self) -> bool {
        self.is_absent()
    }

    fn redirect(&self) -> Option<&Redirect> {
        self.as_redirect()
    }

    fn encode_as(&self, format: Format) -> Result<Vec<u8>, CodecError> {
        format.encode(self)
    }
}

impl std::fmt::Debug for dyn DynRender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DynRender")
    }
}

impl Render for String {
    fn capability(&self) -> Capability<'_> {
        Capability::Plain(Cow::Borrowed(self.as_str()))
    }
}

impl Render for &'static str {
    fn capability(&self) -> Capability<'_> {
        Capability::Plain(Cow::Borrowed(*self))
    }
}

impl Render for Cow<'static, str> {
    fn capability(&self) -> Capability<'_> {
        Capability::Plain(Cow::Borrowed(self.as_ref()))
    }
}

impl Render for () {
    fn is_absent(&self) -> bool {
        true
    }
}

impl<T: Render> Render for Option<T> {
    fn capability(&self) -> Capability<'_> {
        self.as_ref().map_or(Capability::Opaque, Render::capability)
    }

    fn xml_root(&self) -> Option<&str> {
        self.as_ref().and_then(Render::xml_root)
    }

    fn is_absent(&self) -> bool {
        self.as_ref().map_or(true, Render::is_absent)
    }

    fn as_redirect(&self) -> Option<&Redirect> {
        self.as_ref().and_then(Render::as_redirect)
    }
}

impl<T: Render> Render for Box<T> {
    fn capability(&self) -> Capability<'_> {
        (**self).capability()
    }

    fn xml_root(&self) -> Option<&str> {
        (**self).xml_root()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn as_redirect(&self) -> Option<&Redirect> {
        (**self).as_redirect()
    }
}

impl<T: Serialize> Render for Vec<T> {}

impl<K: Serialize, V: Serialize, S> Render for HashMap<K, V, S> {}

impl<K: Serialize, V: Serialize> Render for BTreeMap<K, V> {}

impl Render for serde_json::Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }
}

macro_rules! impl_render_for_scalar {
    ($($ty:ty),*) => {
        $(impl Render for $ty {})*
    };
}

impl_render_for_scalar!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// A pre-rendered HTML document.
///
/// Serialises as its markup string, so formats other than HTML still produce
/// something sensible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Html(pub String);

impl Html {
    /// Wraps markup.
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }
}

impl Render for Html {
    fn capability(&self) -> Capability<'_> {
        Capability::Html(Cow::Borrowed(self.0.as_str()))
    }
}

/// A redirect to another location.
///
/// Rendering a redirect skips negotiation and answers with
/// `307 Temporary Redirect` or `308 Permanent Redirect` and a `Location`
/// header.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use waymark_codec::Redirect;
///
/// assert_eq!(Redirect::temporary("/login").status(), StatusCode::TEMPORARY_REDIRECT);
/// assert_eq!(Redirect::permanent("/v2").status(), StatusCode::PERMANENT_REDIRECT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    location: String,
    permanent: bool,
}

impl Redirect {
    /// Creates a redirect with explicit permanence.
    #[must_use]
    pub fn new(location: impl Into<String>, permanent: bool) -> Self {
        Self {
            location: location.into(),
            permanent,
        }
    }

    /// Creates a temporary (307) redirect.
    #[must_use]
    pub fn temporary(location: impl Into<String>) -> Self {
        Self::new(location, false)
    }

    /// Creates a permanent (308) redirect.
    #[must_use]
    pub fn permanent(location: impl Into<String>) -> Self {
        Self::new(location, true)
    }

    /// Returns the target location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns `true` for permanent redirects.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    /// Returns the redirect status code.
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        if self.permanent {
            http::StatusCode::PERMANENT_REDIRECT
        } else {
            http::StatusCode::TEMPORARY_REDIRECT
        }
    }
}

impl Render for Redirect {
    fn as_redirect(&self) -> Option<&Redirect> {
        Some(self)
    }
}
