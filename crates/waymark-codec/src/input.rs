//! Request decoding.
//!
//! An [`Input`] is everything a decode target may look at: the method, the
//! query string, the media type and the (already size-capped) body. Targets
//! implement [`FromInput`]; tuples of targets decode from the same input.

use std::ops::Deref;

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::error::CodecError;
use crate::format::Format;
use crate::multipart::{collect_text_fields, MultipartConfig};

/// How a request body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// GET requests: the query string, never the body.
    Query,
    /// `application/json`
    Json,
    /// `application/xml`, `text/xml`
    Xml,
    /// `application/x-msgpack`, `application/msgpack`
    MsgPack,
    /// `application/yaml`, `text/yaml`, `application/x-yaml`
    Yaml,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `multipart/form-data`
    Multipart,
    /// Anything else, including a missing `Content-Type`.
    Other,
}

impl InputKind {
    /// Classifies a request by method and `Content-Type`.
    #[must_use]
    pub fn classify(method: &Method, content_type: Option<&str>) -> Self {
        if method == Method::GET {
            return Self::Query;
        }
        let Some(essence) = content_type.and_then(essence) else {
            return Self::Other;
        };
        match essence.as_str() {
            "application/json" => Self::Json,
            "application/xml" | "text/xml" => Self::Xml,
            "application/x-msgpack" | "application/msgpack" => Self::MsgPack,
            "application/yaml" | "text/yaml" | "application/x-yaml" => Self::Yaml,
            "application/x-www-form-urlencoded" => Self::Form,
            "multipart/form-data" => Self::Multipart,
            _ => Self::Other,
        }
    }
}

fn essence(content_type: &str) -> Option<String> {
    content_type
        .parse::<mime::Mime>()
        .ok()
        .map(|m| m.essence_str().to_ascii_lowercase())
}

/// Decodable view of one request.
#[derive(Debug, Clone)]
pub struct Input {
    kind: InputKind,
    query: Option<String>,
    body: Bytes,
    fields: Vec<(String, String)>,
}

impl Input {
    /// Creates an input from request parts and a body that was already read.
    ///
    /// Multipart fields are not collected; use [`Input::collect`] for that.
    #[must_use]
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        Self {
            kind: InputKind::classify(method, content_type),
            query: uri.query().map(str::to_owned),
            body,
            fields: Vec::new(),
        }
    }

    /// Creates an input and, for multipart bodies, collects the text fields.
    pub async fn collect(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
        config: &MultipartConfig,
    ) -> Result<Self, CodecError> {
        let mut input = Self::new(method, uri, headers, body);
        if input.kind == InputKind::Multipart {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            input.fields = collect_text_fields(content_type, input.body.clone(), config).await?;
        }
        Ok(input)
    }

    /// Returns how this input decodes.
    #[must_use]
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the collected multipart text fields.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Decodes the input into `T` according to its kind.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        match self.kind {
            InputKind::Query => self.decode_query(),
            InputKind::Form if self.body.is_empty() => self.decode_query(),
            InputKind::Form => {
                serde_urlencoded::from_bytes(&self.body).map_err(|e| CodecError::decode("form", e))
            }
            InputKind::Multipart => {
                let encoded = serde_urlencoded::to_string(&self.fields)
                    .map_err(|e| CodecError::decode("multipart", e))?;
                serde_urlencoded::from_str(&encoded).map_err(|e| CodecError::decode("multipart", e))
            }
            InputKind::Json | InputKind::Other => Format::Json.decode(&self.body),
            InputKind::Xml => Format::Xml.decode(&self.body),
            InputKind::MsgPack => Format::MsgPack.decode(&self.body),
            InputKind::Yaml => Format::Yaml.decode(&self.body),
        }
    }

    fn decode_query<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        serde_urlencoded::from_str(self.query().unwrap_or_default())
            .map_err(|e| CodecError::decode("query", e))
    }
}

/// A type that can be decoded from an [`Input`].
///
/// Implement this for custom decode targets:
///
/// ```rust
/// use waymark_codec::{CodecError, FromInput, Input};
///
/// struct Checksum(u32);
///
/// impl FromInput for Checksum {
///     fn from_input(input: &Input) -> Result<Self, CodecError> {
///         Ok(Checksum(input.body().iter().map(|b| u32::from(*b)).sum()))
///     }
/// }
/// ```
pub trait FromInput: Sized {
    /// Decodes the target.
    fn from_input(input: &Input) -> Result<Self, CodecError>;
}

impl FromInput for () {
    fn from_input(_input: &Input) -> Result<Self, CodecError> {
        Ok(())
    }
}

impl<T: FromInput> FromInput for Option<T> {
    fn from_input(input: &Input) -> Result<Self, CodecError> {
        Ok(T::from_input(input).ok())
    }
}

macro_rules! impl_from_input_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromInput),*> FromInput for ($($T,)*) {
            fn from_input(input: &Input) -> Result<Self, CodecError> {
                Ok(($($T::from_input(input)?,)*))
            }
        }
    };
}

impl_from_input_for_tuple!(A);
impl_from_input_for_tuple!(A, B);
impl_from_input_for_tuple!(A, B, C);

/// A body decoded by content type.
///
/// | Request | Decoder |
/// |---------|---------|
/// | `GET` | query string |
/// | JSON, XML, MessagePack, YAML | that format |
/// | url-encoded form | body, or the query string when the body is empty |
/// | multipart | text fields |
/// | anything else | JSON |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payload<T>(pub T);

impl<T> Payload<T> {
    /// Returns the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Payload<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromInput for Payload<T> {
    fn from_input(input: &Input) -> Result<Self, CodecError> {
        input.decode().map(Payload)
    }
}

/// The raw body bytes, whatever the content type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawBody(pub Bytes);

impl RawBody {
    /// Returns the body as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_inner(self) -> Bytes {
        self.0
    }
}

impl FromInput for RawBody {
    fn from_input(input: &Input) -> Result<Self, CodecError> {
        Ok(Self(input.body().clone()))
    }
}
