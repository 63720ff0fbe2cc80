//! Wire formats and the content-type registry.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::CodecError;
use crate::render::{Capability, Render};

/// A wire format a value can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `application/json`
    Json,
    /// `application/xml`, `text/xml`
    Xml,
    /// MessagePack with structs encoded as maps, so serde field names and
    /// renames are kept on the wire.
    MsgPack,
    /// `application/yaml`, `text/yaml`
    Yaml,
    /// `text/plain`; requires [`Capability::Plain`].
    PlainText,
    /// `text/html`; requires [`Capability::Html`].
    Html,
}

impl Format {
    /// Returns the `Content-Type` to send for this format.
    ///
    /// JSON and plain text always use their canonical type; the other formats
    /// echo the token the client asked for.
    #[must_use]
    pub fn content_type<'a>(self, requested: &'a str) -> &'a str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain; charset=utf-8",
            Self::Xml | Self::MsgPack | Self::Yaml | Self::Html => requested,
        }
    }

    /// Renders `value` in this format.
    pub fn encode<T: Render>(self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Json => serde_json::to_vec(value).map_err(|e| CodecError::encode(self, e)),
            Self::Xml => {
                let root = value.xml_root().ok_or(CodecError::Unsupported(self))?;
                quick_xml::se::to_string_with_root(root, value)
                    .map(String::into_bytes)
                    .map_err(|e| CodecError::encode(self, e))
            }
            Self::MsgPack => rmp_serde::to_vec_named(value).map_err(|e| CodecError::encode(self, e)),
            Self::Yaml => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| CodecError::encode(self, e)),
            Self::PlainText => match value.capability() {
                Capability::Plain(text) => Ok(text.into_owned().into_bytes()),
                _ => Err(CodecError::Unsupported(self)),
            },
            Self::Html => match value.capability() {
                Capability::Html(markup) => Ok(markup.into_owned().into_bytes()),
                _ => Err(CodecError::Unsupported(self)),
            },
        }
    }

    /// Decodes `bytes` in this format.
    ///
    /// Plain text and HTML have no decoder.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, CodecError> {
        let name = self.name();
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| CodecError::decode(name, e)),
            Self::Xml => {
                let text = std::str::from_utf8(bytes).map_err(|e| CodecError::decode(name, e))?;
                quick_xml::de::from_str(text).map_err(|e| CodecError::decode(name, e))
            }
            Self::MsgPack => rmp_serde::from_slice(bytes).map_err(|e| CodecError::decode(name, e)),
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| CodecError::decode(name, e)),
            Self::PlainText | Self::Html => Err(CodecError::decode(name, "format has no decoder")),
        }
    }

    /// Short lowercase name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::MsgPack => "msgpack",
            Self::Yaml => "yaml",
            Self::PlainText => "text",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the registry: the media-type tokens that select a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecEntry {
    format: Format,
    tokens: Vec<String>,
}

impl CodecEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new<I, S>(format: Format, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The format this entry selects.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The tokens that select this entry.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn accepts(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(token))
    }
}

/// Ordered table mapping media-type tokens to formats.
///
/// The default table:
///
/// | Tokens | Format |
/// |--------|--------|
/// | `application/json`, `application/*`, `*/*` | JSON |
/// | `application/xml`, `text/xml` | XML |
/// | `application/x-msgpack`, `application/msgpack` | MessagePack |
/// | `text/plain`, `text/*` | plain text |
/// | `text/html`, `application/html` | HTML |
/// | `application/yaml`, `text/yaml` | YAML |
///
/// # Example
///
/// ```rust
/// use waymark_codec::{CodecRegistry, Format};
///
/// let mut registry = CodecRegistry::default();
/// assert_eq!(registry.lookup("*/*"), Some(Format::Json));
/// assert_eq!(registry.lookup("image/png"), None);
///
/// registry.register(Format::Json, "application/vnd.api+json");
/// assert_eq!(registry.lookup("application/vnd.api+json"), Some(Format::Json));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecRegistry {
    entries: Vec<CodecEntry>,
}

impl CodecRegistry {
    /// Creates a registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds `token` to the entry for `format`, appending a new entry if the
    /// format is not in the table yet.
    pub fn register(&mut self, format: Format, token: impl Into<String>) {
        let token = token.into();
        match self.entries.iter_mut().find(|e| e.format == format) {
            Some(entry) => entry.tokens.push(token),
            None => self.entries.push(CodecEntry::new(format, [token])),
        }
    }

    /// Finds the format selected by a media-type token.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<Format> {
        self.entries
            .iter()
            .find(|entry| entry.accepts(token))
            .map(CodecEntry::format)
    }

    /// Returns the entries in lookup order.
    #[must_use]
    pub fn entries(&self) -> &[CodecEntry] {
        &self.entries
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                CodecEntry::new(Format::Json, ["application/json", "application/*", "*/*"]),
                CodecEntry::new(Format::Xml, ["application/xml", "text/xml"]),
                CodecEntry::new(Format::MsgPack, ["application/x-msgpack", "application/msgpack"]),
                CodecEntry::new(Format::PlainText, ["text/plain", "text/*"]),
                CodecEntry::new(Format::Html, ["text/html", "application/html"]),
                CodecEntry::new(Format::Yaml, ["application/yaml", "text/yaml"]),
            ],
        }
    }
}
