//! Codec error types.

use crate::format::Format;

/// Error raised while rendering a value or decoding a request.
///
/// Rendering errors are recoverable during negotiation (the next candidate
/// format is tried); decoding errors are always the client's fault.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value does not offer the capability a format requires, such as a
    /// string conversion for `text/plain`.
    #[error("value cannot be rendered as {0}")]
    Unsupported(Format),

    /// The serializer for a format failed.
    #[error("failed to encode {format}: {message}")]
    Encode {
        /// Format being produced.
        format: Format,
        /// Serializer message.
        message: String,
    },

    /// The body could not be decoded into the requested target.
    #[error("failed to decode {source_name}: {message}")]
    Decode {
        /// What was being decoded (`json`, `query`, `form`, ...).
        source_name: &'static str,
        /// Deserializer message.
        message: String,
    },

    /// Multipart parsing failed.
    #[error("malformed multipart body: {0}")]
    Multipart(String),

    /// A redirect target cannot be used as a `Location` header.
    #[error("invalid redirect location: {0:?}")]
    InvalidRedirect(String),

    /// A response header could not be built.
    #[error("invalid response header: {0}")]
    InvalidHeader(String),
}

impl CodecError {
    /// Creates an encode error.
    #[must_use]
    pub fn encode(format: Format, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(source_name: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            source_name,
            message: message.to_string(),
        }
    }

    /// Returns `true` for errors caused by the request content.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Multipart(_))
    }
}
