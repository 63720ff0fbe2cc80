//! `multipart/form-data` support.
//!
//! Multipart bodies are decoded like url-encoded forms: the text fields are
//! collected up front and then fed through the form decoder. File parts are
//! skipped.

use std::convert::Infallible;

use bytes::Bytes;

use crate::error::CodecError;

/// Default maximum number of fields read from one body.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while collecting multipart fields.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum number of parts, files included.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Sets the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Reads the text fields of a multipart body, in order.
pub async fn collect_text_fields(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<Vec<(String, String)>, CodecError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| CodecError::Multipart(format!("missing or invalid boundary: {e}")))?;

    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = Vec::new();
    let mut seen = 0_usize;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CodecError::Multipart(e.to_string()))?
    {
        seen += 1;
        if seen > config.max_fields {
            return Err(CodecError::Multipart(format!(
                "too many fields (max {})",
                config.max_fields
            )));
        }
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| CodecError::Multipart(e.to_string()))?;
        fields.push((name, value));
    }

    Ok(fields)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match filename {
                Some(file) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_collects_text_fields_and_skips_files() {
        let body = multipart_body(
            "XyZ",
            &[
                ("name", None, "Alice"),
                ("avatar", Some("a.png"), "\u{1}\u{2}"),
                ("age", None, "30"),
            ],
        );

        let fields = collect_text_fields(
            "multipart/form-data; boundary=XyZ",
            Bytes::from(body),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            fields,
            vec![
                ("name".to_owned(), "Alice".to_owned()),
                ("age".to_owned(), "30".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let result = collect_text_fields(
            "multipart/form-data",
            Bytes::new(),
            &MultipartConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(CodecError::Multipart(_))));
    }

    #[tokio::test]
    async fn test_field_limit() {
        let body = multipart_body("b", &[("a", None, "1"), ("b", None, "2")]);
        let result = collect_text_fields(
            "multipart/form-data; boundary=b",
            Bytes::from(body),
            &MultipartConfig::default().max_fields(1),
        )
        .await;
        assert!(matches!(result, Err(CodecError::Multipart(_))));
    }
}
