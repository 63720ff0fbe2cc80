//! Request body reading.

use bytes::{Bytes, BytesMut};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use waymark_core::{BoxError, Error};

/// Default body limit: 2 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Type-erased request body.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Reads at most `limit` bytes of `body`.
///
/// Anything past the limit is dropped rather than rejected; a truncated
/// document then fails to decode and is answered as a bad request.
pub(crate) async fn read_capped(mut body: RequestBody, limit: usize) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();

    while buf.len() < limit {
        let Some(frame) = body.frame().await else {
            break;
        };
        let frame = frame.map_err(Error::bad_request)?;
        if let Ok(data) = frame.into_data() {
            let room = limit - buf.len();
            if data.len() > room {
                tracing::debug!(limit, "request body truncated");
                buf.extend_from_slice(&data[..room]);
                break;
            }
            buf.extend_from_slice(&data);
        }
    }

    Ok(buf.freeze())
}

/// Resolves the configured limit, where zero means the default.
pub(crate) const fn effective_limit(configured: usize) -> usize {
    if configured == 0 {
        DEFAULT_MAX_BODY_SIZE
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{Full, StreamBody};
    use hyper::body::Frame;

    fn boxed(data: &'static [u8]) -> RequestBody {
        Full::new(Bytes::from_static(data))
            .map_err(|never| match never {})
            .boxed_unsync()
    }

    #[tokio::test]
    async fn test_reads_whole_body_under_limit() {
        let bytes = read_capped(boxed(b"hello"), 16).await.unwrap();
        assert_eq!(bytes.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_truncates_at_limit() {
        let bytes = read_capped(boxed(b"0123456789"), 4).await.unwrap();
        assert_eq!(bytes.as_ref(), b"0123");
    }

    #[tokio::test]
    async fn test_truncates_across_frames() {
        let chunks: Vec<Result<Frame<Bytes>, BoxError>> = vec![
            Ok(Frame::data(Bytes::from_static(b"abc"))),
            Ok(Frame::data(Bytes::from_static(b"def"))),
            Ok(Frame::data(Bytes::from_static(b"ghi"))),
        ];
        let body = StreamBody::new(futures_util::stream::iter(chunks)).boxed_unsync();

        let bytes = read_capped(body, 5).await.unwrap();
        assert_eq!(bytes.as_ref(), b"abcde");
    }

    #[test]
    fn test_zero_means_default() {
        assert_eq!(effective_limit(0), DEFAULT_MAX_BODY_SIZE);
        assert_eq!(effective_limit(10), 10);
    }
}
