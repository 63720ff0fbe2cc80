//! Method handlers.
//!
//! A handler is an async closure whose parameters are decode targets:
//!
//! ```rust,ignore
//! ctx.get(|| async { Ok::<_, Error>("pong") });
//! ctx.post(|Payload(user): Payload<NewUser>| async move { store(user).await });
//! ctx.put(|raw: RawBody, Payload(meta): Payload<Meta>| async move { /* ... */ });
//! ```
//!
//! Targets are decoded from the same capped body before the handler is
//! called; any decode failure is a bad request and the handler never runs.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use waymark_codec::{DynRender, FromInput, Input, Render};
use waymark_core::Error;

/// Future returned by an invoked handler.
pub type HandlerFuture = BoxFuture<'static, Result<Box<dyn DynRender>, Error>>;

/// An async function usable as a method handler.
///
/// Implemented for `FnOnce` closures of up to three [`FromInput`] arguments
/// returning a future of `Result<R, E>` where `R: Render` and
/// `E: Into<Error>`.
pub trait Handler<Args>: Send + 'static {
    /// Decodes the arguments from `input` and starts the handler.
    fn call(self, input: &Input) -> Result<HandlerFuture, Error>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        impl<F, Fut, R, E, $($arg,)*> Handler<($($arg,)*)> for F
        where
            F: FnOnce($($arg),*) -> Fut + Send + 'static,
            Fut: Future<Output = Result<R, E>> + Send + 'static,
            R: Render + Send + Sync + 'static,
            E: Into<Error>,
            $($arg: FromInput + Send + 'static,)*
        {
            #[allow(non_snake_case, unused_variables)]
            fn call(self, input: &Input) -> Result<HandlerFuture, Error> {
                $(let $arg = $arg::from_input(input).map_err(Error::bad_request)?;)*
                Ok(async move {
                    match self($($arg),*).await {
                        Ok(value) => Ok(Box::new(value) as Box<dyn DynRender>),
                        Err(err) => Err(err.into()),
                    }
                }
                .boxed())
            }
        }
    };
}

impl_handler!();
impl_handler!(A);
impl_handler!(A, B);
impl_handler!(A, B, C);

pub(crate) type BoxedHandler = Box<dyn FnOnce(&Input) -> Result<HandlerFuture, Error> + Send>;

pub(crate) fn boxed<H, Args>(handler: H) -> BoxedHandler
where
    H: Handler<Args>,
{
    Box::new(move |input: &Input| handler.call(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method, Uri};
    use serde::Deserialize;
    use waymark_codec::{Format, Payload, RawBody};

    #[derive(Debug, Deserialize)]
    struct Greeting {
        name: String,
    }

    fn json_input(body: &'static str) -> Input {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Input::new(&Method::POST, &Uri::from_static("/"), &headers, Bytes::from_static(body.as_bytes()))
    }

    async fn run<H: Handler<Args>, Args>(handler: H, input: &Input) -> Result<Vec<u8>, Error> {
        let value = handler.call(input)?.await?;
        Ok(value.encode_as(Format::Json)?)
    }

    #[tokio::test]
    async fn test_zero_argument_handler() {
        let body = run(|| async { Ok::<_, Error>("pong") }, &json_input("")).await.unwrap();
        assert_eq!(body, br#""pong""#);
    }

    #[tokio::test]
    async fn test_decodes_arguments() {
        let handler = |Payload(greeting): Payload<Greeting>, raw: RawBody| async move {
            Ok::<_, Error>(format!("{} ({} bytes)", greeting.name, raw.as_bytes().len()))
        };
        let body = run(handler, &json_input(r#"{"name":"Ada"}"#)).await.unwrap();
        assert_eq!(body, br#""Ada (14 bytes)""#);
    }

    #[tokio::test]
    async fn test_decode_failure_is_bad_request() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = called.clone();
        let handler = move |_: Payload<Greeting>| async move {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, Error>(())
        };

        let err = run(handler, &json_input("{not json")).await.unwrap_err();
        assert!(err.is_bad_request());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_handler_errors_pass_through() {
        let handler = || async { Err::<(), _>(anyhow::anyhow!("database down")) };
        let err = run(handler, &json_input("")).await.unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }
}
