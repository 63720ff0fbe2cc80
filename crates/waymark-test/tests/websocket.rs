//! WebSocket upgrades, in memory and over a real socket.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use http::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use waymark_core::Error;
use waymark_server::{serve_with_shutdown, Router, Routes, ShutdownSignal};
use waymark_test::TestClient;
use waymark_ws::{Message, WebSocketConfig};

fn echo_app() -> Router {
    let mut router = Router::builder().build().unwrap();
    router.literal("echo", |ctx| {
        ctx.websocket(WebSocketConfig::new(), |mut socket| async move {
            while let Some(message) = socket.recv().await {
                match message? {
                    Message::Text(text) => socket.send(Message::text(text)).await?,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Ok::<_, anyhow::Error>(())
        });
        ctx.get(|| async { Ok::<_, Error>("plain GET") });
    });
    router
}

#[tokio::test]
async fn upgrade_answers_switching_protocols() {
    let client = TestClient::new(echo_app());

    client
        .get("/echo")
        .header("connection", "Upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-version", "13")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .send()
        .await
        .assert_status(StatusCode::SWITCHING_PROTOCOLS)
        .assert_header("sec-websocket-accept", "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=")
        .assert_header("upgrade", "websocket");
}

#[tokio::test]
async fn plain_get_reaches_get_handler() {
    let client = TestClient::new(echo_app());

    client
        .get("/echo")
        .accept("text/plain")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("plain GET");
}

#[tokio::test]
async fn broken_handshake_is_bad_request() {
    let client = TestClient::new(echo_app());

    client
        .get("/echo")
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-version", "8")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_json_eq(&json!({"message": "Bad Request"}));

    client
        .get("/echo")
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-version", "13")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn echoes_over_tcp() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(serve_with_shutdown(
        listener,
        Arc::new(echo_app()),
        shutdown.clone(),
        Duration::from_secs(1),
    ));

    let (mut stream, response) = tokio_tungstenite::connect_async(format!("ws://{addr}/echo")).await?;
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);

    stream
        .send(tokio_tungstenite::tungstenite::Message::text("ping?"))
        .await?;
    let reply = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await?
        .expect("stream ended")?;
    assert_eq!(reply.to_text()?, "ping?");

    stream.close(None).await?;
    shutdown.trigger();
    server.await??;
    Ok(())
}
