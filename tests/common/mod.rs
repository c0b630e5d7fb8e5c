use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use duel_server::{build_router, AppState, Config};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _server: tokio::task::JoinHandle<()>,
    _session: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (state, runner) = AppState::new(Config::default());
        let session = tokio::spawn(runner.run());
        let app = build_router(state);

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _server: server,
            _session: session,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Read the next JSON text frame (5s timeout).
pub async fn ws_read_json(stream: &mut WsStream) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Skip frames until one with the given `type` arrives.
pub async fn ws_read_type(stream: &mut WsStream, ty: &str) -> Value {
    loop {
        let msg = ws_read_json(stream).await;
        if msg["type"] == ty {
            return msg;
        }
    }
}

/// Skip frames until a `status` with the given player count arrives.
pub async fn ws_wait_player_count(stream: &mut WsStream, count: u64) {
    loop {
        let msg = ws_read_type(stream, "status").await;
        if msg["playerCount"] == count {
            return;
        }
    }
}

/// Connect and consume the `init` frame, returning the assigned slot.
pub async fn ws_join(url: &str) -> (WsStream, u64) {
    let mut stream = ws_connect(url).await;
    let init = ws_read_json(&mut stream).await;
    assert_eq!(init["type"], "init", "first frame must be init: {init}");
    let slot = init["playerId"].as_u64().unwrap();
    (stream, slot)
}

/// Wait for the server to close the connection (5s timeout).
pub async fn ws_expect_closed(stream: &mut WsStream) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(Message::Text(text))) => panic!("Expected close, got {text}"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for close");
}

pub async fn ws_send_json(stream: &mut WsStream, value: &Value) {
    stream
        .send(Message::Text(value.to_string()))
        .await
        .unwrap();
}

pub async fn ws_send_text(stream: &mut WsStream, text: &str) {
    stream.send(Message::Text(text.to_string())).await.unwrap();
}
