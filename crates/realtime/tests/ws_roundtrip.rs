//! 针对本地真实 WebSocket 服务端的端到端测试

use common::Frame;
use futures_util::{SinkExt, StreamExt};
use realtime::{
    listener, ConnectionManager, ConnectionState, RealtimeMetrics, ReconnectPolicy, WsConnector,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, accept_hdr_async};

async fn wait(manager: &ConnectionManager, target: ConnectionState) {
    tokio::time::timeout(Duration::from_secs(10), manager.wait_for(target))
        .await
        .expect("timed out waiting for state")
        .unwrap();
}

fn forward(tx: mpsc::UnboundedSender<Value>) -> realtime::Listener {
    listener(move |payload| {
        let _ = tx.send(payload.clone());
    })
}

#[tokio::test]
async fn test_roundtrip_with_auth_then_fail() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let (seen_tx, seen_rx) = oneshot::channel::<(Option<String>, String)>();

    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut auth = None;
        let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            auth = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(resp)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();

        ws.send(Message::Text(r#"{"action":"message","text":"hi"}"#.to_string()))
            .await
            .unwrap();

        let reply = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("unexpected: {:?}", other),
            }
        };
        let _ = seen_tx.send((auth, reply));
        let _ = ws.close(None).await;
        // 监听器随任务结束释放，之后的重连会被拒绝
    });

    let manager = ConnectionManager::new(
        format!("ws://{}/ws", addr),
        Arc::new(WsConnector::with_auth_token("secret")),
        ReconnectPolicy {
            delay: Duration::from_millis(50),
            max_attempts: 1,
        },
        None,
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_listener("message", forward(tx)).await;

    manager.connect();
    wait(&manager, ConnectionState::Open).await;

    let payload = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload, json!({"text": "hi"}));

    manager
        .send(&Frame::new("message", json!({"text": "ack"})))
        .await
        .unwrap();

    let (auth, reply) = tokio::time::timeout(Duration::from_secs(10), seen_rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer secret"));
    assert_eq!(
        serde_json::from_str::<Value>(&reply).unwrap(),
        json!({"action": "message", "text": "ack"})
    );

    wait(&manager, ConnectionState::Failed).await;
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        // 第一个连接立即关闭
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.close(None).await;
        drop(ws);

        // 第二个连接推送一条通知后保持
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(
            r#"{"action":"notification","title":"Trade","message":"buyer paid"}"#.to_string(),
        ))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    });

    let manager = ConnectionManager::new(
        format!("ws://{}", addr),
        Arc::new(WsConnector::new()),
        ReconnectPolicy {
            delay: Duration::from_millis(50),
            max_attempts: 3,
        },
        None,
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_listener("notification", forward(tx)).await;
    manager.connect();

    let payload = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload["message"], "buyer paid");
    assert_eq!(manager.state().await, ConnectionState::Open);

    manager.close().await;
    assert_eq!(manager.state().await, ConnectionState::Idle);
}

#[tokio::test]
async fn test_non_utf8_binary_frame_counted_as_malformed() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Binary(vec![0xff, 0xfe, 0xfd])).await.unwrap();
        ws.send(Message::Binary(br#"{"action":"message","text":"bin"}"#.to_vec()))
            .await
            .unwrap();
        while ws.next().await.is_some() {}
    });

    let metrics = RealtimeMetrics::new().unwrap();
    let manager = ConnectionManager::new(
        format!("ws://{}", addr),
        Arc::new(WsConnector::new()),
        ReconnectPolicy::default(),
        Some(metrics.clone()),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_listener("message", forward(tx)).await;
    manager.connect();

    let payload = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload, json!({"text": "bin"}));
    assert_eq!(metrics.frame_count("malformed"), 1);
    assert_eq!(manager.state().await, ConnectionState::Open);

    manager.close().await;
}
