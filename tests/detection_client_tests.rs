// Integration tests for the detection event stream client
//
// Each test runs a real websocket server on a local port and plays the
// part of the detection service.

use futures::{SinkExt, StreamExt};
use quiz_link::detection::{ConnectionState, DetectionClient, DetectionConfig, DetectionUpdate};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

type ServerSocket = WebSocketStream<TcpStream>;

/// Start a websocket server; every accepted connection is handed to the test
async fn detection_server() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            if tx.send(ws).is_err() {
                break;
            }
        }
    });

    (url, rx)
}

fn test_config(url: String) -> DetectionConfig {
    DetectionConfig {
        url,
        keepalive_interval: Duration::from_secs(30),
        reconnect_delay: Duration::from_millis(100),
        trigger_cooldown: Duration::from_secs(1),
    }
}

async fn next_update(updates: &mut mpsc::UnboundedReceiver<DetectionUpdate>) -> DetectionUpdate {
    timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("timed out waiting for update")
        .expect("update channel closed")
}

async fn accept(connections: &mut mpsc::UnboundedReceiver<ServerSocket>) -> ServerSocket {
    timeout(Duration::from_secs(5), connections.recv())
        .await
        .expect("timed out waiting for connection")
        .expect("server stopped")
}

async fn send_json(socket: &mut ServerSocket, json: &str) {
    socket.send(Message::Text(json.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_detection_then_single_trigger_per_episode() {
    let (url, mut connections) = detection_server().await;
    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    let mut server = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    send_json(&mut server, r#"{"type":"person_detected","count":1,"timestamp":1730000000.5}"#).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::PersonDetected(1));

    let status = client.status();
    assert!(status.person_detected);
    assert_eq!(status.detection_count, 1);

    send_json(&mut server, r#"{"type":"play_audio","message":"Person detected for 3 seconds"}"#).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::PlayAudio);
    assert!(!client.status().person_detected);

    tokio::time::sleep(Duration::from_millis(200)).await;
    send_json(&mut server, r#"{"type":"play_audio"}"#).await;

    let repeat = timeout(Duration::from_millis(300), updates.recv()).await;
    assert!(repeat.is_err(), "Trigger within cooldown must be suppressed");

    client.shutdown().await;
}

#[tokio::test]
async fn test_close_schedules_exactly_one_reconnect() {
    let (url, mut connections) = detection_server().await;
    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    let mut first = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    // A bad message is logged and does not close the connection by itself
    send_json(&mut first, "not json").await;
    send_json(&mut first, r#"{"type":"person_detected","count":2}"#).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::PersonDetected(2));

    first.close(None).await.unwrap();
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(false));

    let _second = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(connections.try_recv().is_err(), "Only one reconnect per close");

    let status = client.status();
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(status.reconnects, 1);
    assert!(!status.person_detected, "Close clears the detection flag");

    client.shutdown().await;
}

#[tokio::test]
async fn test_keepalive_pings_while_connected() {
    let (url, mut connections) = detection_server().await;
    let mut config = test_config(url);
    config.keepalive_interval = Duration::from_millis(100);
    let (client, _updates) = DetectionClient::new(config).unwrap();

    client.connect().await;
    let mut server = accept(&mut connections).await;

    let message = timeout(Duration::from_secs(2), server.next())
        .await
        .expect("no keep-alive received")
        .unwrap()
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(message.to_text().unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"type": "ping"}));

    // The service answers pings with pongs, which are ignored
    send_json(&mut server, r#"{"type":"pong"}"#).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(client.status().pings_sent >= 1);
    assert_eq!(client.status().state, ConnectionState::Connected);

    client.shutdown().await;
}

#[tokio::test]
async fn test_connect_is_single_connection() {
    let (url, mut connections) = detection_server().await;
    let (client, _updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    client.connect().await;
    tokio::join!(client.connect(), client.connect());

    let _server = accept(&mut connections).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(connections.try_recv().is_err());

    client.shutdown().await;
}

#[tokio::test]
async fn test_refused_connection_keeps_retrying_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    drop(listener);

    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();
    client.connect().await;

    tokio::time::sleep(Duration::from_millis(350)).await;
    let status = client.status();
    assert!(status.reconnects >= 2, "Failed connects are retried");
    assert!(!status.connected);

    client.shutdown().await;
    let after_shutdown = client.status().reconnects;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(client.status().reconnects, after_shutdown);
    assert_eq!(client.status().state, ConnectionState::Disconnected);
    assert!(updates.try_recv().is_err(), "No status change without a connection");
}

#[tokio::test]
async fn test_shutdown_closes_and_never_reconnects() {
    let (url, mut connections) = detection_server().await;
    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    let mut server = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    client.shutdown().await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(false));

    // The server sees the socket go away
    let ended = timeout(Duration::from_secs(2), server.next()).await.unwrap();
    assert!(!matches!(ended, Some(Ok(Message::Text(_)))));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(connections.try_recv().is_err());

    // Connecting after shutdown is a no-op
    client.connect().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(connections.try_recv().is_err());
}

#[tokio::test]
async fn test_drop_cancels_pending_reconnect() {
    let (url, mut connections) = detection_server().await;
    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    let mut server = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    server.close(None).await.unwrap();
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(false));

    // Reconnect is now pending; dropping the client must cancel it
    drop(client);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(connections.try_recv().is_err(), "A dropped client must not reconnect");
}

#[tokio::test]
async fn test_drop_closes_live_connection() {
    let (url, mut connections) = detection_server().await;
    let (client, mut updates) = DetectionClient::new(test_config(url)).unwrap();

    client.connect().await;
    let mut server = accept(&mut connections).await;
    assert_eq!(next_update(&mut updates).await, DetectionUpdate::ConnectionStatus(true));

    drop(client);

    let ended = timeout(Duration::from_secs(2), server.next()).await.unwrap();
    assert!(!matches!(ended, Some(Ok(Message::Text(_)))));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(connections.try_recv().is_err());
}
