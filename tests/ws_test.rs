//! Integration tests for the WebSocket chat relay: connect, claim a name,
//! broadcast fan-out, and disconnect announcements over a real server.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use globalchat_server::routes;
use globalchat_server::state::AppState;
use globalchat_server::ws::protocol::{ChatMessage, ServerEvent};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper: start the server on a random port and return its address.
async fn start_test_server() -> SocketAddr {
    let state = AppState::new();
    let app = routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Connect a WebSocket client and give its server-side actor a moment to
/// register (the actor starts after the 101 response).
async fn connect(addr: SocketAddr) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket connect");
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream
}

async fn send_event(ws: &mut WsStream, event_type: &str, data: &str) {
    let frame = json!({"type": event_type, "data": data}).to_string();
    ws.send(Message::Text(frame.into()))
        .await
        .expect("WebSocket send");
}

/// Receive the next chat broadcast, skipping non-text frames.
async fn recv_chat(ws: &mut WsStream) -> ChatMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for broadcast")
            .expect("stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            let ServerEvent::Message(chat) =
                serde_json::from_str(text.as_str()).expect("valid server event");
            return chat;
        }
    }
}

/// Assert that no chat broadcast arrives within a short window.
async fn expect_silence(ws: &mut WsStream) {
    match tokio::time::timeout(Duration::from_millis(300), ws.next()).await {
        Err(_) => {}
        Ok(Some(Ok(Message::Text(text)))) => panic!("unexpected broadcast: {text}"),
        Ok(_) => {}
    }
}

fn system(text: &str) -> ChatMessage {
    ChatMessage {
        user: "System".to_string(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn full_chat_scenario() {
    let addr = start_test_server().await;

    let mut c1 = connect(addr).await;
    let mut c2 = connect(addr).await;

    // C1 joins as Ada — both connections see the announcement.
    send_event(&mut c1, "setUsername", "Ada").await;
    assert_eq!(recv_chat(&mut c1).await, system("Ada joined the chat"));
    assert_eq!(recv_chat(&mut c2).await, system("Ada joined the chat"));

    // C2 joins as Grace.
    send_event(&mut c2, "setUsername", "Grace").await;
    assert_eq!(recv_chat(&mut c1).await, system("Grace joined the chat"));
    assert_eq!(recv_chat(&mut c2).await, system("Grace joined the chat"));

    // C1 sends a message, attributed to Ada, delivered to everyone.
    send_event(&mut c1, "sendMessage", "hi").await;
    let expected = ChatMessage {
        user: "Ada".to_string(),
        text: "hi".to_string(),
    };
    assert_eq!(recv_chat(&mut c1).await, expected);
    assert_eq!(recv_chat(&mut c2).await, expected);

    // C2 disconnects — the remaining connection hears about it.
    c2.close(None).await.expect("close");
    assert_eq!(recv_chat(&mut c1).await, system("Grace left the chat"));
}

#[tokio::test]
async fn message_before_username_is_dropped() {
    let addr = start_test_server().await;
    let mut c1 = connect(addr).await;

    send_event(&mut c1, "sendMessage", "hello").await;
    expect_silence(&mut c1).await;

    // The connection is still usable afterwards.
    send_event(&mut c1, "setUsername", "Ada").await;
    assert_eq!(recv_chat(&mut c1).await, system("Ada joined the chat"));
}

#[tokio::test]
async fn whitespace_message_is_dropped() {
    let addr = start_test_server().await;
    let mut c1 = connect(addr).await;

    send_event(&mut c1, "setUsername", "Ada").await;
    assert_eq!(recv_chat(&mut c1).await, system("Ada joined the chat"));

    send_event(&mut c1, "sendMessage", "   ").await;
    expect_silence(&mut c1).await;
}

#[tokio::test]
async fn empty_username_gets_guest_fallback() {
    let addr = start_test_server().await;
    let mut c1 = connect(addr).await;

    send_event(&mut c1, "setUsername", "").await;
    let chat = recv_chat(&mut c1).await;
    assert_eq!(chat.user, "System");

    let name = chat
        .text
        .strip_suffix(" joined the chat")
        .expect("join announcement");
    let n: u32 = name
        .strip_prefix("Guest")
        .expect("guest fallback name")
        .parse()
        .expect("numeric guest suffix");
    assert!(n < 1000);
}

#[tokio::test]
async fn rename_reannounces_join() {
    let addr = start_test_server().await;
    let mut c1 = connect(addr).await;

    send_event(&mut c1, "setUsername", "A").await;
    assert_eq!(recv_chat(&mut c1).await, system("A joined the chat"));

    send_event(&mut c1, "setUsername", "B").await;
    assert_eq!(recv_chat(&mut c1).await, system("B joined the chat"));

    send_event(&mut c1, "sendMessage", "hello").await;
    assert_eq!(recv_chat(&mut c1).await.user, "B");
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let addr = start_test_server().await;
    let mut c1 = connect(addr).await;

    c1.send(Message::Text("not json".into())).await.unwrap();
    c1.send(Message::Text(r#"{"type":"transfer","data":"x"}"#.into()))
        .await
        .unwrap();
    expect_silence(&mut c1).await;

    // The connection survived both bad frames.
    send_event(&mut c1, "setUsername", "Ada").await;
    assert_eq!(recv_chat(&mut c1).await, system("Ada joined the chat"));
}

#[tokio::test]
async fn disconnect_before_naming_is_silent() {
    let addr = start_test_server().await;

    let mut c1 = connect(addr).await;
    send_event(&mut c1, "setUsername", "Ada").await;
    assert_eq!(recv_chat(&mut c1).await, system("Ada joined the chat"));

    // C2 connects and leaves without ever claiming a name.
    let mut c2 = connect(addr).await;
    c2.close(None).await.expect("close");

    expect_silence(&mut c1).await;
}

#[tokio::test]
async fn chat_page_is_served() {
    let addr = start_test_server().await;

    let body = reqwest::get(format!("http://{addr}/"))
        .await
        .expect("GET /")
        .text()
        .await
        .expect("page body");

    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("WebSocket"));
}
