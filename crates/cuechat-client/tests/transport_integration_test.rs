//! Socket task against a local WebSocket server.

#![cfg(feature = "transport")]

use std::time::Duration;

use cuechat_client::{
    ClientCommand, ClientMessageId, ConversationId, MessageId, ServerEvent, UserId, WireMessage,
    transport::{ReconnectConfig, SocketEvent, connect},
};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const STEP: Duration = Duration::from_secs(5);

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
    }
}

#[tokio::test]
async fn commands_and_events_cross_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected a text frame");
        };
        let command = ClientCommand::decode(&text).unwrap();

        let event = ServerEvent::ReceiveMessage(WireMessage {
            id: MessageId::new("m1"),
            conversation_id: ConversationId::new("c1"),
            sender: UserId::new("u2"),
            content: "hi".into(),
            created_at: None,
            client_id: None,
        });
        ws.send(Message::Text(event.encode().unwrap())).await.unwrap();
        ws.send(Message::Text("{not json".into())).await.unwrap();
        ws.send(Message::Text(r#"{"event":"typing","data":{}}"#.into())).await.unwrap();
        command
    });

    let mut socket = connect(format!("ws://{addr}"), fast_reconnect());
    assert_eq!(timeout(STEP, socket.recv()).await.unwrap(), Some(SocketEvent::Connected));

    socket.send(ClientCommand::InitUser(UserId::new("u1"))).await.unwrap();
    assert_eq!(server.await.unwrap(), ClientCommand::InitUser(UserId::new("u1")));

    let event = timeout(STEP, socket.recv()).await.unwrap();
    assert!(matches!(event, Some(SocketEvent::Event(ServerEvent::ReceiveMessage(_)))));

    // Malformed frame is dropped; the unknown event still comes through.
    let event = timeout(STEP, socket.recv()).await.unwrap();
    assert_eq!(
        event,
        Some(SocketEvent::Event(ServerEvent::Unknown { event: "typing".into() }))
    );
}

#[tokio::test]
async fn reconnects_after_server_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
        }
    });

    let mut socket = connect(format!("ws://{addr}"), fast_reconnect());

    let mut seen = Vec::new();
    while seen.len() < 3 {
        let event = timeout(STEP, socket.recv()).await.unwrap().unwrap();
        seen.push(event);
    }

    assert_eq!(seen, vec![
        SocketEvent::Connected,
        SocketEvent::Disconnected,
        SocketEvent::Connected
    ]);
    socket.stop();
    server.await.unwrap();
}

#[tokio::test]
async fn commands_for_a_lost_socket_are_not_replayed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected a text frame");
        };
        ClientCommand::decode(&text).unwrap()
    });

    let config = ReconnectConfig {
        initial_backoff: Duration::from_millis(300),
        max_backoff: Duration::from_millis(300),
    };
    let mut socket = connect(format!("ws://{addr}"), config);
    assert_eq!(timeout(STEP, socket.recv()).await.unwrap(), Some(SocketEvent::Connected));
    assert_eq!(timeout(STEP, socket.recv()).await.unwrap(), Some(SocketEvent::Disconnected));

    socket
        .send(ClientCommand::SendMessage {
            conversation_id: ConversationId::new("c1"),
            sender: UserId::new("u1"),
            content: "stale".into(),
            client_id: ClientMessageId::new("tmp-1"),
        })
        .await
        .unwrap();

    assert_eq!(timeout(STEP, socket.recv()).await.unwrap(), Some(SocketEvent::Connected));
    socket.send(ClientCommand::InitUser(UserId::new("u1"))).await.unwrap();

    let first = timeout(STEP, server).await.unwrap().unwrap();
    assert_eq!(first, ClientCommand::InitUser(UserId::new("u1")));
}
