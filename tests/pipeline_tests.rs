//! End-to-end tests of the inbound delivery pipeline over real sockets
//!
//! Everything here goes through the wire: connect, write, close, then
//! watch the dispatch loop route the payload into a conversation.
//! Dispatch semantics that need distinct peer addresses live as unit
//! tests in `src/dispatch.rs`, since every loopback connection arrives
//! from 127.0.0.1.

mod common;

use common::{send_raw, start_node, test_builder, wait_until};
use lanchat::{Contact, ContactDirectory, EntryKind, Event};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn incoming_texts(node: &lanchat::ChatNode, id: lanchat::ConversationId) -> Vec<String> {
    node.conversations()
        .with(id, |conversation| {
            conversation
                .transcript()
                .iter()
                .filter(|entry| entry.kind == EntryKind::Incoming)
                .map(|entry| entry.text.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn first_contact_synthesizes_a_conversation() {
    let (node, address) = start_node().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_inner = Arc::clone(&seen);
    node.on_event(move |event| seen_inner.lock().push(event));

    send_raw(address, b"hello").await;

    let store = node.conversations();
    assert!(wait_until(|| store.len() == 1).await);
    assert!(wait_until(|| !seen.lock().is_empty()).await);

    let id = store.ids()[0];
    assert_eq!(incoming_texts(&node, id), vec!["hello"]);
    assert_eq!(
        store.with(id, |c| c.display_name().to_string()),
        Some("127.0.0.1".to_string())
    );

    assert!(matches!(
        &seen.lock()[0],
        Event::ConversationOpened { text, .. } if text == "hello"
    ));

    node.stop().await.unwrap();
}

#[tokio::test]
async fn same_peer_appends_to_one_conversation_in_order() {
    let (node, address) = start_node().await;
    let store = node.conversations();

    send_raw(address, b"hello").await;
    assert!(wait_until(|| store.len() == 1).await);
    let id = store.ids()[0];

    send_raw(address, b"again").await;
    assert!(wait_until(|| incoming_texts(&node, id).len() == 2).await);

    assert_eq!(store.len(), 1);
    assert_eq!(incoming_texts(&node, id), vec!["hello", "again"]);

    node.stop().await.unwrap();
}

#[tokio::test]
async fn zero_byte_connection_has_no_side_effects() {
    let (node, address) = start_node().await;

    let stream = TcpStream::connect(address).await.unwrap();
    drop(stream);

    // Several dispatch intervals go by; nothing should appear.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(node.conversations().is_empty());

    node.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_connections_are_all_delivered() {
    let (node, address) = start_node().await;
    let store = node.conversations();

    let senders: Vec<_> = (0..10)
        .map(|n| {
            tokio::spawn(async move {
                let mut stream = TcpStream::connect(address).await.unwrap();
                stream
                    .write_all(format!("message {}", n).as_bytes())
                    .await
                    .unwrap();
                stream.shutdown().await.unwrap();
            })
        })
        .collect();
    for sender in senders {
        sender.await.unwrap();
    }

    // All from 127.0.0.1, so exactly one conversation with ten entries.
    assert!(wait_until(|| {
        store.len() == 1 && incoming_texts(&node, store.ids()[0]).len() == 10
    })
    .await);

    let mut texts = incoming_texts(&node, store.ids()[0]);
    texts.sort();
    let mut expected: Vec<_> = (0..10).map(|n| format!("message {}", n)).collect();
    expected.sort();
    assert_eq!(texts, expected);

    node.stop().await.unwrap();
}

#[tokio::test]
async fn oversized_stream_is_dropped_before_the_queue() {
    let node = test_builder().with_max_message_bytes(32).build().unwrap();
    node.start().await.unwrap();
    let address = node.local_addr().unwrap();

    send_raw(address, &[b'x'; 1024]).await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(node.conversations().is_empty());

    // A normal-sized message still gets through afterwards.
    send_raw(address, b"small enough").await;
    let store = node.conversations();
    assert!(wait_until(|| store.len() == 1).await);

    node.stop().await.unwrap();
}

#[tokio::test]
async fn known_peer_is_named_from_the_address_book() {
    let mut directory = ContactDirectory::new();
    directory.add(Contact {
        display_name: "Localhost".to_string(),
        hostname: "localhost".to_string(),
        address: "127.0.0.1".parse().unwrap(),
    });

    let node = test_builder().with_directory(directory).build().unwrap();
    node.start().await.unwrap();
    let address = node.local_addr().unwrap();

    send_raw(address, b"hello").await;

    let store = node.conversations();
    assert!(wait_until(|| store.len() == 1).await);
    assert_eq!(
        store.with(store.ids()[0], |c| c.display_name().to_string()),
        Some("Localhost".to_string())
    );

    node.stop().await.unwrap();
}

#[tokio::test]
async fn unreachable_peer_send_is_a_local_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_address = listener.local_addr().unwrap();
    drop(listener);

    let result = lanchat::send_message(dead_address, "ping").await;
    match result {
        Err(error) => assert!(error.is_unreachable()),
        Ok(_) => panic!("send to a closed port should fail"),
    }
}

#[tokio::test]
async fn closed_conversation_resynthesizes_on_next_message() {
    let (node, address) = start_node().await;
    let store = node.conversations();

    send_raw(address, b"hello").await;
    assert!(wait_until(|| store.len() == 1).await);
    let first_id = store.ids()[0];

    node.close_conversation(first_id);
    assert!(store.is_empty());

    send_raw(address, b"knock knock").await;
    assert!(wait_until(|| store.len() == 1).await);
    let second_id = store.ids()[0];

    assert_ne!(second_id, first_id);
    assert_eq!(incoming_texts(&node, second_id), vec!["knock knock"]);

    node.stop().await.unwrap();
}
