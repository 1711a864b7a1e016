//! Shared helpers for the socket-level integration tests

use lanchat::{ChatNode, ChatNodeBuilder};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Build and start a node on a loopback port picked by the OS, with a
/// fast dispatch cadence so tests don't sit around.
pub async fn start_node() -> (ChatNode, SocketAddr) {
    let node = test_builder().build().unwrap();
    node.start().await.unwrap();
    let address = node.local_addr().unwrap();
    (node, address)
}

/// Builder preconfigured for loopback testing; tests tweak it further.
pub fn test_builder() -> ChatNodeBuilder {
    ChatNodeBuilder::new()
        .with_bind_address("127.0.0.1".parse().unwrap())
        .with_port(0)
        .with_dispatch_interval(Duration::from_millis(20))
}

/// Deliver one message the way a real peer does: connect, write, close.
pub async fn send_raw(address: SocketAddr, payload: &[u8]) {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(payload).await.unwrap();
    // The receiver may already have hung up (e.g. an over-limit stream);
    // the FIN only matters when it hasn't.
    let _ = stream.shutdown().await;
}

/// Poll until `predicate` holds, or fail after two seconds.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
