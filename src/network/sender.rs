//! One-shot outbound message delivery

use crate::error::{Error, Result};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Send one message to a peer.
///
/// Opens a connection, writes the text, and closes it; the closing is
/// what marks the end of the message on the receiving side. There is no
/// retry and no acknowledgement; an unreachable peer is reported to the
/// caller, which renders it as a local notice rather than a failure.
///
/// An empty text sends nothing and succeeds.
///
/// # Errors
///
/// `Error::Connect` if the peer refuses or cannot be reached,
/// `Error::Send` if the connection drops mid-write.
pub async fn send_message(address: SocketAddr, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stream = TcpStream::connect(address)
        .await
        .map_err(|source| Error::Connect { address, source })?;
    stream
        .write_all(text.as_bytes())
        .await
        .map_err(|source| Error::Send { address, source })?;
    stream
        .shutdown()
        .await
        .map_err(|source| Error::Send { address, source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_empty_text_sends_nothing() {
        // No listener behind this address; an empty text must not even
        // try to connect.
        let address: SocketAddr = "127.0.0.1:9".parse().unwrap();
        assert!(send_message(address, "").await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let result = send_message(address, "ping").await;
        match result {
            Err(error) => assert!(error.is_unreachable()),
            Ok(_) => panic!("send to a closed port should fail"),
        }
    }

    #[tokio::test]
    async fn test_message_arrives_whole() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let received = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut payload = String::new();
            stream.read_to_string(&mut payload).await.unwrap();
            payload
        });

        send_message(address, "hello over the wire").await.unwrap();
        assert_eq!(received.await.unwrap(), "hello over the wire");
    }
}
