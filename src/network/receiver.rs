//! Inbound message listener
//!
//! Accepts TCP connections and reads each one to EOF in its own detached
//! task. Handlers are strictly request-scoped: read, enqueue, terminate.
//! They share nothing with each other; the inbound queue is the only
//! thing they touch outside the connection.

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::queue::{InboundQueue, RawMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Read chunk size for inbound connections.
const READ_CHUNK: usize = 1024;

/// Listener for inbound chat messages.
///
/// One accepted connection becomes one queued `RawMessage` once the peer
/// closes its write side. Concurrent handlers are capped by a semaphore
/// so a flood of connections cannot exhaust the process.
pub struct MessageListener {
    listener: TcpListener,
    queue: InboundQueue,
    max_message_bytes: usize,
    idle_timeout: Duration,
    handler_slots: Arc<Semaphore>,
}

impl MessageListener {
    /// Bind to the configured address and port.
    ///
    /// # Errors
    ///
    /// Returns `Error::Bind` if the port cannot be acquired. This is the
    /// one fatal startup error: a node that cannot listen is not a node.
    pub async fn bind(config: &ChatConfig, queue: InboundQueue) -> Result<Self> {
        let address = SocketAddr::new(config.bind_address, config.port);
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| Error::Bind { address, source })?;
        Ok(Self {
            listener,
            queue,
            max_message_bytes: config.max_message_bytes,
            idle_timeout: config.idle_timeout,
            handler_slots: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Local address the listener is bound to.
    ///
    /// Useful after binding port 0, where the OS picks the port.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::from)
    }

    /// Consume the listener and run its accept loop as a detached task.
    ///
    /// The loop never waits for handlers to finish; aborting the returned
    /// handle stops accepting, while in-flight handlers run to completion.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.accept_loop())
    }

    async fn accept_loop(self) {
        loop {
            let permit = match Arc::clone(&self.handler_slots).acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed; this arm is unreachable
                // but must not panic the listener.
                Err(_) => return,
            };
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let queue = self.queue.clone();
                    let max_bytes = self.max_message_bytes;
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        receive_message(stream, peer, queue, max_bytes, idle_timeout).await;
                        drop(permit);
                    });
                }
                Err(error) => {
                    // A failed accept must not take the listener down.
                    warn!(%error, "failed to accept inbound connection");
                    drop(permit);
                }
            }
        }
    }
}

/// Read one connection to EOF and enqueue the payload as a single message.
///
/// Request-scoped: holds no state once it returns. A read error or a
/// stalled peer terminates only this handler; nothing is enqueued and no
/// other connection is affected.
async fn receive_message(
    mut stream: TcpStream,
    peer: SocketAddr,
    queue: InboundQueue,
    max_bytes: usize,
    idle_timeout: Duration,
) {
    let mut payload = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match tokio::time::timeout(idle_timeout, stream.read(&mut chunk)).await {
            Err(_) => {
                warn!(%peer, ?idle_timeout, "inbound connection stalled, dropping");
                return;
            }
            Ok(Err(error)) => {
                debug!(%peer, %error, "read failed, dropping connection");
                return;
            }
            Ok(Ok(0)) => break,
            Ok(Ok(read)) => {
                if payload.len() + read > max_bytes {
                    warn!(%peer, limit = max_bytes, "inbound message over size limit, dropping");
                    return;
                }
                payload.extend_from_slice(&chunk[..read]);
            }
        }
    }

    // A connection that closed without sending anything produces nothing.
    if payload.is_empty() {
        return;
    }

    let text = String::from_utf8_lossy(&payload).into_owned();
    debug!(%peer, bytes = payload.len(), "received inbound message");
    queue.push(RawMessage::new(peer.ip(), text));
}
