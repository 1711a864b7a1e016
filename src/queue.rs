//! The inbound queue: hand-off point between connection handlers and the
//! dispatch loop
//!
//! Arbitrarily many connection handlers push concurrently; exactly one
//! consumer (the dispatch loop) pops. This queue is the only piece of
//! state the two sides share.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;

/// One fully received, unframed payload from a single inbound connection.
///
/// Produced once when the sending connection closes, consumed exactly once
/// by the dispatch loop. Nothing can be appended to it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// IP address of the sending peer.
    ///
    /// This is the join key between inbound connections and conversations,
    /// and it is the only notion of identity in the system: two different
    /// peers behind the same NAT address collide into one conversation.
    pub peer: IpAddr,
    /// The entire payload of the connection, decoded as UTF-8 (lossily).
    pub text: String,
}

impl RawMessage {
    /// Create a raw message.
    pub fn new(peer: IpAddr, text: impl Into<String>) -> Self {
        Self {
            peer,
            text: text.into(),
        }
    }
}

/// Thread-safe FIFO mailbox of not-yet-dispatched raw messages.
///
/// Cloning produces another handle to the same queue, so the listener and
/// the dispatch loop can each hold one. `push` never blocks beyond the
/// short internal lock; items come out in the order the producing
/// connections finished.
pub struct InboundQueue {
    inner: Arc<Mutex<VecDeque<RawMessage>>>,
}

impl InboundQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Append a message.
    ///
    /// Safe to call from any number of concurrent producers; no item is
    /// ever lost under contention.
    pub fn push(&self, message: RawMessage) {
        self.inner.lock().push_back(message);
    }

    /// Remove and return the oldest undelivered message, if any.
    ///
    /// Only the dispatch loop calls this; no item is returned twice.
    pub fn try_pop(&self) -> Option<RawMessage> {
        self.inner.lock().pop_front()
    }

    /// Whether the queue currently looks empty.
    ///
    /// A hint only: it races with concurrent pushes, which is harmless
    /// because the dispatch loop re-polls on its next tick anyway.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of messages currently waiting.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InboundQueue {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
