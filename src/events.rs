//! Event delivery from the dispatch loop to the UI layer
//!
//! The dispatch loop does not draw windows; it announces what happened and
//! lets subscribers (the terminal UI, tests) react. Two things can happen:
//! a message arrives for a conversation that already exists, or a peer
//! makes first contact and a conversation is synthesized for it.

use parking_lot::RwLock;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a conversation, stable for the lifetime of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(u64);

impl ConversationId {
    /// Create an identifier with the given value.
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of this identifier.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events delivered to subscribers by the dispatch loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// First contact from a peer: a conversation was synthesized for it.
    ConversationOpened {
        /// Identifier of the new conversation
        id: ConversationId,
        /// Address of the peer
        peer: IpAddr,
        /// Name resolved for the peer (address book, or the address itself)
        display_name: String,
        /// The message text that triggered the conversation
        text: String,
    },

    /// A message arrived for an existing conversation.
    MessageReceived {
        /// Identifier of the conversation the text was appended to
        id: ConversationId,
        /// Address of the peer
        peer: IpAddr,
        /// The message text
        text: String,
    },
}

/// Handle for unsubscribing from events
///
/// Dropping the handle does not unsubscribe; call
/// `EventHandlers::unsubscribe` (or `ChatNode::unsubscribe`) explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// Type alias for event handler callbacks
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync + 'static>;

/// Manages event subscriptions and delivery
///
/// Cloning produces another handle to the same subscriber list, so the
/// dispatch loop and the node facade share one registry.
pub struct EventHandlers {
    handlers: Arc<RwLock<Vec<(SubscriptionHandle, EventCallback)>>>,
    next_id: Arc<AtomicU64>,
}

impl EventHandlers {
    /// Create an empty handler registry.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a handler, called for every future event until unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((handle, Arc::new(callback)));
        handle
    }

    /// Remove the handler registered under `handle`. No-op if unknown.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.handlers.write().retain(|(h, _)| *h != handle);
    }

    /// Deliver an event to every registered handler, in subscription order.
    ///
    /// A panicking handler is caught and logged so the remaining handlers
    /// (and the dispatch loop itself) keep running.
    pub fn dispatch(&self, event: Event) {
        let handlers = self.handlers.read();
        for (handle, callback) in handlers.iter() {
            let event = event.clone();
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(?handle, "event handler panicked");
            }
        }
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventHandlers {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}
