//! The dispatch loop: turns raw inbound messages into conversation updates
//!
//! A single periodic consumer drains the inbound queue and routes every
//! message to its conversation, synthesizing one the first time an
//! unknown peer makes contact. Because there is exactly one consumer,
//! routing itself is race-free; the queue is the only contended state.

use crate::conversation::{Conversation, ConversationStore};
use crate::directory::ContactDirectory;
use crate::events::{ConversationId, Event, EventHandlers};
use crate::queue::{InboundQueue, RawMessage};
use crate::registry::ConversationRegistry;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Routes received messages to conversations.
///
/// `tick` is the synchronous unit of work; `spawn` runs it on a fixed
/// period. Cloning produces another handle over the same queue, registry,
/// store, and subscribers, which is how the node facade keeps one for
/// UI-initiated conversation management while the loop runs detached.
pub struct Dispatcher {
    queue: InboundQueue,
    registry: Arc<ConversationRegistry>,
    conversations: ConversationStore,
    directory: Option<Arc<ContactDirectory>>,
    events: EventHandlers,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Create a dispatcher over the shared pipeline state.
    pub fn new(
        queue: InboundQueue,
        registry: Arc<ConversationRegistry>,
        conversations: ConversationStore,
        directory: Option<Arc<ContactDirectory>>,
        events: EventHandlers,
    ) -> Self {
        Self {
            queue,
            registry,
            conversations,
            directory,
            events,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Drain the inbound queue completely and route every message.
    ///
    /// The whole backlog is processed in one invocation rather than one
    /// message per tick: producers can outpace the tick rate, and a
    /// partial drain would let the backlog grow without bound while
    /// newly arrived conversations wait to be shown.
    pub fn tick(&self) {
        while let Some(message) = self.queue.try_pop() {
            self.route(message);
        }
    }

    fn route(&self, message: RawMessage) {
        let RawMessage { peer, text } = message;

        if let Some(id) = self.registry.resolve(peer) {
            let appended = self
                .conversations
                .with_mut(id, |conversation| conversation.append_incoming(&text));
            if appended.is_some() {
                trace!(%peer, %id, "routed message to existing conversation");
                self.events.dispatch(Event::MessageReceived { id, peer, text });
                return;
            }
            // The registry pointed at a conversation that no longer
            // exists. Treat as first contact and resynthesize.
            debug!(%peer, %id, "stale registry entry, resynthesizing conversation");
            self.registry.unregister(peer);
        }

        let display_name = self.display_name_for(peer);
        let id = self.allocate_id();
        // Register before appending so a second message from the same
        // peer in this drain resolves to this conversation.
        self.registry.register(peer, id);
        let mut conversation = Conversation::new(id, peer, display_name.clone());
        conversation.append_incoming(&text);
        self.conversations.insert(conversation);
        debug!(%peer, %id, name = %display_name, "opened conversation on first contact");
        self.events.dispatch(Event::ConversationOpened {
            id,
            peer,
            display_name,
            text,
        });
    }

    /// Open a conversation for a peer known from the address book.
    ///
    /// If the peer already has a live conversation its identifier is
    /// returned instead; every peer address has at most one.
    pub fn open_conversation(&self, peer: IpAddr, display_name: &str) -> ConversationId {
        if let Some(id) = self.registry.resolve(peer) {
            if self.conversations.contains(id) {
                return id;
            }
            self.registry.unregister(peer);
        }
        let id = self.allocate_id();
        self.registry.register(peer, id);
        self.conversations
            .insert(Conversation::new(id, peer, display_name));
        id
    }

    /// Close a conversation, dropping the transcript and the registry
    /// entry together so neither outlives the other.
    pub fn close_conversation(&self, id: ConversationId) {
        if let Some(conversation) = self.conversations.remove(id) {
            self.registry.unregister(conversation.peer());
        }
    }

    fn display_name_for(&self, peer: IpAddr) -> String {
        self.directory
            .as_ref()
            .and_then(|directory| directory.display_name_for(peer))
            .unwrap_or_else(|| peer.to_string())
    }

    fn allocate_id(&self) -> ConversationId {
        ConversationId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `tick` every `period` until the handle is shut down.
    ///
    /// The loop re-arms itself regardless of how many messages a tick
    /// processed, and it never blocks on I/O: it only drains whatever
    /// the connection handlers have already queued.
    pub fn spawn(self, period: Duration) -> DispatchHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick(),
                    _ = shutdown_rx.changed() => {
                        debug!("dispatch loop stopped");
                        break;
                    }
                }
            }
        });
        DispatchHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            registry: Arc::clone(&self.registry),
            conversations: self.conversations.clone(),
            directory: self.directory.clone(),
            events: self.events.clone(),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

/// Handle to a running dispatch loop.
///
/// Dropping the handle also stops the loop (the task notices the closed
/// shutdown channel on its next wakeup), so a spawned loop cannot leak
/// past the node that owns it.
pub struct DispatchHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
