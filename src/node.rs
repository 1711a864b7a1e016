//! Node implementation - the main entry point for lanchat
//!
//! A node wires the whole pipeline together: the listener feeding the
//! inbound queue, the dispatch loop draining it, the registry and store
//! they route into, and the address book that names known peers. The UI
//! talks to the node; everything else stays internal.

use crate::config::ChatConfig;
use crate::conversation::ConversationStore;
use crate::directory::ContactDirectory;
use crate::dispatch::{DispatchHandle, Dispatcher};
use crate::error::{Error, Result};
use crate::events::{ConversationId, Event, EventHandlers, SubscriptionHandle};
use crate::network::{send_message, MessageListener};
use crate::queue::InboundQueue;
use crate::registry::ConversationRegistry;
use parking_lot::{Mutex, RwLock};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Current operational state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Node has been created but not started
    Created,
    /// Node is binding its listener
    Starting,
    /// Node is accepting and dispatching messages
    Running,
    /// Node is shutting its tasks down
    Stopping,
    /// Node has stopped
    Stopped,
}

/// Builder for creating `ChatNode` instances
///
/// # Examples
///
/// ```no_run
/// use lanchat::ChatNodeBuilder;
///
/// # async fn example() -> lanchat::Result<()> {
/// let node = ChatNodeBuilder::new().with_port(12141).build()?;
/// node.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatNodeBuilder {
    config: ChatConfig,
    directory: Option<ContactDirectory>,
}

impl ChatNodeBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ChatConfig::default(),
            directory: None,
        }
    }

    /// Set the listener bind address (default: all interfaces).
    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.config = self.config.with_bind_address(address);
        self
    }

    /// Set the TCP port for inbound and outbound messages.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config = self.config.with_port(port);
        self
    }

    /// Set how often the dispatch loop drains the inbound queue.
    pub fn with_dispatch_interval(mut self, interval: std::time::Duration) -> Self {
        self.config = self.config.with_dispatch_interval(interval);
        self
    }

    /// Set the per-message size cap for inbound connections.
    pub fn with_max_message_bytes(mut self, bytes: usize) -> Self {
        self.config = self.config.with_max_message_bytes(bytes);
        self
    }

    /// Set the per-read idle timeout for inbound connections.
    pub fn with_idle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.with_idle_timeout(timeout);
        self
    }

    /// Set the cap on concurrently handled inbound connections.
    pub fn with_max_connections(mut self, count: usize) -> Self {
        self.config = self.config.with_max_connections(count);
        self
    }

    /// Attach an address book for naming known peers.
    pub fn with_directory(mut self, directory: ContactDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Build the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<ChatNode> {
        self.config.validate()?;

        let queue = InboundQueue::new();
        let registry = Arc::new(ConversationRegistry::new());
        let conversations = ConversationStore::new();
        let events = EventHandlers::new();
        let directory = self.directory.map(Arc::new);
        let dispatcher = Dispatcher::new(
            queue.clone(),
            Arc::clone(&registry),
            conversations.clone(),
            directory.clone(),
            events.clone(),
        );

        Ok(ChatNode {
            config: self.config,
            queue,
            conversations,
            directory,
            events,
            dispatcher,
            state: RwLock::new(NodeState::Created),
            local_addr: Mutex::new(None),
            listener_task: Mutex::new(None),
            dispatch_handle: Mutex::new(None),
        })
    }
}

impl Default for ChatNodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One running chat instance: listener, queue, dispatch loop, and the
/// conversations they feed.
///
/// # Examples
///
/// ```no_run
/// use lanchat::{ChatNodeBuilder, Event};
///
/// # async fn example() -> lanchat::Result<()> {
/// let node = ChatNodeBuilder::new().build()?;
/// node.on_event(|event| {
///     if let Event::ConversationOpened { display_name, text, .. } = event {
///         println!("{} says: {}", display_name, text);
///     }
/// });
/// node.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatNode {
    config: ChatConfig,
    queue: InboundQueue,
    conversations: ConversationStore,
    directory: Option<Arc<ContactDirectory>>,
    events: EventHandlers,
    dispatcher: Dispatcher,
    state: RwLock<NodeState>,
    local_addr: Mutex<Option<SocketAddr>>,
    listener_task: Mutex<Option<JoinHandle<()>>>,
    dispatch_handle: Mutex<Option<DispatchHandle>>,
}

impl ChatNode {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the node: bind the listener, then spawn the accept loop and
    /// the dispatch loop.
    ///
    /// # Errors
    ///
    /// Returns `Error::Bind` if the listener cannot acquire its port (the
    /// fatal startup case), or `Error::Config` if the node is not in a
    /// startable state.
    pub async fn start(&self) -> Result<()> {
        {
            let state = self.state.read();
            if *state != NodeState::Created && *state != NodeState::Stopped {
                return Err(Error::Config {
                    reason: format!("node cannot start from the {:?} state", *state),
                });
            }
        }
        *self.state.write() = NodeState::Starting;

        let listener = match MessageListener::bind(&self.config, self.queue.clone()).await {
            Ok(listener) => listener,
            Err(error) => {
                *self.state.write() = NodeState::Created;
                return Err(error);
            }
        };
        let address = match listener.local_addr() {
            Ok(address) => address,
            Err(error) => {
                *self.state.write() = NodeState::Created;
                return Err(error);
            }
        };

        *self.local_addr.lock() = Some(address);
        *self.listener_task.lock() = Some(listener.spawn());
        *self.dispatch_handle.lock() = Some(
            self.dispatcher
                .clone()
                .spawn(self.config.dispatch_interval),
        );
        *self.state.write() = NodeState::Running;

        info!(%address, "node started");
        Ok(())
    }

    /// Stop the node: stop accepting, shut the dispatch loop down.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the node is not running.
    pub async fn stop(&self) -> Result<()> {
        {
            let state = self.state.read();
            if *state != NodeState::Running {
                return Err(Error::Config {
                    reason: format!("node cannot stop from the {:?} state", *state),
                });
            }
        }
        *self.state.write() = NodeState::Stopping;

        if let Some(task) = self.listener_task.lock().take() {
            task.abort();
        }
        let dispatch = self.dispatch_handle.lock().take();
        if let Some(handle) = dispatch {
            handle.shutdown().await;
        }
        *self.local_addr.lock() = None;
        *self.state.write() = NodeState::Stopped;

        info!("node stopped");
        Ok(())
    }

    /// Current operational state.
    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    /// Address the listener is bound to, once running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a handler for dispatch-loop events.
    pub fn on_event<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Remove a previously registered event handler.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.events.unsubscribe(handle);
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    /// Handle to the live conversations, shared with the dispatch loop.
    pub fn conversations(&self) -> ConversationStore {
        self.conversations.clone()
    }

    /// The attached address book, if any.
    pub fn directory(&self) -> Option<&ContactDirectory> {
        self.directory.as_deref()
    }

    /// Open a conversation with a known peer (the address-book path).
    ///
    /// Returns the existing identifier if the peer already has a live
    /// conversation: every peer address has at most one.
    pub fn open_conversation(&self, peer: IpAddr, display_name: &str) -> ConversationId {
        self.dispatcher.open_conversation(peer, display_name)
    }

    /// Close a conversation, removing its transcript and registry entry.
    ///
    /// A message arriving from the peer afterwards synthesizes a fresh
    /// conversation.
    pub fn close_conversation(&self, id: ConversationId) {
        self.dispatcher.close_conversation(id);
    }

    /// Send `text` to the conversation's peer.
    ///
    /// The text is appended to the transcript first, then delivered with
    /// a one-shot connection to the configured port, so the user sees
    /// their own words even when delivery fails. Delivery failures come
    /// back to the caller, which is expected to render them inside the
    /// conversation rather than crash.
    ///
    /// # Errors
    ///
    /// `Error::UnknownConversation` if `id` is not live;
    /// `Error::Connect`/`Error::Send` if the peer cannot be reached.
    pub async fn send_to(&self, id: ConversationId, text: &str) -> Result<()> {
        let peer = self
            .conversations
            .with(id, |conversation| conversation.peer())
            .ok_or(Error::UnknownConversation { id })?;

        self.conversations
            .with_mut(id, |conversation| conversation.append_outgoing(text));

        send_message(SocketAddr::new(peer, self.config.port), text).await
    }
}
