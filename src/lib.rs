//! # lanchat
//!
//! A peer-to-peer LAN chat tool. Every node is both server and client: an
//! inbound listener accepts one TCP connection per message and reads it to
//! EOF (no framing, no headers), a thread-safe queue hands the payload to
//! a periodic dispatch loop, and the dispatch loop routes it to the right
//! conversation, synthesizing one the first time an unknown peer makes
//! contact. Outbound messages are one-shot connect-write-close with no
//! retry and no acknowledgement.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lanchat::{ChatNodeBuilder, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = ChatNodeBuilder::new().with_port(12141).build()?;
//!
//!     node.on_event(|event| {
//!         if let Event::ConversationOpened { display_name, text, .. } = event {
//!             println!("{} says: {}", display_name, text);
//!         }
//!     });
//!
//!     node.start().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod conversation;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod network;
pub mod node;
pub mod queue;
pub mod registry;

// Re-export main types
pub use config::{ChatConfig, DEFAULT_PORT};
pub use conversation::{Conversation, ConversationStore, EntryKind, TranscriptEntry};
pub use directory::{Contact, ContactDirectory};
pub use dispatch::{DispatchHandle, Dispatcher};
pub use error::{Error, Result};
pub use events::{ConversationId, Event, EventHandlers, SubscriptionHandle};
pub use network::{send_message, MessageListener};
pub use node::{ChatNode, ChatNodeBuilder, NodeState};
pub use queue::{InboundQueue, RawMessage};
pub use registry::ConversationRegistry;
