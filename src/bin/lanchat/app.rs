//! Application state for the terminal UI

use lanchat::{ChatNode, ConversationId, Event, TranscriptEntry};
use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::debug;

/// Input mode for the chat application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal mode - keyboard shortcuts active
    Normal,
    /// Editing mode - typing a message
    Editing,
}

/// One row in the sidebar: an open conversation, or a contact from the
/// address book that doesn't have one yet.
pub struct SidebarEntry {
    pub label: String,
    pub peer: IpAddr,
    pub conversation: Option<ConversationId>,
}

/// Main application state
pub struct App {
    /// The chat node
    pub node: ChatNode,
    /// Current input buffer
    pub input: String,
    /// Input mode
    pub input_mode: InputMode,
    /// Selected sidebar row
    pub selected: usize,
    /// Conversation the input box sends to
    pub focused: Option<ConversationId>,
    /// Status line text
    pub status: String,
    /// Event receiver channel
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl App {
    /// Create the application and subscribe it to the node's events.
    pub fn new(node: ChatNode) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        node.on_event(move |event| {
            let _ = event_tx.send(event);
        });

        Self {
            node,
            input: String::new(),
            input_mode: InputMode::Normal,
            selected: 0,
            focused: None,
            status: "Enter opens the selected conversation, i to type, x to close, q to quit"
                .to_string(),
            event_rx,
        }
    }

    /// Sidebar rows: every open conversation first, then address-book
    /// contacts that don't have one yet.
    pub fn sidebar(&self) -> Vec<SidebarEntry> {
        let store = self.node.conversations();
        let mut rows: Vec<SidebarEntry> = store
            .ids()
            .into_iter()
            .filter_map(|id| {
                store.with(id, |conversation| SidebarEntry {
                    label: conversation.display_name().to_string(),
                    peer: conversation.peer(),
                    conversation: Some(id),
                })
            })
            .collect();

        if let Some(directory) = self.node.directory() {
            for contact in directory.contacts() {
                if !rows.iter().any(|row| row.peer == contact.address) {
                    rows.push(SidebarEntry {
                        label: contact.display_name.clone(),
                        peer: contact.address,
                        conversation: None,
                    });
                }
            }
        }
        rows
    }

    /// Move the sidebar selection up, wrapping.
    pub fn select_previous(&mut self) {
        let rows = self.sidebar().len();
        if rows == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            rows - 1
        } else {
            self.selected - 1
        };
    }

    /// Move the sidebar selection down, wrapping.
    pub fn select_next(&mut self) {
        let rows = self.sidebar().len();
        if rows == 0 {
            return;
        }
        self.selected = if self.selected + 1 >= rows {
            0
        } else {
            self.selected + 1
        };
    }

    /// Open (or focus) the conversation for the selected sidebar row and
    /// start typing.
    pub fn open_selected(&mut self) {
        let rows = self.sidebar();
        let Some(row) = rows.get(self.selected) else {
            return;
        };
        let id = match row.conversation {
            Some(id) => id,
            None => self.node.open_conversation(row.peer, &row.label),
        };
        self.focused = Some(id);
        self.input_mode = InputMode::Editing;
        self.status = format!("Chatting with {}", row.label);
    }

    /// Close the focused conversation.
    pub fn close_focused(&mut self) {
        if let Some(id) = self.focused.take() {
            self.node.close_conversation(id);
            self.selected = 0;
            self.status = "Conversation closed".to_string();
        }
    }

    /// Drain pending dispatcher events (non-blocking).
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                Event::ConversationOpened {
                    id,
                    peer,
                    display_name,
                    ..
                } => {
                    debug!(%peer, "conversation opened from event");
                    self.status = format!("New conversation from {} ({})", display_name, peer);
                    // First unsolicited contact grabs focus only if the
                    // user isn't already in a conversation.
                    if self.focused.is_none() {
                        self.focused = Some(id);
                    }
                }
                Event::MessageReceived { .. } => {
                    // The transcript lives in the store; the next draw
                    // picks it up without any bookkeeping here.
                }
            }
        }
    }

    /// Send the input box to the focused conversation.
    ///
    /// An unreachable peer becomes an inline `[user is unavailable]`
    /// notice in the transcript, exactly like a failed call would show in
    /// the window that made it.
    pub async fn send_current_input(&mut self) {
        let text = std::mem::take(&mut self.input);
        if text.is_empty() {
            return;
        }
        let Some(id) = self.focused else {
            self.status = "No conversation selected".to_string();
            return;
        };
        if let Err(error) = self.node.send_to(id, &text).await {
            if error.is_unreachable() {
                self.node
                    .conversations()
                    .with_mut(id, |c| c.append_notice("[user is unavailable]"));
            } else {
                self.status = format!("Send failed: {}", error);
            }
        }
    }

    /// Snapshot of the focused conversation's transcript for rendering.
    pub fn focused_transcript(&self) -> Vec<TranscriptEntry> {
        self.focused
            .and_then(|id| {
                self.node
                    .conversations()
                    .with(id, |c| c.transcript().to_vec())
            })
            .unwrap_or_default()
    }

    /// Title for the transcript pane.
    pub fn focused_title(&self) -> String {
        self.focused
            .and_then(|id| {
                self.node
                    .conversations()
                    .with(id, |c| c.display_name().to_string())
            })
            .unwrap_or_else(|| "no conversation".to_string())
    }
}
