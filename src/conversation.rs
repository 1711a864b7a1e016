//! Conversations and their transcripts
//!
//! A conversation is the ongoing exchange with one peer: a stable
//! identifier, a display name, the peer's address, and the transcript.
//! The store owns every live conversation; closing a window removes the
//! conversation from the store (and its registry entry with it).

use crate::events::ConversationId;
use chrono::{DateTime, Local};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Transcript timestamp format, e.g. `Mon, Jan 05, 2026 14:30:00`.
const TIMESTAMP_FMT: &str = "%a, %b %d, %Y %H:%M:%S";

/// Minutes of inactivity after which a fresh time marker is stamped.
const MARKER_STALE_MINUTES: i64 = 5;

/// What produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Text received from the peer
    Incoming,
    /// Text the local user sent
    Outgoing,
    /// A local annotation, e.g. a delivery failure
    Notice,
    /// A time marker separating quiet periods
    TimeMarker,
}

/// One line of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// When the entry was appended
    pub timestamp: DateTime<Local>,
    /// What produced it
    pub kind: EntryKind,
    /// The text itself
    pub text: String,
}

/// The ongoing exchange with one peer.
///
/// A new transcript begins with a time marker, and a fresh marker is
/// stamped whenever an entry lands more than five minutes after the
/// previous one.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    peer: IpAddr,
    display_name: String,
    transcript: Vec<TranscriptEntry>,
    last_stamp: DateTime<Local>,
}

impl Conversation {
    /// Create a conversation for a peer. Stamps the opening time marker.
    pub fn new(id: ConversationId, peer: IpAddr, display_name: impl Into<String>) -> Self {
        let mut conversation = Self {
            id,
            peer,
            display_name: display_name.into(),
            transcript: Vec::new(),
            last_stamp: Local::now(),
        };
        conversation.push_marker(conversation.last_stamp);
        conversation
    }

    /// Identifier of this conversation.
    pub fn id(&self) -> ConversationId {
        self.id
    }

    /// Address of the peer this conversation belongs to.
    pub fn peer(&self) -> IpAddr {
        self.peer
    }

    /// Name shown in the window title and sidebar.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The transcript, oldest entry first.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Timestamp of the most recent entry.
    pub fn last_activity(&self) -> DateTime<Local> {
        self.transcript
            .last()
            .map(|entry| entry.timestamp)
            .unwrap_or(self.last_stamp)
    }

    /// Append text received from the peer.
    pub fn append_incoming(&mut self, text: &str) {
        self.append(EntryKind::Incoming, text);
    }

    /// Append text the local user sent.
    pub fn append_outgoing(&mut self, text: &str) {
        self.append(EntryKind::Outgoing, text);
    }

    /// Append a local annotation, e.g. `[user is unavailable]`.
    pub fn append_notice(&mut self, text: &str) {
        self.append(EntryKind::Notice, text);
    }

    fn append(&mut self, kind: EntryKind, text: &str) {
        let now = Local::now();
        if now - self.last_stamp >= chrono::Duration::minutes(MARKER_STALE_MINUTES) {
            self.push_marker(now);
        }
        self.transcript.push(TranscriptEntry {
            timestamp: now,
            kind,
            text: text.to_string(),
        });
    }

    fn push_marker(&mut self, now: DateTime<Local>) {
        self.transcript.push(TranscriptEntry {
            timestamp: now,
            kind: EntryKind::TimeMarker,
            text: now.format(TIMESTAMP_FMT).to_string(),
        });
        self.last_stamp = now;
    }
}

/// Shared ownership of every live conversation.
///
/// Cloning produces another handle to the same map, so the dispatch loop
/// (which appends) and the UI (which renders and closes) see one set of
/// conversations. Access goes through closures to keep the map's guards
/// out of the public surface.
pub struct ConversationStore {
    inner: Arc<DashMap<ConversationId, Conversation>>,
}

impl ConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Insert a conversation, keyed by its identifier.
    pub fn insert(&self, conversation: Conversation) {
        self.inner.insert(conversation.id(), conversation);
    }

    /// Whether a conversation is currently live.
    pub fn contains(&self, id: ConversationId) -> bool {
        self.inner.contains_key(&id)
    }

    /// Run `f` against the conversation, if it is live.
    pub fn with<R>(&self, id: ConversationId, f: impl FnOnce(&Conversation) -> R) -> Option<R> {
        self.inner.get(&id).map(|guard| f(guard.value()))
    }

    /// Run `f` against the conversation mutably, if it is live.
    pub fn with_mut<R>(
        &self,
        id: ConversationId,
        f: impl FnOnce(&mut Conversation) -> R,
    ) -> Option<R> {
        self.inner.get_mut(&id).map(|mut guard| f(guard.value_mut()))
    }

    /// Remove a conversation, returning it if it was live.
    pub fn remove(&self, id: ConversationId) -> Option<Conversation> {
        self.inner.remove(&id).map(|(_, conversation)| conversation)
    }

    /// Identifiers of every live conversation, oldest first.
    pub fn ids(&self) -> Vec<ConversationId> {
        let mut ids: Vec<_> = self.inner.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    /// Number of live conversations.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no conversations are live.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ConversationStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new(
            ConversationId::new(1),
            "10.0.0.5".parse().unwrap(),
            "workstation",
        )
    }

    #[test]
    fn test_new_transcript_starts_with_marker() {
        let conversation = conversation();
        assert_eq!(conversation.transcript().len(), 1);
        assert_eq!(conversation.transcript()[0].kind, EntryKind::TimeMarker);
    }

    #[test]
    fn test_appends_carry_their_kind() {
        let mut conversation = conversation();
        conversation.append_incoming("hello");
        conversation.append_outgoing("hi back");
        conversation.append_notice("[user is unavailable]");

        let kinds: Vec<_> = conversation
            .transcript()
            .iter()
            .skip(1)
            .map(|entry| entry.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Incoming, EntryKind::Outgoing, EntryKind::Notice]
        );
    }

    #[test]
    fn test_no_marker_within_five_minutes() {
        let mut conversation = conversation();
        conversation.append_incoming("hello");
        conversation.append_incoming("again");

        let markers = conversation
            .transcript()
            .iter()
            .filter(|entry| entry.kind == EntryKind::TimeMarker)
            .count();
        assert_eq!(markers, 1);
    }

    #[test]
    fn test_stale_append_stamps_fresh_marker() {
        let mut conversation = conversation();
        conversation.last_stamp = Local::now() - chrono::Duration::minutes(6);
        conversation.append_incoming("back after a while");

        let kinds: Vec<_> = conversation
            .transcript()
            .iter()
            .map(|entry| entry.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::TimeMarker,
                EntryKind::TimeMarker,
                EntryKind::Incoming
            ]
        );
    }

    #[test]
    fn test_store_round_trip() {
        let store = ConversationStore::new();
        store.insert(conversation());
        let id = ConversationId::new(1);

        assert!(store.contains(id));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.with(id, |c| c.display_name().to_string()),
            Some("workstation".to_string())
        );

        store.with_mut(id, |c| c.append_incoming("hello"));
        assert_eq!(store.with(id, |c| c.transcript().len()), Some(2));

        let removed = store.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(store.is_empty());
        assert_eq!(store.with(id, |c| c.transcript().len()), None);
    }

    #[test]
    fn test_store_clones_share_conversations() {
        let store = ConversationStore::new();
        let other = store.clone();
        store.insert(conversation());

        assert!(other.contains(ConversationId::new(1)));
        assert_eq!(other.ids(), vec![ConversationId::new(1)]);
    }
}
