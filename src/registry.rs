//! Peer-address to conversation lookup
//!
//! The registry answers one question for the dispatch loop: does a
//! conversation already exist for this peer? It holds only the address
//! to identifier mapping, never the conversation itself.

use crate::events::ConversationId;
use dashmap::DashMap;
use std::net::IpAddr;

/// Non-owning lookup from peer address to conversation identifier.
///
/// Invariant: an entry must not outlive its conversation and vice versa.
/// Closing a conversation removes its entry; a stale entry discovered
/// during dispatch is treated as "not found" and resynthesized rather
/// than surfaced as an error.
pub struct ConversationRegistry {
    entries: DashMap<IpAddr, ConversationId>,
}

impl ConversationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up the conversation registered for a peer.
    pub fn resolve(&self, peer: IpAddr) -> Option<ConversationId> {
        self.entries.get(&peer).map(|entry| *entry.value())
    }

    /// Register a conversation for a peer.
    ///
    /// Must happen before any message for that peer is appended, so a
    /// second message from the same first-contact peer in one drain
    /// resolves to the same conversation instead of synthesizing another.
    pub fn register(&self, peer: IpAddr, id: ConversationId) {
        self.entries.insert(peer, id);
    }

    /// Drop the entry for a peer, returning the identifier it mapped to.
    pub fn unregister(&self, peer: IpAddr) -> Option<ConversationId> {
        self.entries.remove(&peer).map(|(_, id)| id)
    }

    /// Whether a peer currently has a registered conversation.
    pub fn contains(&self, peer: IpAddr) -> bool {
        self.entries.contains_key(&peer)
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(last_octet: u8) -> IpAddr {
        IpAddr::V4([10, 0, 0, last_octet].into())
    }

    #[test]
    fn test_unknown_peer_resolves_to_none() {
        let registry = ConversationRegistry::new();
        assert_eq!(registry.resolve(peer(5)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_then_resolve() {
        let registry = ConversationRegistry::new();
        let id = ConversationId::new(1);

        registry.register(peer(5), id);
        assert_eq!(registry.resolve(peer(5)), Some(id));
        assert_eq!(registry.resolve(peer(9)), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolution_is_stable() {
        let registry = ConversationRegistry::new();
        let id = ConversationId::new(7);
        registry.register(peer(5), id);

        // Two lookups in the same tick must agree.
        assert_eq!(registry.resolve(peer(5)), registry.resolve(peer(5)));
    }

    #[test]
    fn test_unregister_removes_entry() {
        let registry = ConversationRegistry::new();
        let id = ConversationId::new(1);
        registry.register(peer(5), id);

        assert_eq!(registry.unregister(peer(5)), Some(id));
        assert!(!registry.contains(peer(5)));
        assert_eq!(registry.unregister(peer(5)), None);
    }
}
