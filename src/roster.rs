//! In-memory roster of known peers

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::interfaces::PeerDirectory;
use crate::types::{PeerHandle, PeerID, Position};

/// Roster entry for one peer
#[derive(Clone, Debug)]
pub struct RosterEntry {
    pub handle: PeerHandle,
    pub name: String,
    pub position: Position,
}

/// Tracks every avatar this process knows about, including its own.
///
/// Handles are allocated on first sight and never reused, so a stale handle
/// from a departed peer resolves to nothing instead of to somebody else.
pub struct Roster {
    by_id: DashMap<PeerID, RosterEntry>,
    by_handle: DashMap<PeerHandle, PeerID>,
    next_handle: AtomicU64,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_handle: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Insert a peer or refresh its name and position. Returns its handle.
    pub fn upsert(&self, id: &PeerID, name: &str, position: Position) -> PeerHandle {
        if let Some(mut entry) = self.by_id.get_mut(id) {
            entry.name = name.to_string();
            entry.position = position;
            return entry.handle;
        }

        let handle = PeerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.by_id.insert(
            id.clone(),
            RosterEntry {
                handle,
                name: name.to_string(),
                position,
            },
        );
        self.by_handle.insert(handle, id.clone());
        tracing::debug!("Roster: {} '{}' -> {}", id, name, handle);
        handle
    }

    /// Update a known peer's position. Returns false for unknown peers.
    pub fn move_to(&self, id: &PeerID, position: Position) -> bool {
        match self.by_id.get_mut(id) {
            Some(mut entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    /// Forget a peer; its handle stops resolving
    pub fn remove(&self, id: &PeerID) -> Option<RosterEntry> {
        let (_, entry) = self.by_id.remove(id)?;
        self.by_handle.remove(&entry.handle);
        Some(entry)
    }

    pub fn get(&self, id: &PeerID) -> Option<RosterEntry> {
        self.by_id.get(id).map(|e| e.value().clone())
    }

    /// Look up a peer by display name (first match)
    pub fn find_by_name(&self, name: &str) -> Option<(PeerID, PeerHandle)> {
        self.by_id
            .iter()
            .find(|e| e.value().name == name)
            .map(|e| (e.key().clone(), e.value().handle))
    }

    /// Display name for a peer, falling back to its short id
    pub fn display_name(&self, id: &PeerID) -> String {
        self.by_id
            .get(id)
            .map(|e| e.value().name.clone())
            .unwrap_or_else(|| id.short().to_string())
    }

    /// Snapshot of every known peer
    pub fn entries(&self) -> Vec<(PeerID, RosterEntry)> {
        let mut entries: Vec<_> = self
            .by_id
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(_, e)| e.handle.0);
        entries
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerDirectory for Roster {
    fn resolve(&self, id: &PeerID) -> Option<PeerHandle> {
        self.by_id.get(id).map(|e| e.value().handle)
    }

    fn owner_of(&self, handle: PeerHandle) -> Option<PeerID> {
        self.by_handle.get(&handle).map(|e| e.value().clone())
    }

    fn position_of(&self, handle: PeerHandle) -> Option<Position> {
        let id = self.owner_of(handle)?;
        self.by_id.get(&id).map(|e| e.value().position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_resolve() {
        let roster = Roster::new();
        let bob = PeerID("bob".to_string());

        let handle = roster.upsert(&bob, "Bob", Position::new(1.0, 0.0, 0.0));
        assert_eq!(roster.resolve(&bob), Some(handle));
        assert_eq!(roster.owner_of(handle), Some(bob.clone()));
        assert_eq!(roster.position_of(handle), Some(Position::new(1.0, 0.0, 0.0)));

        // Refresh keeps the handle
        let again = roster.upsert(&bob, "Bobby", Position::new(2.0, 0.0, 0.0));
        assert_eq!(again, handle);
        assert_eq!(roster.display_name(&bob), "Bobby");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_unresolved_lookups() {
        let roster = Roster::new();
        let ghost = PeerID("ghost".to_string());

        assert_eq!(roster.resolve(&ghost), None);
        assert_eq!(roster.owner_of(PeerHandle(42)), None);
        assert_eq!(roster.position_of(PeerHandle(42)), None);
        assert_eq!(roster.display_name(&ghost), "ghost");
        assert!(!roster.move_to(&ghost, Position::default()));
    }

    #[test]
    fn test_removed_handle_is_not_reused() {
        let roster = Roster::new();
        let bob = PeerID("bob".to_string());
        let carol = PeerID("carol".to_string());

        let old = roster.upsert(&bob, "Bob", Position::default());
        roster.remove(&bob);
        assert_eq!(roster.owner_of(old), None);

        let new = roster.upsert(&carol, "Carol", Position::default());
        assert_ne!(old, new);
    }

    #[test]
    fn test_find_by_name() {
        let roster = Roster::new();
        let bob = PeerID("bob".to_string());
        let handle = roster.upsert(&bob, "Bob", Position::default());

        assert_eq!(roster.find_by_name("Bob"), Some((bob, handle)));
        assert_eq!(roster.find_by_name("Nobody"), None);
    }
}
