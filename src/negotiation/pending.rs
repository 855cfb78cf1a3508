//! Pending trade requests with per-entry deadlines

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::PeerID;

use super::types::Direction;

/// One direction's set of pending requests.
///
/// Each peer appears at most once. Expiry is a sweep over deadlines on each
/// tick; an entry that was already resolved is simply absent, so a late sweep
/// never removes it twice.
#[derive(Debug)]
pub struct PendingRequests {
    direction: Direction,
    deadlines: HashMap<PeerID, Instant>,
}

impl PendingRequests {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            deadlines: HashMap::new(),
        }
    }

    /// Add a peer with a deadline `ttl` from `now`. Returns false (and leaves
    /// the existing deadline untouched) if the peer is already pending.
    pub fn insert(&mut self, peer: PeerID, now: Instant, ttl: Duration) -> bool {
        if self.deadlines.contains_key(&peer) {
            return false;
        }
        let deadline = now + ttl;
        tracing::debug!("{:?} request pending for {} until {:?}", self.direction, peer, deadline);
        self.deadlines.insert(peer, deadline);
        true
    }

    /// Resolve a pending request. Returns whether it was present.
    pub fn remove(&mut self, peer: &PeerID) -> bool {
        self.deadlines.remove(peer).is_some()
    }

    pub fn contains(&self, peer: &PeerID) -> bool {
        self.deadlines.contains_key(peer)
    }

    pub fn deadline(&self, peer: &PeerID) -> Option<Instant> {
        self.deadlines.get(peer).copied()
    }

    /// Drop every entry whose deadline has passed. Returns the expired peers.
    pub fn expire(&mut self, now: Instant) -> Vec<PeerID> {
        let mut expired = Vec::new();
        self.deadlines.retain(|peer, deadline| {
            if *deadline <= now {
                expired.push(peer.clone());
                false
            } else {
                true
            }
        });

        for peer in &expired {
            tracing::debug!("{:?} request for {} expired", self.direction, peer);
        }
        expired
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerID> {
        self.deadlines.keys()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    fn peer(name: &str) -> PeerID {
        PeerID(name.to_string())
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let now = Instant::now();
        let mut pending = PendingRequests::new(Direction::Sent);

        assert!(pending.insert(peer("bob"), now, TTL));
        assert!(!pending.insert(peer("bob"), now + Duration::from_secs(5), TTL));

        assert_eq!(pending.len(), 1);
        // Original deadline kept
        assert_eq!(pending.deadline(&peer("bob")), Some(now + TTL));
    }

    #[test]
    fn test_expire_at_deadline() {
        let now = Instant::now();
        let mut pending = PendingRequests::new(Direction::Received);
        pending.insert(peer("bob"), now, TTL);
        pending.insert(peer("carol"), now + Duration::from_secs(3), TTL);

        assert!(pending.expire(now + Duration::from_secs(9)).is_empty());
        assert_eq!(pending.expire(now + TTL), vec![peer("bob")]);
        assert!(!pending.contains(&peer("bob")));
        assert!(pending.contains(&peer("carol")));
        assert_eq!(pending.next_deadline(), Some(now + Duration::from_secs(13)));
    }

    #[test]
    fn test_resolved_entry_not_expired_again() {
        let now = Instant::now();
        let mut pending = PendingRequests::new(Direction::Sent);
        pending.insert(peer("bob"), now, TTL);

        assert!(pending.remove(&peer("bob")));
        assert!(pending.expire(now + TTL * 2).is_empty());
        assert!(!pending.remove(&peer("bob")));
    }

    #[test]
    fn test_reinsert_after_resolve_gets_fresh_deadline() {
        let now = Instant::now();
        let mut pending = PendingRequests::new(Direction::Sent);
        pending.insert(peer("bob"), now, TTL);
        pending.remove(&peer("bob"));

        let later = now + Duration::from_secs(8);
        pending.insert(peer("bob"), later, TTL);

        // The first request's deadline passing does not touch the new one
        assert!(pending.expire(now + TTL).is_empty());
        assert!(pending.contains(&peer("bob")));
    }
}
