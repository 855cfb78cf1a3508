//! Local peer readiness signal.
//!
//! The local avatar appears some time after the process starts. A
//! [`LocalPeerSignal`] publishes it; interested components hold a
//! [`LocalPeerSubscription`] for as long as they live and poll it from their
//! tick. Dropping the subscription unsubscribes.

use tokio::sync::watch;

use crate::types::LocalPeer;

/// Publisher for the local peer reference
pub struct LocalPeerSignal {
    tx: watch::Sender<Option<LocalPeer>>,
}

impl LocalPeerSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Announce (or replace) the local peer
    pub fn publish(&self, local: LocalPeer) {
        tracing::debug!("Local peer ready: {} ({})", local.id, local.handle);
        self.tx.send_replace(Some(local));
    }

    /// Withdraw the local peer (avatar despawned)
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Current value without subscribing
    pub fn current(&self) -> Option<LocalPeer> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> LocalPeerSubscription {
        let mut rx = self.tx.subscribe();
        // Treat an already-published peer as a pending change
        rx.mark_changed();
        LocalPeerSubscription { rx }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalPeerSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration on a [`LocalPeerSignal`]
pub struct LocalPeerSubscription {
    rx: watch::Receiver<Option<LocalPeer>>,
}

impl LocalPeerSubscription {
    /// Cheap non-blocking poll. Returns `Some(value)` only when the published
    /// value changed since the last poll.
    pub fn poll_change(&mut self) -> Option<Option<LocalPeer>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            // Unchanged, or the publisher is gone
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PeerHandle, PeerID};

    fn local() -> LocalPeer {
        LocalPeer {
            id: PeerID("me".to_string()),
            handle: PeerHandle(1),
        }
    }

    #[test]
    fn test_poll_before_publish() {
        let signal = LocalPeerSignal::new();
        let mut sub = signal.subscribe();

        // Initial value is reported once, then nothing until a change
        assert_eq!(sub.poll_change(), Some(None));
        assert_eq!(sub.poll_change(), None);

        signal.publish(local());
        assert_eq!(sub.poll_change(), Some(Some(local())));
        assert_eq!(sub.poll_change(), None);
    }

    #[test]
    fn test_subscribe_after_publish_sees_value() {
        let signal = LocalPeerSignal::new();
        signal.publish(local());

        let mut sub = signal.subscribe();
        assert_eq!(sub.poll_change(), Some(Some(local())));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let signal = LocalPeerSignal::new();
        assert_eq!(signal.subscriber_count(), 0);

        let sub = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 1);

        drop(sub);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_clear() {
        let signal = LocalPeerSignal::new();
        signal.publish(local());
        let mut sub = signal.subscribe();
        sub.poll_change();

        signal.clear();
        assert_eq!(sub.poll_change(), Some(None));
        assert_eq!(signal.current(), None);
    }
}
