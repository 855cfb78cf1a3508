//! In-process peers on a simulated clock.
//!
//! Each [`SimPeer`] has its own roster, notices, and outbox, just like a real
//! node; [`SimWorld`] stands in for the transport and lets the caller decide
//! when (and whether) queued messages arrive.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::config::NegotiationConfig;
use crate::layout::WindowLayout;
use crate::negotiation::NegotiationAction;
use crate::node::{Collaborators, TradeNode};
use crate::notify::NoticeLog;
use crate::p2p::{channel, Outbound, OutboundQueue};
use crate::readiness::LocalPeerSignal;
use crate::roster::Roster;
use crate::types::{LocalPeer, PeerHandle, PeerID, Position};

/// One simulated participant
pub struct SimPeer {
    pub id: PeerID,
    pub name: String,
    pub roster: Arc<Roster>,
    pub readiness: LocalPeerSignal,
    pub notices: Arc<NoticeLog>,
    pub layout: Arc<WindowLayout>,
    pub node: TradeNode,
    outbox: mpsc::UnboundedReceiver<Outbound>,
}

impl SimPeer {
    /// This peer's handle for another participant
    pub fn handle_of(&self, other: &PeerID) -> Option<PeerHandle> {
        self.roster.get(other).map(|e| e.handle)
    }

    /// Publish the local avatar on the readiness signal
    pub fn spawn_avatar(&self) {
        if let Some(entry) = self.roster.get(&self.id) {
            self.readiness.publish(LocalPeer {
                id: self.id.clone(),
                handle: entry.handle,
            });
        }
    }
}

/// A set of peers sharing one clock
pub struct SimWorld {
    config: NegotiationConfig,
    peers: Vec<SimPeer>,
    now: Instant,
}

impl SimWorld {
    pub fn new(config: NegotiationConfig) -> Self {
        Self {
            config,
            peers: Vec::new(),
            now: Instant::now(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Add a peer whose avatar is already spawned. Returns its index.
    pub fn add_peer(&mut self, name: &str, position: Position) -> usize {
        let index = self.add_unready_peer(name, position);
        self.peers[index].spawn_avatar();
        self.peers[index].node.tick(self.now);
        index
    }

    /// Add a peer that has not spawned its avatar yet
    pub fn add_unready_peer(&mut self, name: &str, position: Position) -> usize {
        let id = PeerID::from_pubkey(name.as_bytes());
        let roster = Arc::new(Roster::new());

        // Everybody sees everybody, including themselves
        for existing in &self.peers {
            let pos = existing
                .roster
                .get(&existing.id)
                .map(|e| e.position)
                .unwrap_or_default();
            roster.upsert(&existing.id, &existing.name, pos);
            existing.roster.upsert(&id, name, position);
        }
        roster.upsert(&id, name, position);

        let readiness = LocalPeerSignal::new();
        let notices = Arc::new(NoticeLog::new());
        let layout = Arc::new(WindowLayout::new());
        let (queue, outbox) = OutboundQueue::new();

        let node = TradeNode::new(
            self.config.clone(),
            &readiness,
            Collaborators {
                directory: roster.clone(),
                channel: Arc::new(queue),
                notifier: notices.clone(),
                layout: layout.clone(),
            },
        );

        self.peers.push(SimPeer {
            id,
            name: name.to_string(),
            roster,
            readiness,
            notices,
            layout,
            node,
            outbox,
        });
        self.peers.len() - 1
    }

    pub fn peer(&self, index: usize) -> &SimPeer {
        &self.peers[index]
    }

    pub fn peer_mut(&mut self, index: usize) -> &mut SimPeer {
        &mut self.peers[index]
    }

    pub fn id(&self, index: usize) -> PeerID {
        self.peers[index].id.clone()
    }

    /// Move a peer in every roster
    pub fn move_peer(&mut self, index: usize, position: Position) {
        let id = self.id(index);
        for peer in &self.peers {
            peer.roster.move_to(&id, position);
        }
    }

    /// Advance the clock and tick every node
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        for peer in &mut self.peers {
            peer.node.tick(self.now);
        }
    }

    /// `from` presses interact while looking at `to`
    pub fn interact(&mut self, from: usize, to: usize) -> NegotiationAction {
        let target_id = self.id(to);
        let now = self.now;
        let peer = &mut self.peers[from];
        let target = peer.handle_of(&target_id);
        peer.node.interact(target, now)
    }

    /// Take everything `index` has queued without delivering it
    pub fn take_outbound(&mut self, index: usize) -> Vec<Outbound> {
        channel::drain(&mut self.peers[index].outbox)
    }

    /// Deliver one message sent by `from`. Returns `None` if the addressee
    /// is not part of this world.
    pub fn deliver(&mut self, from: usize, outbound: &Outbound) -> Option<NegotiationAction> {
        let sender = self.id(from);
        let now = self.now;
        let target = self.peers.iter_mut().find(|p| p.id == outbound.to)?;
        Some(
            target
                .node
                .handle_message(&sender, &outbound.message, now),
        )
    }

    /// Deliver everything currently queued, in send order per peer.
    /// Returns the number of messages delivered.
    pub fn deliver_all(&mut self) -> usize {
        let mut delivered = 0;
        for from in 0..self.peers.len() {
            for outbound in self.take_outbound(from) {
                if self.deliver(from, &outbound).is_some() {
                    delivered += 1;
                }
            }
        }
        delivered
    }
}
