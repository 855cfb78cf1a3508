//! Negotiator: request bookkeeping and the request/accept decision

use crate::config::NegotiationConfig;
use crate::interfaces::{MessageChannel, Notifier, PeerDirectory};
use crate::p2p::NetworkMessage;
use crate::readiness::{LocalPeerSignal, LocalPeerSubscription};
use crate::types::{LocalPeer, PeerHandle, PeerID};
use std::sync::Arc;
use std::time::Instant;

use super::pending::PendingRequests;
use super::session::SessionController;
use super::types::{Direction, NegotiationAction, Notice};

/// Tracks outbound and inbound trade requests for the local peer and turns
/// a single "interact" input into either a request or an acceptance.
pub struct Negotiator {
    config: NegotiationConfig,
    sent: PendingRequests,
    received: PendingRequests,
    local: Option<LocalPeer>,
    readiness: Option<LocalPeerSubscription>,
    directory: Arc<dyn PeerDirectory>,
    channel: Arc<dyn MessageChannel>,
    notifier: Arc<dyn Notifier>,
}

impl Negotiator {
    /// Create a negotiator subscribed to `readiness` until [`shutdown`](Self::shutdown)
    pub fn new(
        config: NegotiationConfig,
        readiness: &LocalPeerSignal,
        directory: Arc<dyn PeerDirectory>,
        channel: Arc<dyn MessageChannel>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut negotiator = Self {
            config,
            sent: PendingRequests::new(Direction::Sent),
            received: PendingRequests::new(Direction::Received),
            local: None,
            readiness: Some(readiness.subscribe()),
            directory,
            channel,
            notifier,
        };
        negotiator.poll_readiness();
        negotiator
    }

    /// Per-frame work: pick up the local peer and expire stale requests
    pub fn tick(&mut self, now: Instant) {
        self.poll_readiness();
        self.expire(now);
    }

    /// Check the readiness signal. Returns whether the local peer is known.
    pub fn poll_readiness(&mut self) -> bool {
        if let Some(change) = self.readiness.as_mut().and_then(|sub| sub.poll_change()) {
            match &change {
                Some(local) => tracing::info!("Negotiator ready as {}", local.id),
                None if self.local.is_some() => tracing::info!("Local peer withdrawn"),
                None => {}
            }
            self.local = change;
        }
        self.local.is_some()
    }

    /// Drop requests whose deadline has passed. Silent: nothing is sent.
    pub fn expire(&mut self, now: Instant) -> usize {
        let sent = self.sent.expire(now);
        let received = self.received.expire(now);
        sent.len() + received.len()
    }

    /// Handle the local "interact" input aimed at `target`.
    ///
    /// In order: ignore invalid or out-of-range targets, refuse to re-request
    /// a pending peer, accept if the target already asked us, otherwise send
    /// a fresh request.
    pub fn try_initiate_or_accept(
        &mut self,
        target: Option<PeerHandle>,
        now: Instant,
        sessions: &mut SessionController,
    ) -> NegotiationAction {
        let Some((local_id, target_id)) = self.resolve_target(target) else {
            return NegotiationAction::Ignored;
        };

        if self.sent.contains(&target_id) {
            tracing::debug!("Request to {} still pending", target_id);
            self.notify(Notice::RequestRecentlySent { to: target_id });
            return NegotiationAction::AlreadyRequested;
        }

        if self.received.remove(&target_id) {
            tracing::info!("Accepting trade request from {}", target_id);
            let action = self.start_trading_with(&target_id, sessions);
            self.channel
                .send(&target_id, NetworkMessage::start_trading(&local_id));
            return action;
        }

        self.sent
            .insert(target_id.clone(), now, self.config.request_timeout());
        tracing::info!("Sending trade request to {}", target_id);
        self.notify(Notice::RequestSent {
            to: target_id.clone(),
        });
        self.channel
            .send(&target_id, NetworkMessage::request_to_trade(&local_id));
        NegotiationAction::RequestSent
    }

    /// Inbound request-to-trade from `requester`
    pub fn on_request_received(&mut self, requester: &PeerID, now: Instant) -> NegotiationAction {
        if self.directory.resolve(requester).is_none() {
            tracing::warn!("Dropping trade request from unresolved peer {}", requester);
            return NegotiationAction::Dropped;
        }

        if !self
            .received
            .insert(requester.clone(), now, self.config.request_timeout())
        {
            tracing::debug!("Duplicate trade request from {}", requester);
            return NegotiationAction::DuplicateRequest;
        }

        tracing::info!("Trade request received from {}", requester);
        self.notify(Notice::WantsToTrade {
            from: requester.clone(),
        });
        NegotiationAction::RequestReceived
    }

    /// Inbound start-trading from `other_peer`
    pub fn on_start_trading_received(
        &mut self,
        other_peer: &PeerID,
        sessions: &mut SessionController,
    ) -> NegotiationAction {
        if self.directory.resolve(other_peer).is_none() {
            tracing::warn!("Dropping start-trading from unresolved peer {}", other_peer);
            return NegotiationAction::Dropped;
        }
        self.start_trading_with(other_peer, sessions)
    }

    /// Release the readiness subscription
    pub fn shutdown(&mut self) {
        if self.readiness.take().is_some() {
            tracing::debug!("Negotiator unsubscribed from readiness signal");
        }
    }

    pub fn local_peer(&self) -> Option<&LocalPeer> {
        self.local.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.local.is_some()
    }

    pub fn has_sent_to(&self, peer: &PeerID) -> bool {
        self.sent.contains(peer)
    }

    pub fn has_received_from(&self, peer: &PeerID) -> bool {
        self.received.contains(peer)
    }

    pub fn sent(&self) -> &PendingRequests {
        &self.sent
    }

    pub fn received(&self) -> &PendingRequests {
        &self.received
    }

    pub fn has_pending(&self) -> bool {
        !self.sent.is_empty() || !self.received.is_empty()
    }

    /// Local acceptance: clear both directions for the peer, announce, and
    /// ask the session controller for a session
    fn start_trading_with(
        &mut self,
        other_peer: &PeerID,
        sessions: &mut SessionController,
    ) -> NegotiationAction {
        self.sent.remove(other_peer);
        self.received.remove(other_peer);

        let Some(local_id) = self.local.as_ref().map(|l| l.id.clone()) else {
            tracing::warn!(
                "Dropping start-trading with {}: local peer not ready",
                other_peer
            );
            return NegotiationAction::Dropped;
        };

        self.notify(Notice::TradeStarted {
            with: other_peer.clone(),
        });

        match sessions.create_session(&local_id, other_peer) {
            Ok(_) => NegotiationAction::SessionStarted(other_peer.clone()),
            Err(e) => {
                tracing::info!("Trade with {} not started: {}", other_peer, e);
                NegotiationAction::SessionRejected
            }
        }
    }

    /// Validate an interaction target. Returns `(local, target)` identities.
    fn resolve_target(&self, target: Option<PeerHandle>) -> Option<(PeerID, PeerID)> {
        let local = self.local.as_ref()?;
        let handle = target?;
        if handle == local.handle {
            return None;
        }

        let target_id = self.directory.owner_of(handle)?;
        if target_id == local.id {
            return None;
        }

        let here = self.directory.position_of(local.handle)?;
        let there = self.directory.position_of(handle)?;
        let distance = here.distance(&there);
        if distance.is_nan() || distance > self.config.max_interact_distance {
            tracing::debug!(
                "{} out of range ({:.2} > {:.2})",
                target_id,
                distance,
                self.config.max_interact_distance
            );
            return None;
        }

        Some((local.id.clone(), target_id))
    }

    fn notify(&self, notice: Notice) {
        self.notifier.show(&notice, notice.placement());
    }
}
