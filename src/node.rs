//! One peer's trade stack: negotiator plus session controller

use std::sync::Arc;
use std::time::Instant;

use crate::config::NegotiationConfig;
use crate::interfaces::{LayoutEditor, MessageChannel, Notifier, PeerDirectory};
use crate::negotiation::{
    NegotiationAction, Negotiator, SessionController, TradePhase, TradeSession,
};
use crate::p2p::NetworkMessage;
use crate::readiness::LocalPeerSignal;
use crate::types::{InventoryHandle, PeerHandle, PeerID};

/// External collaborators a [`TradeNode`] is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn PeerDirectory>,
    pub channel: Arc<dyn MessageChannel>,
    pub notifier: Arc<dyn Notifier>,
    pub layout: Arc<dyn LayoutEditor>,
}

/// Composition root for one local peer.
///
/// Input handlers and the network dispatcher are given this node instead of
/// reaching for process-wide managers. Everything runs on one thread: the
/// owner calls [`tick`](Self::tick) each frame and feeds inbound messages in
/// between.
pub struct TradeNode {
    negotiator: Negotiator,
    sessions: SessionController,
    shut_down: bool,
}

impl TradeNode {
    pub fn new(
        config: NegotiationConfig,
        readiness: &LocalPeerSignal,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            directory,
            channel,
            notifier,
            layout,
        } = collaborators;

        let sessions = SessionController::new(notifier.clone(), layout);
        let negotiator = Negotiator::new(config, readiness, directory, channel, notifier);

        Self {
            negotiator,
            sessions,
            shut_down: false,
        }
    }

    /// Per-frame update
    pub fn tick(&mut self, now: Instant) {
        self.negotiator.tick(now);
    }

    /// The local "interact" input on whatever is targeted
    pub fn interact(&mut self, target: Option<PeerHandle>, now: Instant) -> NegotiationAction {
        self.negotiator
            .try_initiate_or_accept(target, now, &mut self.sessions)
    }

    /// Dispatch a message the transport received from `from`
    pub fn handle_message(
        &mut self,
        from: &PeerID,
        message: &NetworkMessage,
        now: Instant,
    ) -> NegotiationAction {
        if let Some(claimed) = message.claimed_sender() {
            if claimed != from {
                tracing::warn!(
                    "Dropping {} from {} claiming to be {}",
                    message.kind(),
                    from,
                    claimed
                );
                return NegotiationAction::Dropped;
            }
        }

        match message {
            NetworkMessage::RequestToTrade { requester } => {
                self.negotiator.on_request_received(requester, now)
            }
            NetworkMessage::StartTrading { initiator } => self
                .negotiator
                .on_start_trading_received(initiator, &mut self.sessions),
            NetworkMessage::Hello { .. } | NetworkMessage::Moved { .. } => {
                NegotiationAction::Ignored
            }
        }
    }

    /// Cancel the active trade locally. The remote side is not told.
    pub fn cancel_trade(&mut self) {
        self.sessions.cancel_active_session();
    }

    pub fn toggle_edit_mode(&self) {
        self.sessions.toggle_edit_mode();
    }

    pub fn notify_inventory_changed(&mut self) {
        self.sessions.notify_inventory_changed();
    }

    pub fn trade_inventory_handle(&self) -> Option<&InventoryHandle> {
        self.sessions.trade_inventory_handle()
    }

    pub fn is_session_active(&self) -> bool {
        self.sessions.is_session_active()
    }

    pub fn is_negotiation_ui_open(&self) -> bool {
        self.sessions.is_negotiation_ui_open()
    }

    pub fn active_session(&self) -> Option<&TradeSession> {
        self.sessions.active_session()
    }

    pub fn phase(&self) -> TradePhase {
        if self.sessions.is_session_active() {
            TradePhase::SessionActive
        } else if self.negotiator.has_pending() {
            TradePhase::Negotiating
        } else {
            TradePhase::Idle
        }
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    pub fn sessions(&self) -> &SessionController {
        &self.sessions
    }

    /// Tear down. The session goes first so it never outlives the
    /// negotiator's subscriptions.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.sessions.shutdown();
        self.negotiator.shutdown();
        tracing::debug!("Trade node shut down");
    }
}

impl Drop for TradeNode {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::WindowLayout;
    use crate::notify::NoticeLog;
    use crate::p2p::OutboundQueue;
    use crate::roster::Roster;
    use crate::types::{LocalPeer, Position};

    fn node() -> (TradeNode, Arc<Roster>, LocalPeerSignal, Arc<WindowLayout>) {
        let roster = Arc::new(Roster::new());
        let me = PeerID("me".to_string());
        let handle = roster.upsert(&me, "Me", Position::default());
        roster.upsert(&PeerID("bob".to_string()), "Bob", Position::new(1.0, 0.0, 0.0));

        let signal = LocalPeerSignal::new();
        signal.publish(LocalPeer { id: me, handle });

        let layout = Arc::new(WindowLayout::new());
        let (queue, _rx) = OutboundQueue::new();
        let node = TradeNode::new(
            NegotiationConfig::default(),
            &signal,
            Collaborators {
                directory: roster.clone(),
                channel: Arc::new(queue),
                notifier: Arc::new(NoticeLog::new()),
                layout: layout.clone(),
            },
        );
        (node, roster, signal, layout)
    }

    #[test]
    fn test_spoofed_sender_dropped() {
        let (mut node, _, _, _) = node();
        let bob = PeerID("bob".to_string());
        let mallory = PeerID("mallory".to_string());

        let action = node.handle_message(
            &mallory,
            &NetworkMessage::request_to_trade(&bob),
            Instant::now(),
        );
        assert_eq!(action, NegotiationAction::Dropped);
        assert_eq!(node.phase(), TradePhase::Idle);
    }

    #[test]
    fn test_phase_transitions() {
        let (mut node, _, _, _) = node();
        let bob = PeerID("bob".to_string());
        let now = Instant::now();
        assert_eq!(node.phase(), TradePhase::Idle);

        node.handle_message(&bob, &NetworkMessage::request_to_trade(&bob), now);
        assert_eq!(node.phase(), TradePhase::Negotiating);

        node.handle_message(&bob, &NetworkMessage::start_trading(&bob), now);
        assert_eq!(node.phase(), TradePhase::SessionActive);
        assert!(node.trade_inventory_handle().is_some());

        node.cancel_trade();
        assert_eq!(node.phase(), TradePhase::Idle);
        assert!(node.trade_inventory_handle().is_none());
    }

    #[test]
    fn test_non_trade_messages_ignored() {
        let (mut node, _, _, _) = node();
        let bob = PeerID("bob".to_string());

        let action = node.handle_message(
            &bob,
            &NetworkMessage::Moved {
                position: Position::default(),
            },
            Instant::now(),
        );
        assert_eq!(action, NegotiationAction::Ignored);
    }

    #[test]
    fn test_shutdown_order_and_idempotence() {
        let (mut node, _, signal, layout) = node();
        let bob = PeerID("bob".to_string());
        node.handle_message(&bob, &NetworkMessage::start_trading(&bob), Instant::now());
        node.toggle_edit_mode();
        assert!(node.is_negotiation_ui_open());
        assert_eq!(signal.subscriber_count(), 1);

        node.shutdown();
        assert!(!node.is_session_active());
        assert!(!layout.is_edit_mode_active());
        assert_eq!(signal.subscriber_count(), 0);

        node.shutdown();
        drop(node);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
