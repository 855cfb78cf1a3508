//! Outbound message queue

use tokio::sync::mpsc;

use crate::interfaces::MessageChannel;
use crate::types::PeerID;

use super::message::NetworkMessage;

/// A message waiting to be routed
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub to: PeerID,
    pub message: NetworkMessage,
}

/// [`MessageChannel`] that hands messages to whoever drains the receiver.
///
/// Sending never blocks, so the negotiation core can emit from synchronous
/// code; the event loop forwards to the transport.
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl OutboundQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageChannel for OutboundQueue {
    fn send(&self, to: &PeerID, message: NetworkMessage) {
        tracing::debug!("Queueing {} for {}", message.kind(), to);
        let outbound = Outbound {
            to: to.clone(),
            message,
        };
        if self.tx.send(outbound).is_err() {
            tracing::warn!("Outbound queue closed; dropping message for {}", to);
        }
    }
}

/// Take everything currently queued without waiting
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order() {
        let (queue, mut rx) = OutboundQueue::new();
        let bob = PeerID("bob".to_string());
        let me = PeerID("me".to_string());

        queue.send(&bob, NetworkMessage::request_to_trade(&me));
        queue.send(&bob, NetworkMessage::start_trading(&me));

        let drained = drain(&mut rx);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, NetworkMessage::request_to_trade(&me));
        assert_eq!(drained[1].to, bob);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (queue, rx) = OutboundQueue::new();
        drop(rx);
        // Logged and dropped, not a panic
        queue.send(
            &PeerID("bob".to_string()),
            NetworkMessage::request_to_trade(&PeerID("me".to_string())),
        );
    }
}
