//! Negotiation types and state machine

use crate::types::PeerID;
use std::fmt;

/// Which way a pending request points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// We asked them
    Sent,
    /// They asked us
    Received,
}

/// Where a notice is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Large message in the middle of the screen
    Center,
    /// Small log line in the corner
    TopLeft,
}

/// User-visible notices raised by the negotiation core
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A trade request was sent to a peer
    RequestSent { to: PeerID },
    /// A request to this peer is still pending
    RequestRecentlySent { to: PeerID },
    /// A peer asked us to trade
    WantsToTrade { from: PeerID },
    /// A trade session started with a peer
    TradeStarted { with: PeerID },
    /// A session already exists so a new one cannot start
    CannotStartNewTrade,
}

impl Notice {
    /// Default placement for this notice
    pub fn placement(&self) -> Placement {
        match self {
            Notice::RequestSent { .. } | Notice::RequestRecentlySent { .. } => Placement::TopLeft,
            Notice::WantsToTrade { .. }
            | Notice::TradeStarted { .. }
            | Notice::CannotStartNewTrade => Placement::Center,
        }
    }

    /// Peer the notice is about, if any
    pub fn peer(&self) -> Option<&PeerID> {
        match self {
            Notice::RequestSent { to } | Notice::RequestRecentlySent { to } => Some(to),
            Notice::WantsToTrade { from } => Some(from),
            Notice::TradeStarted { with } => Some(with),
            Notice::CannotStartNewTrade => None,
        }
    }

    /// Render with a caller-supplied name lookup
    pub fn render_with(&self, name_of: impl Fn(&PeerID) -> String) -> String {
        match self {
            Notice::RequestSent { to } => format!("Trade request sent to {}", name_of(to)),
            Notice::RequestRecentlySent { to } => {
                format!("You recently sent a trade request to {}", name_of(to))
            }
            Notice::WantsToTrade { from } => format!("{} wants to trade", name_of(from)),
            Notice::TradeStarted { with } => format!("Started trade with {}", name_of(with)),
            Notice::CannotStartNewTrade => "Can't start a new trade right now".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(|id| id.short().to_string()))
    }
}

/// What a negotiation operation did.
///
/// Every operation completes; failures surface here and through notices,
/// never as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationAction {
    /// Input had no valid target (none, self, out of range, or not ready)
    Ignored,
    /// A fresh request-to-trade went out
    RequestSent,
    /// A request to this peer is already pending
    AlreadyRequested,
    /// An inbound request was recorded
    RequestReceived,
    /// An inbound request duplicated one already pending
    DuplicateRequest,
    /// A session started with this peer
    SessionStarted(PeerID),
    /// Negotiation concluded but a session was already active
    SessionRejected,
    /// An inbound message was discarded
    Dropped,
}

/// Coarse lifecycle of one local peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradePhase {
    /// No pending requests, no session
    Idle,
    /// Pending requests, no session
    Negotiating,
    /// A session exists (requests with other peers may still be pending)
    SessionActive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_text() {
        let bob = PeerID("bob".to_string());

        assert_eq!(
            Notice::WantsToTrade { from: bob.clone() }.to_string(),
            "bob wants to trade"
        );
        assert_eq!(
            Notice::TradeStarted { with: bob.clone() }.render_with(|_| "Bob".to_string()),
            "Started trade with Bob"
        );
        assert_eq!(
            Notice::CannotStartNewTrade.to_string(),
            "Can't start a new trade right now"
        );
    }

    #[test]
    fn test_notice_placement() {
        let bob = PeerID("bob".to_string());
        assert_eq!(
            Notice::RequestSent { to: bob.clone() }.placement(),
            Placement::TopLeft
        );
        assert_eq!(Notice::WantsToTrade { from: bob }.placement(), Placement::Center);
        assert_eq!(Notice::CannotStartNewTrade.peer(), None);
    }
}
