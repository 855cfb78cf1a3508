//! P2P message types for peertrade

use crate::error::Result;
use crate::types::{PeerID, Position};
use serde::{Deserialize, Serialize};

/// Network message envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkMessage {
    /// First frame on every connection, in both directions
    Hello {
        peer: PeerID,
        name: String,
        position: Position,
    },
    /// Sender's avatar moved
    Moved { position: Position },
    /// Ask the receiver to trade
    RequestToTrade { requester: PeerID },
    /// Negotiation concluded; the receiver should enter the session
    StartTrading { initiator: PeerID },
}

impl NetworkMessage {
    pub fn request_to_trade(requester: &PeerID) -> Self {
        NetworkMessage::RequestToTrade {
            requester: requester.clone(),
        }
    }

    pub fn start_trading(initiator: &PeerID) -> Self {
        NetworkMessage::StartTrading {
            initiator: initiator.clone(),
        }
    }

    /// Identity the payload claims to come from
    pub fn claimed_sender(&self) -> Option<&PeerID> {
        match self {
            NetworkMessage::Hello { peer, .. } => Some(peer),
            NetworkMessage::RequestToTrade { requester } => Some(requester),
            NetworkMessage::StartTrading { initiator } => Some(initiator),
            NetworkMessage::Moved { .. } => None,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkMessage::Hello { .. } => "hello",
            NetworkMessage::Moved { .. } => "moved",
            NetworkMessage::RequestToTrade { .. } => "request-to-trade",
            NetworkMessage::StartTrading { .. } => "start-trading",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
