//! peertrade
//!
//! Negotiation and session lifecycle for mutually exclusive pairwise trades
//! between peers over a best-effort routed message substrate:
//! - request / accept / expire bookkeeping ([`negotiation::Negotiator`])
//! - the at-most-one active session rule ([`negotiation::SessionController`])
//! - a TCP transport and console node for trying it out ([`cli::TradeApp`])

pub mod cli;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod layout;
pub mod negotiation;
pub mod node;
pub mod notify;
pub mod p2p;
pub mod readiness;
pub mod roster;
pub mod sim;
pub mod types;

// Re-export commonly used types
pub use config::{NegotiationConfig, NodeConfig};
pub use error::{Result, TradeError};
pub use negotiation::{NegotiationAction, Notice, Placement, TradePhase};
pub use node::{Collaborators, TradeNode};
pub use types::{InventoryHandle, LocalPeer, PeerHandle, PeerID, Position};
