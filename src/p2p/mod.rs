//! P2P networking module for peertrade

pub mod channel;
pub mod message;
pub mod network_manager;

pub use channel::{Outbound, OutboundQueue};
pub use message::NetworkMessage;
pub use network_manager::{NetworkEvent, NetworkManager};
