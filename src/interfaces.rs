//! Collaborators the negotiation core consumes.
//!
//! The transport, world, and UI are external to the trade protocol. The core
//! only sees them through these traits, which are handed in at construction.

use crate::negotiation::{Notice, Placement};
use crate::p2p::NetworkMessage;
use crate::types::{PeerHandle, PeerID, Position};

/// Routed, fire-and-forget message delivery addressed by peer identity.
///
/// Delivery is best effort: no ordering and no acknowledgement.
pub trait MessageChannel: Send + Sync {
    fn send(&self, to: &PeerID, message: NetworkMessage);
}

/// Surface for user-visible notices. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: &Notice, placement: Placement);
}

/// Identity resolution and world queries for peers.
///
/// Every lookup may fail; callers must treat `None` as "unresolved".
pub trait PeerDirectory: Send + Sync {
    /// Map a stable identity to its in-process handle
    fn resolve(&self, id: &PeerID) -> Option<PeerHandle>;

    /// Map a handle back to the identity that owns it
    fn owner_of(&self, handle: PeerHandle) -> Option<PeerID>;

    /// Current position of the avatar behind a handle
    fn position_of(&self, handle: PeerHandle) -> Option<Position>;
}

/// Window layout edit mode owned by the UI
pub trait LayoutEditor: Send + Sync {
    fn is_edit_mode_active(&self) -> bool;
    fn toggle_edit_mode(&self);
    fn disable_edit_mode(&self);
}
