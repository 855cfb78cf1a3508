//! Trade session management

use crate::error::{Result, TradeError};
use crate::interfaces::{LayoutEditor, Notifier};
use crate::types::{InventoryHandle, PeerID};
use std::sync::Arc;
use std::time::SystemTime;

use super::types::Notice;

/// A live trade between the local peer and one remote peer.
///
/// Each side owns its own mirror of the session; nothing here is shared.
#[derive(Clone, Debug)]
pub struct TradeSession {
    local_peer_id: PeerID,
    remote_peer_id: PeerID,
    inventory: InventoryHandle,
    inventory_revision: u64,
    started_at: SystemTime,
}

impl TradeSession {
    pub fn new(local_peer_id: PeerID, remote_peer_id: PeerID) -> Self {
        let inventory = InventoryHandle::for_pair(&local_peer_id, &remote_peer_id);
        Self {
            local_peer_id,
            remote_peer_id,
            inventory,
            inventory_revision: 0,
            started_at: SystemTime::now(),
        }
    }

    /// Get local peer ID
    pub fn local_peer(&self) -> &PeerID {
        &self.local_peer_id
    }

    /// Get counterparty peer ID
    pub fn counterparty(&self) -> &PeerID {
        &self.remote_peer_id
    }

    pub fn inventory(&self) -> &InventoryHandle {
        &self.inventory
    }

    /// Number of inventory change notifications seen
    pub fn inventory_revision(&self) -> u64 {
        self.inventory_revision
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    fn inventory_changed(&mut self) {
        self.inventory_revision += 1;
        tracing::debug!(
            "Trade inventory {} changed (revision {})",
            self.inventory,
            self.inventory_revision
        );
    }
}

/// Owns the at-most-one active trade session of the local peer
pub struct SessionController {
    active: Option<TradeSession>,
    notifier: Arc<dyn Notifier>,
    layout: Arc<dyn LayoutEditor>,
}

impl SessionController {
    pub fn new(notifier: Arc<dyn Notifier>, layout: Arc<dyn LayoutEditor>) -> Self {
        Self {
            active: None,
            notifier,
            layout,
        }
    }

    /// Start a session with `remote_peer`.
    ///
    /// Fails with [`TradeError::SessionAlreadyActive`] when one exists; the
    /// existing session is left as it was.
    pub fn create_session(
        &mut self,
        local_peer: &PeerID,
        remote_peer: &PeerID,
    ) -> Result<&TradeSession> {
        if let Some(existing) = &self.active {
            tracing::info!(
                "Rejecting trade with {}: already trading with {}",
                remote_peer,
                existing.counterparty()
            );
            let notice = Notice::CannotStartNewTrade;
            self.notifier.show(&notice, notice.placement());
            return Err(TradeError::SessionAlreadyActive {
                remote: existing.counterparty().clone(),
            });
        }

        tracing::info!("Trade session started with {}", remote_peer);
        let session = TradeSession::new(local_peer.clone(), remote_peer.clone());
        Ok(&*self.active.insert(session))
    }

    /// Destroy the active session, if any
    pub fn cancel_active_session(&mut self) {
        if let Some(session) = self.active.take() {
            tracing::info!("Trade session with {} cancelled", session.counterparty());
        }
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether any trade UI is on screen: a session or the layout editor
    pub fn is_negotiation_ui_open(&self) -> bool {
        self.is_session_active() || self.layout.is_edit_mode_active()
    }

    pub fn active_session(&self) -> Option<&TradeSession> {
        self.active.as_ref()
    }

    pub fn trade_inventory_handle(&self) -> Option<&InventoryHandle> {
        self.active.as_ref().map(TradeSession::inventory)
    }

    pub fn notify_inventory_changed(&mut self) {
        if let Some(session) = self.active.as_mut() {
            session.inventory_changed();
        }
    }

    pub fn toggle_edit_mode(&self) {
        self.layout.toggle_edit_mode();
    }

    /// Tear down: destroy the session and leave edit mode
    pub fn shutdown(&mut self) {
        self.cancel_active_session();
        self.layout.disable_edit_mode();
    }
}
