//! Window layout edit mode

use std::sync::atomic::{AtomicBool, Ordering};

use crate::interfaces::LayoutEditor;

/// Tracks whether the trade window is being repositioned
#[derive(Debug, Default)]
pub struct WindowLayout {
    edit_mode: AtomicBool,
}

impl WindowLayout {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutEditor for WindowLayout {
    fn is_edit_mode_active(&self) -> bool {
        self.edit_mode.load(Ordering::Relaxed)
    }

    fn toggle_edit_mode(&self) {
        let was = self.edit_mode.fetch_xor(true, Ordering::Relaxed);
        tracing::debug!("Edit mode {}", if was { "off" } else { "on" });
    }

    fn disable_edit_mode(&self) {
        self.edit_mode.store(false, Ordering::Relaxed);
    }
}
