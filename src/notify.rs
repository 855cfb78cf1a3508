//! Notice surfaces

use std::sync::{Arc, Mutex};

use crate::interfaces::Notifier;
use crate::negotiation::{Notice, Placement};
use crate::roster::Roster;

/// Logs notices and echoes them to the console, resolving display names
/// through the roster when one is attached
pub struct TracingNotifier {
    roster: Option<Arc<Roster>>,
    echo: bool,
}

impl TracingNotifier {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self {
            roster: Some(roster),
            echo: true,
        }
    }

    /// Log only, no console output
    pub fn quiet() -> Self {
        Self {
            roster: None,
            echo: false,
        }
    }

    fn render(&self, notice: &Notice) -> String {
        match &self.roster {
            Some(roster) => notice.render_with(|id| roster.display_name(id)),
            None => notice.to_string(),
        }
    }
}

impl Notifier for TracingNotifier {
    fn show(&self, notice: &Notice, placement: Placement) {
        let text = self.render(notice);
        tracing::info!(?placement, "{}", text);
        if self.echo {
            match placement {
                Placement::Center => println!(">> {}", text),
                Placement::TopLeft => println!("   {}", text),
            }
        }
    }
}

/// Records every notice in order
#[derive(Default)]
pub struct NoticeLog {
    entries: Mutex<Vec<(Notice, Placement)>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices and their placements, oldest first
    pub fn entries(&self) -> Vec<(Notice, Placement)> {
        self.lock().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.lock().last().map(|(n, _)| n.clone())
    }

    /// Take all recorded notices
    pub fn drain(&self) -> Vec<Notice> {
        self.lock().drain(..).map(|(n, _)| n).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Notice, Placement)>> {
        // A poisoned log still holds valid notices
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for NoticeLog {
    fn show(&self, notice: &Notice, placement: Placement) {
        tracing::debug!(?placement, "notice: {}", notice);
        self.lock().push((notice.clone(), placement));
    }
}
