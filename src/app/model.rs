use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::buffer::Document;
use crate::rope::Rope;
use crate::view::{Position, View};

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// The edited document and its cursor, selections, and viewport
    pub view: View,
    /// Full terminal size (width, height), status bar included
    pub terminal_size: (u16, u16),
    /// Whether file watching is enabled
    pub watch_enabled: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Set after a quit request was refused because of unsaved changes
    pub quit_confirmed: bool,
    toast: Option<Toast>,
}

impl Model {
    pub fn new(view: View, terminal_size: (u16, u16)) -> Self {
        let mut model = Self {
            view,
            terminal_size,
            watch_enabled: false,
            should_quit: false,
            quit_confirmed: false,
            toast: None,
        };
        model.sync_viewport();
        model
    }

    pub fn is_dirty(&self) -> bool {
        self.view.document().is_dirty()
    }

    /// Size of the text area: the terminal minus the status bar and gutter.
    pub fn text_area_size(&self) -> (u16, u16) {
        let (width, height) = self.terminal_size;
        let gutter = crate::ui::gutter_width(self.view.document().row_count());
        (width.saturating_sub(gutter), height.saturating_sub(1))
    }

    /// Keep the view's viewport the size of the text area.
    pub(super) fn sync_viewport(&mut self) {
        let (width, height) = self.text_area_size();
        let viewport = self.view.viewport();
        if (viewport.width(), viewport.height()) != (width.max(1), height.max(1)) {
            self.view.resize(width, height);
        }
    }

    /// Map a terminal cell to a document grid position.
    ///
    /// Cells in the gutter map to column 0; the status bar maps to nothing.
    pub fn grid_position(&self, x: u16, y: u16) -> Option<Position> {
        let (_, height) = self.text_area_size();
        if y >= height {
            return None;
        }
        let gutter = crate::ui::gutter_width(self.view.document().row_count());
        let viewport = self.view.viewport();
        Some(Position::new(
            viewport.top() + usize::from(y),
            viewport.left() + usize::from(x.saturating_sub(gutter)),
        ))
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Reload the file from disk if it changed and there are no unsaved edits.
    ///
    /// Returns whether the document was replaced.
    pub(super) fn reload_from_disk(&mut self) -> Result<bool> {
        let Some(path) = self.view.document().filename().map(ToOwned::to_owned) else {
            return Ok(false);
        };
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes == self.view.document().contents().to_bytes() {
            tracing::debug!(path = %path.display(), "disk content unchanged");
            return Ok(false);
        }
        if self.is_dirty() {
            self.show_toast(
                ToastLevel::Warning,
                "File changed on disk; unsaved edits kept (Ctrl+S overwrites)",
            );
            return Ok(false);
        }

        let cursor = self.view.cursor();
        self.view.document_mut().reload(Rope::from(bytes));
        self.view.clear_selections();
        self.view.set_cursor(cursor.row, cursor.col);
        tracing::info!(path = %path.display(), "reloaded from disk");
        Ok(true)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(View::new(Document::default()), (80, 24))
    }
}
