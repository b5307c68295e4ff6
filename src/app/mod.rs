//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::config::Settings;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: Option<PathBuf>,
    settings: Settings,
    watch_enabled: bool,
}

impl App {
    /// Create an application editing `file_path`, or an untitled buffer.
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            settings: Settings::default(),
            watch_enabled: false,
        }
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Use `settings` for new views.
    #[must_use]
    pub const fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests;
