// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. config::ConfigFlags)
    clippy::module_name_repetitions
)]

//! # tked
//!
//! A small terminal text editor built on a persistent rope.
//!
//! The editing core is usable without a terminal:
//! - An immutable, structurally shared [`Rope`]
//! - A [`Document`](buffer::Document) with snapshot undo/redo, a typed
//!   property bag, and ordered change notification
//! - A [`View`](view::View) that maps tab-expanded `(row, col)` cells to
//!   bytes and keeps the cursor and selections
//!
//! ## Architecture
//!
//! The terminal front end uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: State transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`rope`]: Persistent byte rope
//! - [`buffer`]: Documents, history, properties, listeners
//! - [`view`]: Coordinate mapping, cursor, selection, viewport
//! - [`config`]: Settings and saved flag defaults
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: File watching

pub mod app;
pub mod buffer;
pub mod config;
pub mod error;
mod invariant;
pub mod rope;
pub mod ui;
pub mod view;
pub mod watcher;

pub use error::{Error, Result};
pub use rope::Rope;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::buffer::{Document, PropKey};
    pub use crate::rope::Rope;
    pub use crate::view::{Direction, Position, Selection, View, Viewport};
}
