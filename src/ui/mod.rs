//! Terminal UI components.
//!
//! - [`render`]: Draw the text area and status bar for a [`crate::app::Model`]
//! - [`gutter_width`]: Width of the line number gutter

mod render;
mod status;

pub use render::{gutter_width, line_number_width, render};
