use crate::app::{Model, ToastLevel};
use crate::view::{Direction, Position};

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a character at the cursor, replacing any selection
    InsertChar(char),
    /// Insert pasted text at the cursor, replacing any selection
    InsertText(String),
    /// Delete the selection or the character before the cursor (Backspace)
    DeleteBack,
    /// Delete the selection or the character at the cursor (Delete)
    DeleteForward,
    /// Undo the last edit
    Undo,
    /// Redo the last undone edit
    Redo,

    // Cursor and selection
    /// Move the cursor, dropping any selection
    MoveCursor(Direction),
    /// Move the cursor and extend the selection (Shift+arrow)
    ExtendSelection(Direction),
    /// Clear the selection
    ClearSelection,
    /// Place the cursor at a grid position (mouse down)
    Click(Position),
    /// Extend the selection to a grid position (mouse drag)
    Drag(Position),

    // Navigation
    /// Scroll up by n rows without moving the cursor
    ScrollUp(usize),
    /// Scroll down by n rows without moving the cursor
    ScrollDown(usize),
    /// Move up one page
    PageUp,
    /// Move down one page
    PageDown,

    // File
    /// Save the document to its file
    Save,
    /// File changed externally, reload if clean
    FileChanged,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Apply `msg` to `model`.
///
/// [`Message::Save`] and [`Message::FileChanged`] touch the filesystem and are
/// carried out by the event loop after this returns.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Save keeps a pending quit confirmation so Ctrl+S then Ctrl+Q exits.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }

    match msg {
        // Editing
        Message::InsertChar(ch) => {
            model.view.delete_selection();
            model.view.insert_character(ch);
        }
        Message::InsertText(text) => {
            model.view.delete_selection();
            model.view.insert_text(&text);
        }
        Message::DeleteBack => model.view.delete_character(false),
        Message::DeleteForward => model.view.delete_character(true),
        Message::Undo => {
            if !model.view.undo() {
                model.show_toast(ToastLevel::Info, "Nothing to undo");
            }
        }
        Message::Redo => {
            if !model.view.redo() {
                model.show_toast(ToastLevel::Info, "Nothing to redo");
            }
        }

        // Cursor and selection
        Message::MoveCursor(direction) => {
            model.view.clear_selections();
            model.view.move_cursor(direction);
        }
        Message::ExtendSelection(direction) => {
            let target = model.view.step(direction);
            model.view.extend_selection(target.row, target.col);
        }
        Message::ClearSelection => model.view.clear_selections(),
        Message::Click(pos) => {
            model.view.clear_selections();
            model.view.set_cursor(pos.row, pos.col);
            let cursor = model.view.cursor();
            model.view.set_anchor(cursor);
        }
        Message::Drag(pos) => model.view.extend_selection(pos.row, pos.col),

        // Navigation
        Message::ScrollUp(n) => model.view.scroll_by(-isize::try_from(n).unwrap_or(isize::MAX)),
        Message::ScrollDown(n) => model.view.scroll_by(isize::try_from(n).unwrap_or(isize::MAX)),
        Message::PageUp => model.view.page(false),
        Message::PageDown => model.view.page(true),

        // Save/FileChanged: handled in event loop (side effect)
        Message::Save | Message::FileChanged => {}

        // Window
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
        }

        // Application
        Message::Quit => {
            if model.is_dirty() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }

    model.sync_viewport();
    model
}
