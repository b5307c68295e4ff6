use std::fs;
use std::path::Path;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tempfile::tempdir;

use crate::buffer::Document;
use crate::rope::Rope;
use crate::view::{Direction, Position, Selection, View};

use super::event_loop::ResizeDebouncer;
use super::{App, Message, Model, ToastLevel, update};

fn create_test_model(text: &str) -> Model {
    let document = Document::new(None, Rope::from(text));
    Model::new(View::new(document), (80, 24))
}

fn create_long_test_model() -> Model {
    let text: String = (1..=50).map(|i| format!("line {i}\n")).collect();
    create_test_model(&text)
}

fn create_file_model(path: &Path) -> Model {
    let document = Document::open(path).unwrap();
    Model::new(View::new(document), (80, 24))
}

/// Run a message through `update` and its side effects, like the event loop.
fn dispatch(model: Model, msg: Message) -> Model {
    let mut model = update(model, msg.clone());
    App::handle_message_side_effects(&mut model, &msg);
    model
}

fn text(model: &Model) -> String {
    model.view.document().contents().to_string()
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent::new(code, modifiers)
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

// Editing

#[test]
fn test_insert_char_advances_cursor() {
    let model = create_test_model("abc");
    let model = update(model, Message::InsertChar('x'));
    assert_eq!(text(&model), "xabc");
    assert_eq!(model.view.cursor(), Position::new(0, 1));
    assert!(model.is_dirty());
}

#[test]
fn test_enter_moves_to_next_row() {
    let model = create_test_model("abcd");
    let model = update(model, Message::MoveCursor(Direction::Right));
    let model = update(model, Message::MoveCursor(Direction::Right));
    let model = update(model, Message::InsertChar('\n'));
    assert_eq!(text(&model), "ab\ncd");
    assert_eq!(model.view.cursor(), Position::new(1, 0));
}

#[test]
fn test_backspace_at_row_start_joins_rows() {
    let mut model = create_test_model("ab\ncd");
    model.view.set_cursor(1, 0);
    let model = update(model, Message::DeleteBack);
    assert_eq!(text(&model), "abcd");
    assert_eq!(model.view.cursor(), Position::new(0, 2));
}

#[test]
fn test_delete_forward_keeps_cursor() {
    let mut model = create_test_model("abc");
    model.view.set_cursor(0, 1);
    let model = update(model, Message::DeleteForward);
    assert_eq!(text(&model), "ac");
    assert_eq!(model.view.cursor(), Position::new(0, 1));
}

#[test]
fn test_typing_replaces_selection() {
    let model = create_test_model("abcdef");
    let model = update(model, Message::ExtendSelection(Direction::Right));
    let model = update(model, Message::ExtendSelection(Direction::Right));
    assert_eq!(model.view.selected_text().as_deref(), Some("ab"));

    let model = update(model, Message::InsertChar('X'));
    assert_eq!(text(&model), "Xcdef");
    assert_eq!(model.view.cursor(), Position::new(0, 1));
    assert!(model.view.selections().is_empty());
}

#[test]
fn test_paste_replaces_selection() {
    let mut model = create_test_model("hello world");
    model.view.set_cursor(0, 6);
    let model = update(model, Message::ExtendSelection(Direction::LineEnd));
    let model = update(model, Message::InsertText("there\nfriend".into()));
    assert_eq!(text(&model), "hello there\nfriend");
    assert_eq!(model.view.cursor(), Position::new(1, 6));
}

#[test]
fn test_undo_and_redo_restore_text_and_cursor() {
    let model = create_test_model("abc");
    let model = update(model, Message::InsertChar('x'));
    let model = update(model, Message::Undo);
    assert_eq!(text(&model), "abc");
    assert_eq!(model.view.cursor(), Position::new(0, 0));
    assert!(!model.is_dirty());

    let model = update(model, Message::Redo);
    assert_eq!(text(&model), "xabc");
    assert_eq!(model.view.cursor(), Position::new(0, 1));
}

#[test]
fn test_undo_with_empty_history_shows_toast() {
    let model = create_test_model("abc");
    let model = update(model, Message::Undo);
    assert_eq!(model.active_toast(), Some(("Nothing to undo", ToastLevel::Info)));

    let model = update(model, Message::Redo);
    assert_eq!(model.active_toast(), Some(("Nothing to redo", ToastLevel::Info)));
}

// Cursor and selection

#[test]
fn test_move_cursor_clears_selection() {
    let model = create_test_model("abcdef");
    let model = update(model, Message::ExtendSelection(Direction::Right));
    assert_eq!(model.view.selections().len(), 1);

    let model = update(model, Message::MoveCursor(Direction::Right));
    assert!(model.view.selections().is_empty());
    assert_eq!(model.view.anchor(), None);
    assert_eq!(model.view.cursor(), Position::new(0, 2));
}

#[test]
fn test_escape_clears_selection() {
    let model = create_test_model("abcdef");
    let model = update(model, Message::ExtendSelection(Direction::LineEnd));
    let model = update(model, Message::ClearSelection);
    assert!(model.view.selections().is_empty());
    assert_eq!(model.view.cursor(), Position::new(0, 6));
}

#[test]
fn test_click_then_drag_selects_forward() {
    let model = create_test_model("abcdef");
    let model = update(model, Message::Click(Position::new(0, 1)));
    let model = update(model, Message::Drag(Position::new(0, 4)));
    assert_eq!(model.view.selected_text().as_deref(), Some("bcd"));
    assert_eq!(model.view.cursor(), Position::new(0, 4));
}

#[test]
fn test_drag_backward_keeps_anchor_character() {
    let model = create_test_model("abcdef");
    let model = update(model, Message::Click(Position::new(0, 4)));
    let model = update(model, Message::Drag(Position::new(0, 1)));
    assert_eq!(model.view.selected_text().as_deref(), Some("bcde"));
}

#[test]
fn test_typing_after_click_moves_selection_start() {
    let model = create_test_model("");
    let model = update(model, Message::Click(Position::new(0, 0)));
    let model = update(model, Message::InsertChar('a'));
    let model = update(model, Message::InsertChar('b'));
    let model = update(model, Message::InsertChar('c'));
    let model = update(model, Message::ExtendSelection(Direction::Left));
    assert_eq!(model.view.selected_text().as_deref(), Some("c"));
}

#[test]
fn test_backspace_after_click_moves_selection_start() {
    let model = create_test_model("hello\nworld");
    let model = update(model, Message::Click(Position::new(1, 4)));
    let model = update(model, Message::DeleteBack);
    let model = update(model, Message::DeleteBack);
    assert_eq!(text(&model), "hello\nwod");

    let model = update(model, Message::ExtendSelection(Direction::Right));
    assert_eq!(
        model.view.selections(),
        vec![Selection::new(Position::new(1, 2), Position::new(1, 3))]
    );
    assert_eq!(model.view.selected_text().as_deref(), Some("d"));
}

#[test]
fn test_default_model_does_not_number_a_document() {
    // `dispatch` swaps a default model in for every message.
    let model = Model::default();
    assert_eq!(model.view.document().title(), "Untitled");
}

#[test]
fn test_click_clamps_to_row_end() {
    let model = create_test_model("ab\ncdef");
    let model = update(model, Message::Click(Position::new(0, 40)));
    assert_eq!(model.view.cursor(), Position::new(0, 2));
    assert_eq!(model.view.anchor(), Some(Position::new(0, 2)));
}

// Navigation

#[test]
fn test_scroll_does_not_move_cursor() {
    let model = create_long_test_model();
    let model = update(model, Message::ScrollDown(5));
    assert_eq!(model.view.viewport().top(), 5);
    assert_eq!(model.view.cursor(), Position::new(0, 0));

    let model = update(model, Message::ScrollUp(3));
    assert_eq!(model.view.viewport().top(), 2);
}

#[test]
fn test_scroll_up_stops_at_top() {
    let model = create_long_test_model();
    let model = update(model, Message::ScrollUp(10));
    assert_eq!(model.view.viewport().top(), 0);
}

#[test]
fn test_page_down_moves_cursor_by_text_height() {
    let model = create_long_test_model();
    let model = update(model, Message::PageDown);
    // 24 rows minus the status bar.
    assert_eq!(model.view.viewport().top(), 23);
    assert_eq!(model.view.cursor().row, 23);

    let model = update(model, Message::PageUp);
    assert_eq!(model.view.viewport().top(), 0);
    assert_eq!(model.view.cursor().row, 0);
}

#[test]
fn test_resize_updates_viewport() {
    let model = create_test_model("hello");
    let model = update(model, Message::Resize(40, 10));
    assert_eq!(model.terminal_size, (40, 10));
    assert_eq!(model.text_area_size(), (38, 9));
    assert_eq!(model.view.viewport().width(), 38);
    assert_eq!(model.view.viewport().height(), 9);
}

#[test]
fn test_gutter_growth_shrinks_viewport() {
    let model = create_test_model("");
    assert_eq!(model.view.viewport().width(), 78);
    let model = update(model, Message::InsertText("\n".repeat(10)));
    assert_eq!(model.view.viewport().width(), 77);
}

// Quit

#[test]
fn test_quit_clean_document_exits() {
    let model = create_test_model("abc");
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_dirty_document_needs_confirmation() {
    let model = create_test_model("abc");
    let model = update(model, Message::InsertChar('x'));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert!(model.quit_confirmed);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));

    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_confirmation_resets_after_other_input() {
    let model = create_test_model("abc");
    let model = update(model, Message::InsertChar('x'));
    let model = update(model, Message::Quit);
    let model = update(model, Message::MoveCursor(Direction::Left));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
}

// File side effects

#[test]
fn test_save_writes_file_and_clears_dirty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let model = create_file_model(&path);
    assert_eq!(model.view.document().title(), "notes.txt");

    let model = update(model, Message::InsertText("hi".into()));
    let model = dispatch(model, Message::Save);

    assert_eq!(fs::read_to_string(&path).unwrap(), "hi");
    assert!(!model.is_dirty());
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Info);
    assert!(message.starts_with("Saved notes.txt"), "toast was {message:?}");
}

#[test]
fn test_save_without_filename_warns() {
    let model = create_test_model("abc");
    let model = update(model, Message::InsertChar('x'));
    let model = dispatch(model, Message::Save);
    assert!(model.is_dirty());
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));
}

#[test]
fn test_save_after_quit_warning_exits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let model = create_file_model(&path);
    let model = update(model, Message::InsertChar('x'));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);

    let model = dispatch(model, Message::Save);
    assert!(model.should_quit);
    assert_eq!(fs::read_to_string(&path).unwrap(), "x");
}

#[test]
fn test_file_changed_reloads_clean_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "original text").unwrap();
    let mut model = create_file_model(&path);
    model.view.set_cursor(0, 10);

    fs::write(&path, "new").unwrap();
    let model = dispatch(model, Message::FileChanged);

    assert_eq!(text(&model), "new");
    assert!(!model.is_dirty());
    assert_eq!(model.view.cursor(), Position::new(0, 3));
    assert_eq!(model.active_toast(), Some(("Reloaded from disk", ToastLevel::Info)));

    // The reload is an edit like any other.
    let model = update(model, Message::Undo);
    assert_eq!(text(&model), "original text");
}

#[test]
fn test_file_changed_keeps_unsaved_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "original").unwrap();
    let model = create_file_model(&path);
    let model = update(model, Message::InsertChar('x'));

    fs::write(&path, "changed elsewhere").unwrap();
    let model = dispatch(model, Message::FileChanged);

    assert_eq!(text(&model), "xoriginal");
    assert!(model.is_dirty());
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));
}

#[test]
fn test_file_changed_with_identical_content_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "same").unwrap();
    let model = create_file_model(&path);
    let version = model.view.document().version();

    let model = dispatch(model, Message::FileChanged);
    assert_eq!(model.view.document().version(), version);
    assert_eq!(model.active_toast(), None);
}

#[test]
fn test_file_changed_for_deleted_file_reports_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "text").unwrap();
    let model = create_file_model(&path);
    fs::remove_file(&path).unwrap();

    let model = dispatch(model, Message::FileChanged);
    assert_eq!(text(&model), "text");
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Error));
}

// Input mapping

#[test]
fn test_ctrl_keys_map_to_commands() {
    let ctrl = KeyModifiers::CONTROL;
    assert_eq!(App::handle_key(key(KeyCode::Char('q'), ctrl)), Some(Message::Quit));
    assert_eq!(App::handle_key(key(KeyCode::Char('s'), ctrl)), Some(Message::Save));
    assert_eq!(App::handle_key(key(KeyCode::Char('z'), ctrl)), Some(Message::Undo));
    assert_eq!(App::handle_key(key(KeyCode::Char('y'), ctrl)), Some(Message::Redo));
    assert_eq!(App::handle_key(key(KeyCode::Char('k'), ctrl)), None);
}

#[test]
fn test_shift_arrows_extend_selection() {
    assert_eq!(
        App::handle_key(key(KeyCode::Right, KeyModifiers::SHIFT)),
        Some(Message::ExtendSelection(Direction::Right))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::End, KeyModifiers::SHIFT)),
        Some(Message::ExtendSelection(Direction::LineEnd))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Up, KeyModifiers::NONE)),
        Some(Message::MoveCursor(Direction::Up))
    );
}

#[test]
fn test_text_keys_insert() {
    assert_eq!(
        App::handle_key(key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
        Some(Message::InsertChar('A'))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Enter, KeyModifiers::NONE)),
        Some(Message::InsertChar('\n'))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Tab, KeyModifiers::NONE)),
        Some(Message::InsertChar('\t'))
    );
    assert_eq!(App::handle_key(key(KeyCode::Char('a'), KeyModifiers::ALT)), None);
}

#[test]
fn test_key_release_is_ignored() {
    let release =
        KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Release);
    assert_eq!(App::handle_key(release), None);
}

#[test]
fn test_mouse_click_maps_through_gutter() {
    let model = create_test_model("hello\nworld");
    let down = mouse(MouseEventKind::Down(MouseButton::Left), 4, 1);
    assert_eq!(
        App::handle_mouse(down, &model),
        Some(Message::Click(Position::new(1, 2)))
    );

    let in_gutter = mouse(MouseEventKind::Down(MouseButton::Left), 0, 0);
    assert_eq!(
        App::handle_mouse(in_gutter, &model),
        Some(Message::Click(Position::new(0, 0)))
    );

    let drag = mouse(MouseEventKind::Drag(MouseButton::Left), 6, 0);
    assert_eq!(
        App::handle_mouse(drag, &model),
        Some(Message::Drag(Position::new(0, 4)))
    );
}

#[test]
fn test_mouse_on_status_bar_is_ignored() {
    let model = create_test_model("hello");
    let down = mouse(MouseEventKind::Down(MouseButton::Left), 4, 23);
    assert_eq!(App::handle_mouse(down, &model), None);
}

#[test]
fn test_mouse_wheel_scrolls() {
    let model = create_test_model("hello");
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::ScrollDown, 0, 0), &model),
        Some(Message::ScrollDown(3))
    );
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::ScrollUp, 0, 0), &model),
        Some(Message::ScrollUp(3))
    );
}

#[test]
fn test_paste_normalizes_line_endings() {
    let model = create_test_model("");
    let mut debouncer = ResizeDebouncer::new(50);
    let msg = App::handle_event(&Event::Paste("a\r\nb\rc".into()), &model, 0, &mut debouncer);
    assert_eq!(msg, Some(Message::InsertText("a\nb\nc".into())));
}

#[test]
fn test_resize_event_is_debounced() {
    let model = create_test_model("");
    let mut debouncer = ResizeDebouncer::new(50);
    let msg = App::handle_event(&Event::Resize(100, 30), &model, 10, &mut debouncer);
    assert_eq!(msg, None);
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(40), None);
    assert_eq!(debouncer.take_ready(60), Some((100, 30)));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_resize_debouncer_keeps_latest_size() {
    let mut debouncer = ResizeDebouncer::new(50);
    debouncer.queue(100, 30, 0);
    debouncer.queue(120, 40, 30);
    assert_eq!(debouncer.take_ready(60), None);
    assert_eq!(debouncer.take_ready(80), Some((120, 40)));
}
