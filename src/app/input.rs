use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Message, Model};
use crate::view::Direction;

use super::event_loop::ResizeDebouncer;

/// Rows scrolled per mouse wheel step.
const WHEEL_STEP: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) => Some(Message::InsertText(normalize_newlines(text))),
            Event::Resize(width, height) => {
                tracing::trace!(width, height, "resize queued");
                resize_debouncer.queue(*width, *height, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if ctrl {
            return match key.code {
                KeyCode::Char('q') => Some(Message::Quit),
                KeyCode::Char('s') => Some(Message::Save),
                KeyCode::Char('z') => Some(Message::Undo),
                KeyCode::Char('y') => Some(Message::Redo),
                _ => None,
            };
        }

        let direction = match key.code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            KeyCode::Home => Some(Direction::LineStart),
            KeyCode::End => Some(Direction::LineEnd),
            _ => None,
        };
        if let Some(direction) = direction {
            return Some(if shift {
                Message::ExtendSelection(direction)
            } else {
                Message::MoveCursor(direction)
            });
        }

        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Message::InsertChar(ch))
            }
            KeyCode::Enter => Some(Message::InsertChar('\n')),
            KeyCode::Tab => Some(Message::InsertChar('\t')),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Esc => Some(Message::ClearSelection),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => model
                .grid_position(mouse.column, mouse.row)
                .map(Message::Click),
            MouseEventKind::Drag(MouseButton::Left) => model
                .grid_position(mouse.column, mouse.row)
                .map(Message::Drag),
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_STEP)),
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_STEP)),
            _ => None,
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
