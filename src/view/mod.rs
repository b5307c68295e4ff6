//! Cursor, selection, and coordinate mapping over a [`Document`].
//!
//! A [`View`] addresses text by `(row, col)` on the rendered grid, where
//! columns are tab-expanded and wide characters take several of them. The
//! cursor and selection list are stored as document properties so undo and
//! redo put them back with the text. The selection anchor and the viewport
//! are view state and are never versioned.

mod layout;
mod selection;
mod viewport;

pub use layout::{Column, RowLayout, layout_row};
pub use selection::{Position, Selection, is_selected};
pub use viewport::Viewport;

use std::path::Path;
use std::sync::LazyLock;

use crate::buffer::{Document, PropKey};
use crate::config::DEFAULT_TAB_WIDTH;
use crate::error::Result;

static CURSOR: LazyLock<PropKey<Position>> = LazyLock::new(PropKey::register);
static SELECTIONS: LazyLock<PropKey<Vec<Selection>>> = LazyLock::new(PropKey::register);

/// Cursor movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
}

/// An editable window onto one document.
#[derive(Debug)]
pub struct View {
    document: Document,
    viewport: Viewport,
    tab_width: usize,
    anchor: Option<Position>,
}

impl View {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            viewport: Viewport::default(),
            tab_width: DEFAULT_TAB_WIDTH,
            anchor: None,
        }
    }

    /// Set the tab width. Zero is ignored.
    #[must_use]
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.set_tab_width(tab_width);
        self
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Direct access for collaborators that register listeners or reload.
    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Set the tab width. Zero is ignored.
    pub const fn set_tab_width(&mut self, tab_width: usize) {
        if tab_width > 0 {
            self.tab_width = tab_width;
        }
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport.resize(width, height);
        self.viewport.follow(self.cursor());
    }

    pub const fn set_top_left(&mut self, top: usize, left: usize) {
        self.viewport.set_top_left(top, left);
    }

    /// Scroll without moving the cursor.
    pub fn scroll_by(&mut self, lines: isize) {
        let max_top = self.document.row_count().saturating_sub(1);
        self.viewport.scroll_by(lines, max_top);
    }

    /// Scroll a page and carry the cursor with it.
    pub fn page(&mut self, down: bool) {
        let height = usize::from(self.viewport.height());
        let lines = isize::try_from(height).unwrap_or(isize::MAX);
        let cursor = self.cursor();
        if down {
            self.scroll_by(lines);
            self.set_cursor(cursor.row.saturating_add(height), cursor.col);
        } else {
            self.scroll_by(-lines);
            self.set_cursor(cursor.row.saturating_sub(height), cursor.col);
        }
    }

    /// Column layout of `row` (clamped to the last row).
    pub fn layout(&self, row: usize) -> RowLayout {
        let (start, _) = self.document.index_for_row(row);
        layout_row(self.document.contents(), start, self.tab_width)
    }

    /// Layouts of `row` and the rows after it, in order, until the last row.
    ///
    /// Only `row` is looked up; later rows are found by walking forward.
    pub fn layouts_from(&self, row: usize) -> impl Iterator<Item = RowLayout> + '_ {
        let (start, reached) = self.document.index_for_row(row);
        let rope = self.document.contents();
        let first = (reached == row).then(|| layout_row(rope, start, self.tab_width));
        std::iter::successors(first, move |prev| {
            (prev.end() < rope.len()).then(|| layout_row(rope, prev.end() + 1, self.tab_width))
        })
    }

    pub fn cursor(&self) -> Position {
        self.document.property(*CURSOR).copied().unwrap_or_default()
    }

    /// Move the cursor, clamping to existing rows and the row's width, and
    /// scroll so it stays visible.
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        let (_, row) = self.document.index_for_row(row);
        let col = col.min(self.layout(row).len());
        let cursor = Position::new(row, col);
        self.document.set_property(*CURSOR, cursor);
        self.viewport.follow(cursor);
    }

    /// Cursor position on screen, if it is inside the viewport.
    pub fn cursor_screen_position(&self) -> Option<(u16, u16)> {
        self.viewport.screen_position(self.cursor())
    }

    /// Where the cursor would land after one step in `direction`.
    pub fn step(&self, direction: Direction) -> Position {
        let cursor = self.cursor();
        let layout = self.layout(cursor.row);
        match direction {
            Direction::Left if cursor.col > 0 => {
                Position::new(cursor.row, layout.char_start_column(cursor.col - 1))
            }
            Direction::Left if cursor.row > 0 => {
                Position::new(cursor.row - 1, self.layout(cursor.row - 1).len())
            }
            Direction::Right if cursor.col < layout.len() => {
                Position::new(cursor.row, layout.next_char_column(cursor.col))
            }
            Direction::Right if cursor.row + 1 < self.document.row_count() => {
                Position::new(cursor.row + 1, 0)
            }
            Direction::Up => Position::new(cursor.row.saturating_sub(1), cursor.col),
            Direction::Down => Position::new(cursor.row + 1, cursor.col),
            Direction::LineStart => Position::new(cursor.row, 0),
            Direction::LineEnd => Position::new(cursor.row, layout.len()),
            Direction::Left | Direction::Right => cursor,
        }
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        let target = self.step(direction);
        self.set_cursor(target.row, target.col);
    }

    /// Insert one character at the cursor and advance past it.
    pub fn insert_character(&mut self, ch: char) {
        let mut buf = [0; 4];
        self.insert_text(ch.encode_utf8(&mut buf));
    }

    /// Insert `text` at the cursor as one edit and place the cursor after it.
    ///
    /// The selection anchor is dropped.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.anchor = None;
        let cursor = self.cursor();
        let offset = self.layout(cursor.row).offset_at(cursor.col);
        self.document.insert(offset, text);

        let row = cursor.row + text.bytes().filter(|&b| b == b'\n').count();
        let col = self.layout(row).column_for_offset(offset + text.len());
        self.set_cursor(row, col);
    }

    /// Delete at the cursor.
    ///
    /// A non-empty selection is deleted instead, whatever `forward` says.
    /// Otherwise `forward` removes the character under the cursor and
    /// backward removes the one before it, joining lines at column 0.
    /// Either way the selection anchor is dropped.
    pub fn delete_character(&mut self, forward: bool) {
        if self.delete_selection() {
            return;
        }
        self.anchor = None;

        let cursor = self.cursor();
        let layout = self.layout(cursor.row);

        if let Some(column) = layout.column(cursor.col).filter(|c| !c.is_char_start) {
            let (start, end) = (column.offset, column.offset + column.len);
            let col = layout.char_start_column(cursor.col);
            self.document.delete(start, end);
            self.set_cursor(cursor.row, col);
            return;
        }

        if forward {
            let start = layout.offset_at(cursor.col);
            let end = layout.column(cursor.col).map_or(start + 1, |c| start + c.len);
            self.document.delete(start, end);
            self.set_cursor(cursor.row, cursor.col);
        } else if cursor.col == 0 {
            if cursor.row == 0 {
                return;
            }
            // The joined position comes from the previous row as it is now.
            let col = self.layout(cursor.row - 1).len();
            self.document.delete(layout.start() - 1, layout.start());
            self.set_cursor(cursor.row - 1, col);
        } else {
            let col = layout.char_start_column(cursor.col - 1);
            let Some(column) = layout.column(col).copied() else {
                return;
            };
            self.document.delete(column.offset, column.offset + column.len);
            self.set_cursor(cursor.row, col);
        }
    }

    /// Delete the first non-empty selection and collapse the cursor to its
    /// start. Returns `false` if nothing was selected.
    pub fn delete_selection(&mut self) -> bool {
        let Some(selection) = self.selections().into_iter().find(|s| !s.is_empty()) else {
            return false;
        };
        let start = self.start_offset(selection.start);
        let end = self.end_offset(selection.end);
        self.document.delete(start, end);
        self.document.set_property(*SELECTIONS, Vec::new());
        self.anchor = None;
        self.set_cursor(selection.start.row, selection.start.col);
        true
    }

    /// Text covered by the first non-empty selection.
    pub fn selected_text(&self) -> Option<String> {
        let selection = self.selections().into_iter().find(|s| !s.is_empty())?;
        let start = self.start_offset(selection.start);
        let end = self.end_offset(selection.end);
        let (_, tail) = self.document.contents().split(start);
        let (middle, _) = tail.split(end.saturating_sub(start));
        Some(middle.to_string())
    }

    /// Current selections (a copy).
    pub fn selections(&self) -> Vec<Selection> {
        self.document.property(*SELECTIONS).cloned().unwrap_or_default()
    }

    /// Replace the selection list. Endpoints are stored in document order.
    pub fn set_selections(&mut self, selections: &[Selection]) {
        let ordered = selections
            .iter()
            .map(|s| Selection::new(s.start, s.end))
            .collect();
        self.document.set_property(*SELECTIONS, ordered);
    }

    /// Drop all selections and the anchor.
    pub fn clear_selections(&mut self) {
        if !self.selections().is_empty() {
            self.document.set_property(*SELECTIONS, Vec::new());
        }
        self.anchor = None;
    }

    pub const fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    pub const fn set_anchor(&mut self, anchor: Position) {
        self.anchor = Some(anchor);
    }

    pub const fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    /// Move the cursor to `row`, `col` and select from the anchor to it.
    ///
    /// Without an anchor, the cursor's current position becomes the anchor.
    pub fn extend_selection(&mut self, row: usize, col: usize) {
        let anchor = self.anchor.unwrap_or_else(|| self.cursor());
        self.anchor = Some(anchor);
        self.set_cursor(row, col);
        let selection = Selection::spanning(anchor, self.cursor());
        self.document.set_property(*SELECTIONS, vec![selection]);
    }

    /// Undo the last edit, restoring its cursor and selections.
    pub fn undo(&mut self) -> bool {
        let moved = self.document.undo();
        if moved {
            self.anchor = None;
            self.viewport.follow(self.cursor());
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.document.redo();
        if moved {
            self.anchor = None;
            self.viewport.follow(self.cursor());
        }
        moved
    }

    /// Save the document. See [`Document::save`].
    ///
    /// # Errors
    /// Propagates the document's save error.
    pub fn save(&mut self, path: Option<&Path>) -> Result<u64> {
        self.document.save(path)
    }

    fn start_offset(&self, pos: Position) -> usize {
        self.layout(pos.row).offset_at(pos.col)
    }

    /// Byte offset just past the last cell an end-exclusive `pos` covers.
    ///
    /// Columns past the row's width reach over its newline.
    fn end_offset(&self, pos: Position) -> usize {
        let layout = self.layout(pos.row);
        match layout.column(pos.col) {
            Some(column) if column.is_char_start => column.offset,
            Some(column) => column.offset + column.len,
            None if pos.col == layout.len() => layout.end(),
            None => (layout.end() + 1).min(self.document.len()),
        }
    }
}
