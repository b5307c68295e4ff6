//! Tab-aware row layout.
//!
//! A row is laid out by scanning forward from its first byte until a newline
//! or the end of the text. Every source character produces one or more
//! rendered columns: tabs advance to the next multiple of the tab width, wide
//! characters take their display width, zero-width characters join the
//! character before them, everything else takes one column.

use unicode_width::UnicodeWidthChar;

use crate::rope::Rope;

/// One rendered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Byte offset of the source character in the document.
    pub offset: usize,
    pub ch: char,
    /// Byte length of the source character.
    pub len: usize,
    /// Whether this is the first column the character renders into.
    pub is_char_start: bool,
}

/// Rendered columns of a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    start: usize,
    end: usize,
    columns: Vec<Column>,
}

impl RowLayout {
    /// Byte offset of the row's first character.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the row's last character (its newline, if any).
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Rendered width of the row.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Option<&Column> {
        self.columns.get(col)
    }

    /// Byte offset that an insertion at `col` lands on.
    ///
    /// Columns past the last one resolve to the end of the row.
    pub fn offset_at(&self, col: usize) -> usize {
        self.columns.get(col).map_or(self.end, |column| column.offset)
    }

    /// First rendered column of the character covering `col`.
    pub fn char_start_column(&self, col: usize) -> usize {
        let col = col.min(self.columns.len());
        match self.columns.get(col) {
            Some(column) if !column.is_char_start => self.columns[..col]
                .iter()
                .rposition(|column| column.is_char_start)
                .unwrap_or(0),
            _ => col,
        }
    }

    /// Column where the character starting at `offset` is drawn, or the row
    /// length when no character in the row starts there.
    pub fn column_for_offset(&self, offset: usize) -> usize {
        self.columns
            .iter()
            .position(|column| column.is_char_start && column.offset == offset)
            .unwrap_or(self.columns.len())
    }

    /// First column of the character following the one at `col`.
    pub fn next_char_column(&self, col: usize) -> usize {
        self.columns
            .iter()
            .enumerate()
            .skip(col + 1)
            .find(|(_, column)| column.is_char_start)
            .map_or(self.columns.len(), |(idx, _)| idx)
    }
}

/// Lay out the row starting at byte `start` of `rope`.
pub fn layout_row(rope: &Rope, start: usize, tab_width: usize) -> RowLayout {
    let tab_width = tab_width.max(1);
    let (_, tail) = rope.split(start);
    let bytes: Vec<u8> = tail.bytes().take_while(|&b| b != b'\n').collect();

    let mut columns = Vec::with_capacity(bytes.len());
    let mut offset = start;
    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            push_char(&mut columns, offset, ch, ch.len_utf8(), tab_width);
            offset += ch.len_utf8();
        }
        for _ in chunk.invalid() {
            push_char(&mut columns, offset, char::REPLACEMENT_CHARACTER, 1, tab_width);
            offset += 1;
        }
    }

    RowLayout {
        start,
        end: offset,
        columns,
    }
}

fn push_char(columns: &mut Vec<Column>, offset: usize, ch: char, len: usize, tab_width: usize) {
    let width = if ch == '\t' {
        tab_width - columns.len() % tab_width
    } else {
        ch.width().unwrap_or(1)
    };

    // Zero-width characters (combining marks) join the previous character.
    if width == 0 {
        if let Some(base) = columns.last().map(|column| column.offset) {
            for column in columns.iter_mut().rev().take_while(|column| column.offset == base) {
                column.len += len;
            }
            return;
        }
    }

    let width = width.max(1);
    for i in 0..width {
        columns.push(Column {
            offset,
            ch,
            len,
            is_char_start: i == 0,
        });
    }
}
