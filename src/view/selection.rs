//! Grid positions and selection ranges.

use std::fmt;

/// A `(row, col)` point on the rendered grid. Orders row-major.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.col + 1)
    }
}

/// An end-exclusive range of grid positions with `start <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Build a selection from two endpoints in either order.
    pub fn new(a: Position, b: Position) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The range produced by extending from `anchor` to `cursor`.
    ///
    /// The anchor's character is always covered: when the cursor is before
    /// the anchor, the range ends one column past it.
    pub const fn spanning(anchor: Position, cursor: Position) -> Self {
        if cursor.row < anchor.row || (cursor.row == anchor.row && cursor.col < anchor.col) {
            Self {
                start: cursor,
                end: Position::new(anchor.row, anchor.col.saturating_add(1)),
            }
        } else {
            Self {
                start: anchor,
                end: cursor,
            }
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        let point = Position::new(row, col);
        self.start <= point && point < self.end
    }
}

/// Whether the cell at `row`, `col` falls inside any of `selections`.
pub fn is_selected(selections: &[Selection], row: usize, col: usize) -> bool {
    selections.iter().any(|selection| selection.contains(row, col))
}
