//! Viewport management for scrolling.
//!
//! The [`Viewport`] tracks which rows and rendered columns of a document are
//! on screen. It is not versioned: undo and redo never move it.

use std::ops::Range;

use super::Position;

/// The visible window `(top, left, height, width)` over a document.
///
/// # Example
///
/// ```
/// use tked::view::Viewport;
///
/// let mut vp = Viewport::new(80, 24);
/// assert_eq!(vp.visible_rows(), 0..24);
///
/// vp.scroll_by(10, 100);
/// assert_eq!(vp.visible_rows(), 10..34);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    top: usize,
    left: usize,
}

impl Viewport {
    /// Create a viewport at the top-left corner. Zero sizes become 1.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            top: 0,
            left: 0,
        }
    }

    pub const fn top(&self) -> usize {
        self.top
    }

    pub const fn left(&self) -> usize {
        self.left
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Rows currently on screen (may extend past the end of the document).
    pub fn visible_rows(&self) -> Range<usize> {
        self.top..self.top + usize::from(self.height)
    }

    /// Columns currently on screen.
    pub fn visible_cols(&self) -> Range<usize> {
        self.left..self.left + usize::from(self.width)
    }

    pub const fn set_top_left(&mut self, top: usize, left: usize) {
        self.top = top;
        self.left = left;
    }

    /// Resize the viewport. Zero sizes become 1.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Scroll by `lines` (negative is up), keeping `top` within `0..=max_top`.
    pub fn scroll_by(&mut self, lines: isize, max_top: usize) {
        let top = self.top.saturating_add_signed(lines);
        self.top = top.min(max_top);
    }

    /// Shift the viewport the least amount needed to show `pos`.
    pub fn follow(&mut self, pos: Position) {
        let height = usize::from(self.height);
        let width = usize::from(self.width);

        if pos.row < self.top {
            self.top = pos.row;
        } else if pos.row >= self.top + height {
            self.top = pos.row + 1 - height;
        }

        if pos.col < self.left {
            self.left = pos.col;
        } else if pos.col >= self.left + width {
            self.left = pos.col + 1 - width;
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.visible_rows().contains(&pos.row) && self.visible_cols().contains(&pos.col)
    }

    /// Screen cell `(x, y)` relative to the viewport origin, if `pos` is visible.
    pub fn screen_position(&self, pos: Position) -> Option<(u16, u16)> {
        if !self.contains(pos) {
            return None;
        }
        let x = u16::try_from(pos.col - self.left).ok()?;
        let y = u16::try_from(pos.row - self.top).ok()?;
        Some((x, y))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24)
    }
}
