// SPDX-License-Identifier: MIT
//
// CellBuffer — the two grids behind a screen.
//
//   back  — what the application wants displayed. Every write lands here.
//   front — what was last sent to the backend. Only the renderer writes it.
//
// The diff pass compares the two and sends the difference; afterwards the
// front grid is authoritative for the next pass. When the front grid can
// no longer be trusted to mirror the physical display (first frame,
// resize, resume from suspend, explicit sync) it is marked invalid and the
// next pass repaints everything.

use unicode_segmentation::UnicodeSegmentation;

use crate::cell::{Content, char_width};
use crate::grid::Grid;
use crate::style::Style;

/// Back and front grids plus the validity of the front grid.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    back: Grid,
    front: Grid,
    front_valid: bool,
}

impl CellBuffer {
    /// A blank buffer. The front grid starts invalid: nothing has been
    /// drawn yet.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            back: Grid::new(width, height),
            front: Grid::new(width, height),
            front_valid: false,
        }
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        self.back.size()
    }

    #[inline]
    #[must_use]
    pub const fn back(&self) -> &Grid {
        &self.back
    }

    #[inline]
    #[must_use]
    pub const fn front(&self) -> &Grid {
        &self.front
    }

    /// Mutable access to the front grid, for the renderer.
    #[inline]
    pub(crate) const fn front_mut(&mut self) -> &mut Grid {
        &mut self.front
    }

    /// Split borrow used by the diff pass.
    #[inline]
    pub(crate) const fn grids_mut(&mut self) -> (&Grid, &mut Grid) {
        (&self.back, &mut self.front)
    }

    /// Whether the front grid mirrors the display.
    #[inline]
    #[must_use]
    pub const fn is_front_valid(&self) -> bool {
        self.front_valid
    }

    /// Forget what the display shows; the next pass repaints everything.
    #[inline]
    pub const fn invalidate(&mut self) {
        self.front_valid = false;
    }

    #[inline]
    pub(crate) const fn mark_front_valid(&mut self) {
        self.front_valid = true;
    }

    // ─── Application-facing operations ───────────────────────────────────

    /// Write one position of the back grid. Out-of-range is a no-op.
    pub fn set_content(&mut self, x: i32, y: i32, primary: char, combining: &[char], style: Style) {
        if let Some(cell) = self.back.get_mut(x, y) {
            cell.set(primary, combining, style);
        }
    }

    /// Logical (pre-render) content of a back-grid position.
    ///
    /// In range, a NUL or control primary reads back as a space so callers
    /// always see something drawable; out of range yields
    /// [`Content::EMPTY`]. Styles are returned as stored: a cell cleared
    /// to the default style reports the `Style::DEFAULT` placeholder.
    #[must_use]
    pub fn get_content(&self, x: i32, y: i32) -> Content<'_> {
        match self.back.get(x, y) {
            Some(cell) => {
                let mut content = cell.content();
                if content.primary < ' ' {
                    content.primary = ' ';
                }
                content
            }
            None => Content::EMPTY,
        }
    }

    /// Overwrite every back-grid cell with `ch` in `style`.
    pub fn fill(&mut self, ch: char, style: Style) {
        self.back.fill(ch, style);
    }

    /// Reset the back grid to spaces in `style`.
    pub fn clear(&mut self, style: Style) {
        self.fill(' ', style);
    }

    /// Lay out `text` starting at `(x, y)`, one grapheme cluster per cell.
    ///
    /// The first scalar of a cluster is the primary character, the rest are
    /// combining marks. Wide clusters advance two columns. Writing stops at
    /// the right edge; returns the number of columns consumed.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: Style) -> u16 {
        let (width, _) = self.size();
        let mut col = x;
        for grapheme in text.graphemes(true) {
            if col >= i32::from(width) {
                break;
            }
            let mut chars = grapheme.chars();
            let Some(primary) = chars.next() else {
                continue;
            };
            let combining: Vec<char> = chars.collect();
            self.set_content(col, y, primary, &combining, style);
            col += i32::from(char_width(primary));
        }
        u16::try_from((col - x).max(0)).unwrap_or(u16::MAX)
    }

    /// Resize both grids. The back grid keeps its overlapping content;
    /// the front grid is invalidated so the next pass repaints.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == self.size() {
            return;
        }
        self.back.resize(width, height);
        self.front = Grid::new(width, height);
        self.front_valid = false;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn new_buffer_has_invalid_front() {
        let b = CellBuffer::new(10, 4);
        assert_eq!(b.size(), (10, 4));
        assert!(!b.is_front_valid());
    }

    #[test]
    fn set_content_writes_back_only() {
        let mut b = CellBuffer::new(10, 4);
        b.set_content(3, 1, 'Z', &[], Style::DEFAULT);
        assert_eq!(b.back().get(3, 1).unwrap().primary(), 'Z');
        assert_eq!(b.front().get(3, 1).unwrap().primary(), ' ');
    }

    #[test]
    fn out_of_range_write_leaves_grid_unchanged() {
        let mut b = CellBuffer::new(80, 24);
        let before = b.back().clone();
        b.set_content(-1, 0, 'A', &[], Style::DEFAULT.bold());
        b.set_content(80, 0, 'A', &[], Style::DEFAULT);
        b.set_content(0, 24, 'A', &[], Style::DEFAULT);
        assert_eq!(b.back(), &before);
    }

    #[test]
    fn out_of_range_read_is_empty() {
        let b = CellBuffer::new(80, 24);
        assert_eq!(b.get_content(-1, 0), Content::EMPTY);
        assert_eq!(b.get_content(0, 99), Content::EMPTY);
    }

    #[test]
    fn get_content_reports_width() {
        let mut b = CellBuffer::new(10, 1);
        b.set_content(0, 0, '世', &[], Style::DEFAULT);
        b.set_content(2, 0, 'e', &['\u{301}'], Style::DEFAULT);
        assert_eq!(b.get_content(0, 0).width, 2);
        let accented = b.get_content(2, 0);
        assert_eq!(accented.width, 1);
        assert_eq!(accented.combining, &['\u{301}']);
    }

    #[test]
    fn nul_primary_reads_as_space() {
        let mut b = CellBuffer::new(4, 1);
        b.set_content(1, 0, '\0', &[], Style::DEFAULT);
        assert_eq!(b.get_content(1, 0).primary, ' ');
        assert_eq!(b.get_content(1, 0).width, 1);
    }

    #[test]
    fn clear_resets_to_spaces_in_style() {
        let mut b = CellBuffer::new(3, 2);
        b.fill('x', Style::DEFAULT.fg(Color::RED));
        b.clear(Style::DEFAULT);
        for y in 0..2 {
            for x in 0..3 {
                let c = b.get_content(x, y);
                assert_eq!(c.primary, ' ');
                assert_eq!(c.style, Style::DEFAULT);
                assert!(c.combining.is_empty());
            }
        }
    }

    #[test]
    fn put_str_handles_graphemes_and_wide_chars() {
        let mut b = CellBuffer::new(10, 1);
        let used = b.put_str(0, 0, "a世e\u{301}", Style::DEFAULT);
        assert_eq!(used, 4);
        assert_eq!(b.get_content(0, 0).primary, 'a');
        assert_eq!(b.get_content(1, 0).primary, '世');
        assert_eq!(b.get_content(3, 0).primary, 'e');
        assert_eq!(b.get_content(3, 0).combining, &['\u{301}']);
    }

    #[test]
    fn put_str_stops_at_edge() {
        let mut b = CellBuffer::new(3, 1);
        assert_eq!(b.put_str(1, 0, "hello", Style::DEFAULT), 2);
        assert_eq!(b.get_content(2, 0).primary, 'e');
    }

    #[test]
    fn resize_invalidates_front_and_keeps_back() {
        let mut b = CellBuffer::new(4, 4);
        b.set_content(1, 1, 'k', &[], Style::DEFAULT);
        b.mark_front_valid();
        b.resize(2, 2);
        assert!(!b.is_front_valid());
        assert_eq!(b.size(), (2, 2));
        assert_eq!(b.get_content(1, 1).primary, 'k');
        assert_eq!(b.front().size(), (2, 2));
    }
}
