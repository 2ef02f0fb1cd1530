// SPDX-License-Identifier: MIT
//
// Grid — a width×height array of cells.
//
// Flat `Vec<Cell>` with row-major indexing, so a row is a contiguous
// slice and the renderer's left-to-right scan is linear in memory. Whole
// rows compare with one slice equality, which lets the diff pass skip
// unchanged rows without visiting their cells.
//
// Coordinates are signed at this layer. Callers routinely compute
// positions that fall off the left or top edge; those reads return
// `None` and those writes are dropped rather than wrapping or panicking.

use crate::cell::Cell;
use crate::style::Style;

/// A rectangular array of [`Cell`]s.
///
/// ```
/// use tess_screen::grid::Grid;
///
/// let mut g = Grid::new(80, 24);
/// assert_eq!(g.size(), (80, 24));
/// assert!(g.get(-1, 0).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid of blank cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; size],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Whether the signed position `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    // Callers check `contains` first, so both values are non-negative and
    // bounded by u16 dimensions.
    #[allow(clippy::cast_sign_loss)]
    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * usize::from(self.width) + x as usize
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.contains(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.contains(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// One row as a slice, or `None` past the bottom.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = usize::from(y) * usize::from(self.width);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Write a cell. Out-of-range positions are ignored; returns whether
    /// the write landed.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        self.get_mut(x, y).map(|slot| *slot = cell).is_some()
    }

    /// Overwrite every cell with `ch` in `style`.
    pub fn fill(&mut self, ch: char, style: Style) {
        for cell in &mut self.cells {
            cell.set(ch, &[], style);
        }
    }

    /// Copy another grid of the same size into this one without
    /// reallocating. Grids of different sizes are cloned instead.
    pub fn copy_from(&mut self, other: &Self) {
        if self.size() == other.size() {
            self.cells.clone_from_slice(&other.cells);
        } else {
            self.clone_from(other);
        }
    }

    /// Copy a single row from `other` (which must share this width).
    pub fn copy_row_from(&mut self, other: &Self, y: u16) {
        if self.width != other.width || y >= self.height || y >= other.height {
            return;
        }
        let start = usize::from(y) * usize::from(self.width);
        let end = start + usize::from(self.width);
        self.cells[start..end].clone_from_slice(&other.cells[start..end]);
    }

    /// Change dimensions, keeping the region both sizes share.
    ///
    /// Cells that fall outside the new bounds are discarded; newly
    /// exposed cells are blank.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == self.size() {
            return;
        }
        let mut next = Self::new(width, height);
        let keep_w = usize::from(width.min(self.width));
        for y in 0..height.min(self.height) {
            let src = usize::from(y) * usize::from(self.width);
            let dst = usize::from(y) * usize::from(width);
            next.cells[dst..dst + keep_w].clone_from_slice(&self.cells[src..src + keep_w]);
        }
        *self = next;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
