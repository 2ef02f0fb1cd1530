// SPDX-License-Identifier: MIT
//
// Differential renderer — turns the back/front grid difference into a
// frame of cell writes for the backend.
//
// The pass, per row:
//
//   1. If the front grid is valid and the row equals its front row, the
//      whole row is skipped with a single slice comparison.
//   2. Otherwise each column is compared. Changed cells become writes;
//      unchanged cells are skipped.
//   3. The row is copied back→front, so after the pass the front grid
//      mirrors what the backend was told to draw.
//
// Wide characters cover two columns. The column to the right of a wide
// character is never drawn while the wide character is in place. When a
// wide character appears or disappears at column x, column x+1 is redrawn
// too, so no half-glyph is left on the display. A wide character in the
// last column cannot fit and is drawn as a single space.
//
// Glyph resolution, for a rune the display cannot show directly:
//
//   native → alternate character set → registered substitute → "?"
//
// A frame produced against an invalid front grid is marked `full`: the
// backend clears the display before applying it.

use unicode_width::UnicodeWidthStr;

use crate::buffer::CellBuffer;
use crate::cell::{Cell, is_printable};
use crate::fallback::FallbackRegistry;
use crate::style::Style;

/// What a display can draw.
pub trait Displayable {
    /// The display's character set contains `ch`.
    fn can_encode(&self, ch: char) -> bool;

    /// The display can draw `ch` through an alternate character set
    /// (e.g. the VT100 line-drawing set).
    fn has_alternate(&self, _ch: char) -> bool {
        false
    }
}

// ─── Frame ───────────────────────────────────────────────────────────────────

/// How a cell is to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glyph {
    /// Draw this text from the display's normal character set.
    Text(String),
    /// Draw this rune through the alternate character set.
    Alternate(char),
}

impl Glyph {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Alternate(_) => None,
        }
    }
}

/// One cell to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub x: u16,
    pub y: u16,
    pub glyph: Glyph,
    /// Style to draw with; the placeholder style is already replaced by
    /// the screen's default.
    pub style: Style,
    /// Columns covered: 1 or 2.
    pub width: u8,
}

/// Cursor instruction for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPlacement {
    Hidden,
    At(u16, u16),
}

/// Everything the backend must do to bring the display up to date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Clear the display before applying writes.
    pub full: bool,
    pub width: u16,
    pub height: u16,
    /// Writes in row-major order.
    pub writes: Vec<CellWrite>,
    /// `None` when the cursor needs no change.
    pub cursor: Option<CursorPlacement>,
}

impl Frame {
    /// Nothing to send.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.full && self.writes.is_empty() && self.cursor.is_none()
    }
}

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from a render pass, for profiling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells emitted as writes.
    pub cells_rendered: usize,
    /// Cells left alone (unchanged, or covered by a wide character).
    pub cells_skipped: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Stateful diff pass over a [`CellBuffer`].
#[derive(Debug, Default)]
pub struct Renderer {
    last_cursor: Option<CursorPlacement>,
    last_stats: RenderStats,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats from the most recent pass.
    #[inline]
    #[must_use]
    pub const fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Produce the frame for the current back/front difference and update
    /// the front grid to match.
    ///
    /// `cursor` is the desired cursor position; positions outside the grid
    /// hide it.
    pub fn render(
        &mut self,
        buf: &mut CellBuffer,
        registry: &FallbackRegistry,
        display: &dyn Displayable,
        default_style: Style,
        cursor: Option<(u16, u16)>,
    ) -> Frame {
        let (width, height) = buf.size();
        let full = !buf.is_front_valid();
        let mut frame = Frame {
            full,
            width,
            height,
            ..Frame::default()
        };
        let mut stats = RenderStats::default();

        {
            let (back, front) = buf.grids_mut();
            for y in 0..height {
                let (Some(back_row), Some(front_row)) = (back.row(y), front.row(y)) else {
                    continue;
                };
                if !full && back_row == front_row {
                    stats.cells_skipped += usize::from(width);
                    continue;
                }
                diff_row(
                    y,
                    back_row,
                    front_row,
                    full,
                    &Resolver {
                        registry,
                        display,
                        default_style,
                    },
                    &mut frame.writes,
                    &mut stats,
                );
                front.copy_row_from(back, y);
            }
        }
        buf.mark_front_valid();

        let placement = match cursor {
            Some((x, y)) if x < width && y < height => CursorPlacement::At(x, y),
            _ => CursorPlacement::Hidden,
        };
        if full || self.last_cursor != Some(placement) {
            frame.cursor = Some(placement);
            self.last_cursor = Some(placement);
        }

        log::trace!(
            "render: full={} rendered={} skipped={}",
            full,
            stats.cells_rendered,
            stats.cells_skipped
        );
        self.last_stats = stats;
        frame
    }

    /// Forget the last cursor instruction so the next pass re-sends it.
    pub fn invalidate_cursor(&mut self) {
        self.last_cursor = None;
    }
}

struct Resolver<'a> {
    registry: &'a FallbackRegistry,
    display: &'a dyn Displayable,
    default_style: Style,
}

impl Resolver<'_> {
    fn write(&self, x: u16, y: u16, cell: &Cell, last_column: bool) -> CellWrite {
        let style = cell.style().or(self.default_style);
        if cell.is_wide() && last_column {
            return CellWrite {
                x,
                y,
                glyph: Glyph::Text(" ".to_string()),
                style,
                width: 1,
            };
        }
        CellWrite {
            x,
            y,
            glyph: self.glyph(cell),
            style,
            width: cell.width(),
        }
    }

    fn glyph(&self, cell: &Cell) -> Glyph {
        let ch = cell.primary();
        if !is_printable(ch) {
            return Glyph::Text(pad(String::from(" "), cell.width()));
        }
        if self.display.can_encode(ch) {
            let mut text = String::with_capacity(4);
            text.push(ch);
            text.extend(
                cell.combining()
                    .iter()
                    .filter(|c| self.display.can_encode(**c)),
            );
            return Glyph::Text(text);
        }
        if self.display.has_alternate(ch) {
            return Glyph::Alternate(ch);
        }
        let subst = self.registry.lookup(ch).unwrap_or("?");
        Glyph::Text(pad(subst.to_string(), cell.width()))
    }
}

/// Pad `text` with spaces up to `width` columns.
fn pad(mut text: String, width: u8) -> String {
    let have = text.width();
    for _ in have..usize::from(width) {
        text.push(' ');
    }
    text
}

fn diff_row(
    y: u16,
    back: &[Cell],
    front: &[Cell],
    full: bool,
    resolver: &Resolver<'_>,
    out: &mut Vec<CellWrite>,
    stats: &mut RenderStats,
) {
    let width = back.len();
    let shown = glyph_starts(front);
    let mut x = 0;
    while x < width {
        let cell = &back[x];
        // A column the old frame covered with a wide glyph must be redrawn
        // even when its stored cell is unchanged.
        if full || !shown[x] || cell != &front[x] {
            let last_column = x + 1 == width;
            #[allow(clippy::cast_possible_truncation)]
            out.push(resolver.write(x as u16, y, cell, last_column));
            stats.cells_rendered += 1;
        } else {
            stats.cells_skipped += 1;
        }

        if cell.is_wide() && x + 1 < width {
            // The continuation column is covered by the wide glyph.
            stats.cells_skipped += 1;
            x += 2;
        } else {
            x += 1;
        }
    }
}

/// Columns of `row` where a drawn glyph begins. The column after a wide
/// glyph is covered; a wide glyph in the last column covers nothing.
fn glyph_starts(row: &[Cell]) -> Vec<bool> {
    let mut starts = vec![false; row.len()];
    let mut x = 0;
    while x < row.len() {
        starts[x] = true;
        x += if row[x].is_wide() && x + 1 < row.len() { 2 } else { 1 };
    }
    starts
}

// ─── Tests ───────────────────────────────────────────────────────────────────
