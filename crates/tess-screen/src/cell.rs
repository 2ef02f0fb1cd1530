// SPDX-License-Identifier: MIT
//
// Cell — one addressable grid position.
//
// A cell holds a primary character, any combining marks stacked on it, a
// style, and its display width. Width is derived from the primary
// character only: combining marks never widen a cell.
//
// Wide characters (CJK, most emoji) report width 2 and visually cover
// the next column as well. That next column is a continuation position:
// it is still stored in the grid, but the renderer never draws it while
// the wide character to its left is in place. Placing a narrow character
// into a continuation column is undefined behavior at the API level (the
// display may or may not show it) — never a panic.

use unicode_width::UnicodeWidthChar;

use crate::style::Style;

/// Display width of a primary character, in columns (1 or 2).
///
/// Control and zero-width characters count as one column: they are drawn
/// as a blank so alignment never depends on them.
///
/// ```
/// use tess_screen::cell::char_width;
///
/// assert_eq!(char_width('a'), 1);
/// assert_eq!(char_width('世'), 2);
/// assert_eq!(char_width('\u{7}'), 1);
/// ```
#[inline]
#[must_use]
pub fn char_width(ch: char) -> u8 {
    match ch.width() {
        Some(2) => 2,
        _ => 1,
    }
}

/// Whether `ch` can be drawn as-is as a primary character.
///
/// NUL, C0/C1 controls and zero-width characters cannot: the renderer
/// substitutes a space for them.
#[inline]
#[must_use]
pub fn is_printable(ch: char) -> bool {
    matches!(ch.width(), Some(w) if w > 0)
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    ch: char,
    combining: Vec<char>,
    style: Style,
    width: u8,
}

impl Cell {
    /// A blank cell: space, no combining marks, default style.
    pub const BLANK: Self = Self {
        ch: ' ',
        combining: Vec::new(),
        style: Style::DEFAULT,
        width: 1,
    };

    /// Create a cell. Width is computed from `ch`.
    #[must_use]
    pub fn new(ch: char, combining: &[char], style: Style) -> Self {
        Self {
            ch,
            combining: combining.to_vec(),
            style,
            width: char_width(ch),
        }
    }

    /// Overwrite this cell in place, reusing the combining allocation.
    pub fn set(&mut self, ch: char, combining: &[char], style: Style) {
        self.ch = ch;
        self.combining.clear();
        self.combining.extend_from_slice(combining);
        self.style = style;
        self.width = char_width(ch);
    }

    #[inline]
    #[must_use]
    pub const fn primary(&self) -> char {
        self.ch
    }

    #[inline]
    #[must_use]
    pub fn combining(&self) -> &[char] {
        &self.combining
    }

    #[inline]
    #[must_use]
    pub const fn style(&self) -> Style {
        self.style
    }

    /// Display width in columns: 1 or 2.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// The full text of the cell: primary followed by combining marks.
    #[must_use]
    pub fn text(&self) -> String {
        let mut s = String::with_capacity(4 + self.combining.len() * 4);
        s.push(self.ch);
        s.extend(self.combining.iter());
        s
    }

    /// Borrowed view for callers of `get_content`.
    #[inline]
    #[must_use]
    pub fn content(&self) -> Content<'_> {
        Content {
            primary: self.ch,
            combining: &self.combining,
            style: self.style,
            width: self.width,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// Logical content of a grid position, as returned by `get_content`.
///
/// Out-of-range reads yield [`Content::EMPTY`]: NUL primary, no combining
/// marks, default style, width 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Content<'a> {
    pub primary: char,
    pub combining: &'a [char],
    pub style: Style,
    pub width: u8,
}

impl Content<'_> {
    /// The value reported for coordinates outside the grid.
    pub const EMPTY: Content<'static> = Content {
        primary: '\0',
        combining: &[],
        style: Style::DEFAULT,
        width: 0,
    };
}

// ─── Tests ───────────────────────────────────────────────────────────────────
