// SPDX-License-Identifier: MIT
//
// Style — how a cell is painted, independent of what it contains.
//
// The screen core treats a style as an opaque token: it compares styles
// for equality during diffing and hands them to the backend untouched.
// Only backends decode colors and attributes into device commands.
//
// `Style::DEFAULT` is special. Cells carrying it are drawn with the
// screen's current default style, resolved when the frame is built, so
// changing the default restyles every *subsequently drawn* default cell
// without rewriting the grid.

// ─── Color ───────────────────────────────────────────────────────────────────

/// A terminal color.
///
/// Kept deliberately close to what terminals actually accept: the
/// inherited default, a palette index, or 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Inherit the terminal's own default color.
    #[default]
    Default,
    /// Palette index (0–15 are the ANSI colors, 16–255 the extended cube).
    Indexed(u8),
    /// 24-bit `TrueColor`.
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Self = Self::Indexed(0);
    pub const RED: Self = Self::Indexed(1);
    pub const GREEN: Self = Self::Indexed(2);
    pub const YELLOW: Self = Self::Indexed(3);
    pub const BLUE: Self = Self::Indexed(4);
    pub const MAGENTA: Self = Self::Indexed(5);
    pub const CYAN: Self = Self::Indexed(6);
    pub const WHITE: Self = Self::Indexed(7);

    /// Whether this is the inherited terminal default.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes as a compact bitfield.
    ///
    /// Each flag maps to one SGR parameter:
    ///
    /// ```
    /// use tess_screen::style::Attr;
    ///
    /// let a = Attr::BOLD | Attr::ITALIC;
    /// assert!(a.contains(Attr::BOLD));
    /// assert!(!a.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD          = 1 << 0;
        /// SGR 2.
        const DIM           = 1 << 1;
        /// SGR 3.
        const ITALIC        = 1 << 2;
        /// SGR 5.
        const BLINK         = 1 << 3;
        /// SGR 7 — swap foreground and background.
        const REVERSE       = 1 << 4;
        /// SGR 8.
        const HIDDEN        = 1 << 5;
        /// SGR 9.
        const STRIKETHROUGH = 1 << 6;
    }
}

// ─── Underline ───────────────────────────────────────────────────────────────

/// Underline variant. Anything but `None` means the cell is underlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum UnderlineStyle {
    #[default]
    None = 0,
    Straight = 1,
    Double = 2,
    Curly = 3,
    Dotted = 4,
    Dashed = 5,
}

impl UnderlineStyle {
    /// Whether any underline is active.
    #[inline]
    #[must_use]
    pub const fn is_underlined(self) -> bool {
        !matches!(self, Self::None)
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Foreground, background, attributes and underline of a cell.
///
/// Builder-style construction:
///
/// ```
/// use tess_screen::style::{Attr, Color, Style};
///
/// let warn = Style::DEFAULT.fg(Color::YELLOW).bold();
/// assert_eq!(warn.foreground(), Color::YELLOW);
/// assert!(warn.attributes().contains(Attr::BOLD));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    fg: Color,
    bg: Color,
    attrs: Attr,
    underline: UnderlineStyle,
}

impl Style {
    /// The placeholder style: resolved to the screen default at draw time.
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: Attr::empty(),
        underline: UnderlineStyle::None,
    };

    #[inline]
    #[must_use]
    pub const fn fg(self, fg: Color) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn bg(self, bg: Color) -> Self {
        Self { bg, ..self }
    }

    /// Replace the attribute set.
    #[inline]
    #[must_use]
    pub const fn attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn underline(self, underline: UnderlineStyle) -> Self {
        Self { underline, ..self }
    }

    /// Add [`Attr::BOLD`].
    #[inline]
    #[must_use]
    pub fn bold(self) -> Self {
        self.attrs(self.attrs | Attr::BOLD)
    }

    /// Add [`Attr::REVERSE`].
    #[inline]
    #[must_use]
    pub fn reverse(self) -> Self {
        self.attrs(self.attrs | Attr::REVERSE)
    }

    #[inline]
    #[must_use]
    pub const fn foreground(self) -> Color {
        self.fg
    }

    #[inline]
    #[must_use]
    pub const fn background(self) -> Color {
        self.bg
    }

    #[inline]
    #[must_use]
    pub const fn attributes(self) -> Attr {
        self.attrs
    }

    #[inline]
    #[must_use]
    pub const fn underline_style(self) -> UnderlineStyle {
        self.underline
    }

    /// Whether this is the [`Style::DEFAULT`] placeholder.
    #[inline]
    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    /// Resolve the placeholder against a screen default.
    #[inline]
    #[must_use]
    pub fn or(self, default: Self) -> Self {
        if self.is_default() { default } else { self }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
