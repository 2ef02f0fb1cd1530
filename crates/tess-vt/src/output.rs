// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell writing.
//
//   OutputBuffer — accumulates all bytes of a frame in memory so the frame
//   goes out in a single write() syscall.
//
//   CellWriter — remembers the terminal's pen (cursor position, colors,
//   attributes, underline) and emits only the escapes that change it. Two
//   adjacent cells in the same style cost nothing but their text.
//
// Colors are reduced to what the terminal can show before they are
// compared, so a 256-color terminal never sees a 24-bit sequence and a
// monochrome one never sees a color at all.

use std::io::{self, Write};

use tess_screen::style::{Attr, Color, Style, UnderlineStyle};

use crate::ansi;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Byte buffer flushed once per frame.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Discard contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to `w` in one call and clear the buffer.
    ///
    /// # Errors
    ///
    /// Write failures on `w`.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Color reduction ─────────────────────────────────────────────────────────

/// Reduce `color` to something a terminal with `colors` colors can show.
#[must_use]
pub fn reduce_color(color: Color, colors: u32) -> Color {
    match color {
        Color::Default => Color::Default,
        _ if colors == 0 => Color::Default,
        Color::Rgb(..) if colors >= 1 << 24 => color,
        Color::Rgb(r, g, b) if colors >= 256 => Color::Indexed(rgb_to_ansi256(r, g, b)),
        Color::Rgb(r, g, b) => Color::Indexed(rgb_to_basic(r, g, b)),
        Color::Indexed(idx) if u32::from(idx) < colors => color,
        Color::Indexed(idx) if idx < 16 => Color::Indexed(idx % 8),
        Color::Indexed(idx) => {
            let (r, g, b) = ansi256_to_rgb(idx);
            Color::Indexed(rgb_to_basic(r, g, b))
        }
    }
}

/// Nearest entry of the xterm 6×6×6 cube or grayscale ramp.
#[must_use]
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const STEPS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let level = |v: u8| -> u8 {
        let mut best = 0u8;
        let mut dist = u16::MAX;
        for (i, step) in (0u8..).zip(STEPS) {
            let d = u16::from(v.abs_diff(step));
            if d < dist {
                dist = d;
                best = i;
            }
        }
        best
    };
    if r == g && g == b {
        // Grayscale ramp 232..=255 covers 8..=238 in steps of 10.
        if r < 4 {
            return 16;
        }
        if r > 246 {
            return 231;
        }
        return 232 + r.saturating_sub(8).min(230) / 10;
    }
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// One of the 8 basic colors: one bit per bright channel.
#[must_use]
pub const fn rgb_to_basic(r: u8, g: u8, b: u8) -> u8 {
    (r > 127) as u8 | (((g > 127) as u8) << 1) | (((b > 127) as u8) << 2)
}

fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
    const STEPS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    match idx {
        16..=231 => {
            let i = idx - 16;
            (
                STEPS[usize::from(i / 36)],
                STEPS[usize::from((i / 6) % 6)],
                STEPS[usize::from(i % 6)],
            )
        }
        232..=255 => {
            let v = 8 + (idx - 232) * 10;
            (v, v, v)
        }
        _ => (0, 0, 0),
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful cell writer that skips redundant escapes.
///
/// - **Cursor**: skipped when the cell starts where the last one ended.
/// - **Attributes**: on change, reset (SGR 0) and re-emit; this forgets the
///   tracked colors and underline, so they are re-emitted too.
/// - **Colors / underline**: skipped when unchanged.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    colors: u32,
    next_x: i32,
    last_y: i32,
    last_fg: Option<Color>,
    last_bg: Option<Color>,
    last_attrs: Attr,
    last_underline: UnderlineStyle,
}

impl CellWriter {
    /// A writer for a terminal with `colors` colors.
    #[must_use]
    pub const fn new(colors: u32) -> Self {
        Self {
            colors,
            next_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::empty(),
            last_underline: UnderlineStyle::None,
        }
    }

    /// Forget the pen. Call after anything that moves the cursor or resets
    /// attributes behind the writer's back.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new(self.colors);
    }

    /// Write `text` at `(x, y)` covering `width` columns.
    pub fn put(&mut self, out: &mut OutputBuffer, x: u16, y: u16, style: Style, text: &str, width: u8) {
        self.move_to(out, x, y);
        self.apply_style(out, style);
        out.push_str(text);
        self.advance(x, y, width);
    }

    /// Write one byte from the DEC special graphics set at `(x, y)`.
    pub fn put_line_drawing(&mut self, out: &mut OutputBuffer, x: u16, y: u16, style: Style, byte: u8) {
        self.move_to(out, x, y);
        self.apply_style(out, style);
        ansi::enter_line_drawing(out).ok();
        out.buf.push(byte);
        ansi::exit_line_drawing(out).ok();
        self.advance(x, y, 1);
    }

    fn move_to(&self, out: &mut OutputBuffer, x: u16, y: u16) {
        if i32::from(y) != self.last_y || i32::from(x) != self.next_x {
            ansi::cursor_to(out, x, y).ok();
        }
    }

    fn advance(&mut self, x: u16, y: u16, width: u8) {
        self.next_x = i32::from(x) + i32::from(width.max(1));
        self.last_y = i32::from(y);
    }

    fn apply_style(&mut self, out: &mut OutputBuffer, style: Style) {
        let attrs = style.attributes();
        if attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                ansi::reset(out).ok();
                self.last_fg = None;
                self.last_bg = None;
                self.last_underline = UnderlineStyle::None;
            }
            self.last_attrs = attrs;
            ansi::attrs(out, attrs).ok();
        }

        let underline = style.underline_style();
        if underline != self.last_underline {
            ansi::underline(out, underline).ok();
            self.last_underline = underline;
        }

        let fg = reduce_color(style.foreground(), self.colors);
        if self.last_fg != Some(fg) {
            ansi::fg(out, fg).ok();
            self.last_fg = Some(fg);
        }

        let bg = reduce_color(style.background(), self.colors);
        if self.last_bg != Some(bg) {
            ansi::bg(out, bg).ok();
            self.last_bg = Some(bg);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
