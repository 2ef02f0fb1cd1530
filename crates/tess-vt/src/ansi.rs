// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; that is the `CellWriter`'s job. This
// module only knows the byte-level encoding of every terminal command the
// backend needs.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed for
// the terminal.
use std::io::{self, Write};

use tess_screen::mode::{CursorStyle, MouseFlags};
use tess_screen::style::{Attr, Color, UnderlineStyle};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` with CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Set the cursor shape (DECSCUSR). `Default` hands the shape back to the
/// terminal's own configuration.
#[inline]
pub fn cursor_style(w: &mut impl Write, style: CursorStyle) -> io::Result<()> {
    write!(w, "\x1b[{} q", style.decscusr())
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes (SGR 0). Any tracked pen state is stale after
/// this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

#[inline]
pub fn bell(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x07")
}

/// Ask the terminal window to resize to `width`×`height` cells (XTWINOPS 8).
#[inline]
pub fn resize_window(w: &mut impl Write, width: u16, height: u16) -> io::Result<()> {
    write!(w, "\x1b[8;{height};{width}t")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground color.
///
/// Standard colors use the compact 30–37 / 90–97 codes, other palette
/// entries the 256-color form, RGB the 24-bit form.
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Default => w.write_all(b"\x1b[39m"),
        Color::Indexed(idx) if idx < 8 => write!(w, "\x1b[{}m", 30 + u16::from(idx)),
        Color::Indexed(idx) if idx < 16 => write!(w, "\x1b[{}m", 82 + u16::from(idx)),
        Color::Indexed(idx) => write!(w, "\x1b[38;5;{idx}m"),
        Color::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Set the background color. Same strategy as [`fg`] with 40–47 / 100–107.
pub fn bg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Default => w.write_all(b"\x1b[49m"),
        Color::Indexed(idx) if idx < 8 => write!(w, "\x1b[{}m", 40 + u16::from(idx)),
        Color::Indexed(idx) if idx < 16 => write!(w, "\x1b[{}m", 92 + u16::from(idx)),
        Color::Indexed(idx) => write!(w, "\x1b[48;5;{idx}m"),
        Color::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit every set attribute as one CSI sequence, e.g. `\x1b[1;3m`.
/// Writes nothing for an empty set.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    const CODES: [(Attr, &[u8]); 7] = [
        (Attr::BOLD, b"1"),
        (Attr::DIM, b"2"),
        (Attr::ITALIC, b"3"),
        (Attr::BLINK, b"5"),
        (Attr::REVERSE, b"7"),
        (Attr::HIDDEN, b"8"),
        (Attr::STRIKETHROUGH, b"9"),
    ];
    if attr.is_empty() {
        return Ok(());
    }
    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in CODES {
        if attr.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            w.write_all(code)?;
            first = false;
        }
    }
    w.write_all(b"m")
}

/// Underline variant with the SGR `4:N` colon form; `None` is SGR 24.
pub fn underline(w: &mut impl Write, style: UnderlineStyle) -> io::Result<()> {
    match style {
        UnderlineStyle::None => w.write_all(b"\x1b[24m"),
        UnderlineStyle::Straight => w.write_all(b"\x1b[4:1m"),
        UnderlineStyle::Double => w.write_all(b"\x1b[4:2m"),
        UnderlineStyle::Curly => w.write_all(b"\x1b[4:3m"),
        UnderlineStyle::Dotted => w.write_all(b"\x1b[4:4m"),
        UnderlineStyle::Dashed => w.write_all(b"\x1b[4:5m"),
    }
}

// ─── Character Sets ──────────────────────────────────────────────────────────

/// Designate DEC special graphics as G0, so ASCII bytes draw line art.
#[inline]
pub fn enter_line_drawing(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b(0")
}

/// Designate US-ASCII as G0 again.
#[inline]
pub fn exit_line_drawing(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b(B")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC 2026): the terminal holds the frame
/// until [`end_sync`].
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC 1049). The original content is
/// restored on exit.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Mouse ───────────────────────────────────────────────────────────────────

/// Switch mouse reporting to exactly `flags`, in SGR (1006) encoding.
///
/// Levels are cumulative on the terminal side: drag implies buttons and
/// motion implies drag, so the highest requested level wins. Empty flags
/// turn reporting off.
pub fn mouse(w: &mut impl Write, flags: MouseFlags) -> io::Result<()> {
    disable_mouse(w)?;
    if flags.is_empty() {
        return Ok(());
    }
    w.write_all(b"\x1b[?1000h")?;
    if flags.intersects(MouseFlags::DRAG_EVENTS | MouseFlags::MOTION_EVENTS) {
        w.write_all(b"\x1b[?1002h")?;
    }
    if flags.contains(MouseFlags::MOTION_EVENTS) {
        w.write_all(b"\x1b[?1003h")?;
    }
    w.write_all(b"\x1b[?1006h")
}

/// Turn off every mouse tracking mode.
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l")
}

// ─── Bracketed Paste ────────────────────────────────────────────────────────

/// Bracketed paste (DEC 2004): pasted text arrives between `\x1b[200~`
/// and `\x1b[201~`.
#[inline]
pub fn bracketed_paste(w: &mut impl Write, on: bool) -> io::Result<()> {
    w.write_all(if on { b"\x1b[?2004h" } else { b"\x1b[?2004l" })
}

// ─── Focus Reporting ────────────────────────────────────────────────────────

/// Focus reporting (DEC 1004): `\x1b[I` on gain, `\x1b[O` on loss.
#[inline]
pub fn focus_reporting(w: &mut impl Write, on: bool) -> io::Result<()> {
    w.write_all(if on { b"\x1b[?1004h" } else { b"\x1b[?1004l" })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_positions_are_one_based() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 10, 20)), "\x1b[21;11H");
    }

    #[test]
    fn cursor_to_does_not_overflow() {
        assert_eq!(
            emit(|w| cursor_to(w, u16::MAX, u16::MAX)),
            "\x1b[65536;65536H"
        );
    }

    #[test]
    fn cursor_styles() {
        assert_eq!(emit(|w| cursor_style(w, CursorStyle::Default)), "\x1b[0 q");
        assert_eq!(emit(|w| cursor_style(w, CursorStyle::SteadyBar)), "\x1b[6 q");
    }

    #[test]
    fn colors_pick_compact_forms() {
        assert_eq!(emit(|w| fg(w, Color::Default)), "\x1b[39m");
        assert_eq!(emit(|w| fg(w, Color::RED)), "\x1b[31m");
        assert_eq!(emit(|w| fg(w, Color::Indexed(9))), "\x1b[91m");
        assert_eq!(emit(|w| fg(w, Color::Indexed(42))), "\x1b[38;5;42m");
        assert_eq!(emit(|w| fg(w, Color::Rgb(255, 128, 0))), "\x1b[38;2;255;128;0m");
        assert_eq!(emit(|w| bg(w, Color::Default)), "\x1b[49m");
        assert_eq!(emit(|w| bg(w, Color::GREEN)), "\x1b[42m");
        assert_eq!(emit(|w| bg(w, Color::Indexed(15))), "\x1b[107m");
        assert_eq!(emit(|w| bg(w, Color::Rgb(0, 100, 200))), "\x1b[48;2;0;100;200m");
    }

    #[test]
    fn attrs_join_with_semicolons() {
        assert_eq!(emit(|w| attrs(w, Attr::empty())), "");
        assert_eq!(emit(|w| attrs(w, Attr::BOLD)), "\x1b[1m");
        assert_eq!(
            emit(|w| attrs(w, Attr::BOLD | Attr::ITALIC | Attr::STRIKETHROUGH)),
            "\x1b[1;3;9m"
        );
        assert_eq!(emit(|w| attrs(w, Attr::all())), "\x1b[1;2;3;5;7;8;9m");
    }

    #[test]
    fn underline_variants() {
        assert_eq!(emit(|w| underline(w, UnderlineStyle::None)), "\x1b[24m");
        assert_eq!(emit(|w| underline(w, UnderlineStyle::Curly)), "\x1b[4:3m");
    }

    #[test]
    fn mouse_levels() {
        let off = "\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l";
        assert_eq!(emit(|w| mouse(w, MouseFlags::empty())), off);
        assert_eq!(
            emit(|w| mouse(w, MouseFlags::BUTTON_EVENTS)),
            format!("{off}\x1b[?1000h\x1b[?1006h")
        );
        assert_eq!(
            emit(|w| mouse(w, MouseFlags::DRAG_EVENTS)),
            format!("{off}\x1b[?1000h\x1b[?1002h\x1b[?1006h")
        );
        assert_eq!(
            emit(|w| mouse(w, MouseFlags::all())),
            format!("{off}\x1b[?1000h\x1b[?1002h\x1b[?1003h\x1b[?1006h")
        );
    }

    #[test]
    fn toggles() {
        assert_eq!(emit(|w| bracketed_paste(w, true)), "\x1b[?2004h");
        assert_eq!(emit(|w| bracketed_paste(w, false)), "\x1b[?2004l");
        assert_eq!(emit(|w| focus_reporting(w, true)), "\x1b[?1004h");
        assert_eq!(emit(|w| enter_alt_screen(w)), "\x1b[?1049h");
        assert_eq!(emit(|w| begin_sync(w)), "\x1b[?2026h");
    }

    #[test]
    fn misc_sequences() {
        assert_eq!(emit(|w| bell(w)), "\x07");
        assert_eq!(emit(|w| resize_window(w, 80, 24)), "\x1b[8;24;80t");
        assert_eq!(emit(|w| enter_line_drawing(w)), "\x1b(0");
        assert_eq!(emit(|w| exit_line_drawing(w)), "\x1b(B");
    }
}
