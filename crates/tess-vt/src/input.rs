// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into the screen's event vocabulary: keys, mouse
// actions, paste markers and focus changes. Handles every protocol the
// backend can switch on:
//
// - Legacy CSI sequences (arrows, function keys, editing keys)
// - SS3 sequences (F1-F4 and arrows in application mode)
// - SGR mouse protocol (press / release / drag / move / scroll)
// - Kitty keyboard protocol (unambiguous codepoints + modifiers)
// - Bracketed paste (start / end markers around ordinary keys)
// - Focus reporting (terminal gained / lost focus)
// - Alt+key (ESC followed by printable character)
// - UTF-8 multi-byte characters
//
// Escape sequences can span several `read()` calls, so the parser keeps
// a small byte buffer. A lone ESC stays buffered until the caller decides
// no more bytes are coming and calls [`Parser::flush`].

use tess_screen::event::{
    EventKind, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

// ─── Input ──────────────────────────────────────────────────────────────────

/// One decoded input. Converted into an [`EventKind`] when posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    Mouse(MouseEvent),
    PasteStart,
    PasteEnd,
    Focus(bool),
}

impl From<Input> for EventKind {
    fn from(input: Input) -> Self {
        match input {
            Input::Key(k) => Self::Key(k),
            Input::Mouse(m) => Self::Mouse(m),
            Input::PasteStart => Self::PasteStart,
            Input::PasteEnd => Self::PasteEnd,
            Input::Focus(gained) => Self::Focus { gained },
        }
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Bracketed paste opening delimiter: `ESC [ 200 ~`
const PASTE_START: &[u8] = b"\x1b[200~";
/// Bracketed paste closing delimiter: `ESC [ 201 ~`
const PASTE_END: &[u8] = b"\x1b[201~";

/// Incremental byte-to-input decoder.
///
/// Pasted text is reported as ordinary key presses between
/// [`Input::PasteStart`] and [`Input::PasteEnd`]. Inside a paste, only the
/// closing delimiter is treated as a sequence; an ESC byte is a key.
#[derive(Debug)]
pub struct Parser {
    buf: Vec<u8>,
    in_paste: bool,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
        }
    }

    /// Whether a paste is open.
    #[inline]
    #[must_use]
    pub const fn in_paste(&self) -> bool {
        self.in_paste
    }

    /// Feed raw bytes and return every input that can be decoded so far.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Input> {
        self.buf.extend_from_slice(data);
        let mut inputs = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            let remaining = &self.buf[pos..];

            if self.in_paste {
                if remaining.starts_with(PASTE_END) {
                    inputs.push(Input::PasteEnd);
                    pos += PASTE_END.len();
                    self.in_paste = false;
                    continue;
                }
                if remaining.len() < PASTE_END.len() && PASTE_END.starts_with(remaining) {
                    break;
                }
                match parse_paste_byte(remaining) {
                    Parsed::Input(input, n) => {
                        inputs.push(input);
                        pos += n;
                    }
                    Parsed::Incomplete => break,
                    Parsed::Skip(n) => pos += n,
                }
                continue;
            }

            if remaining.starts_with(PASTE_START) {
                inputs.push(Input::PasteStart);
                pos += PASTE_START.len();
                self.in_paste = true;
                continue;
            }
            // `ESC [ 2` could still become a paste start.
            if remaining.len() < PASTE_START.len()
                && remaining.starts_with(b"\x1b[")
                && PASTE_START.starts_with(remaining)
            {
                break;
            }

            match try_parse(remaining) {
                Parsed::Input(input, n) => {
                    inputs.push(input);
                    pos += n;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        inputs
    }

    /// Are there unconsumed bytes that might complete with more data?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Give up waiting: emit buffered bytes as literal keys. A lone ESC
    /// becomes an Escape press.
    pub fn flush(&mut self) -> Vec<Input> {
        let mut inputs = Vec::new();
        for &byte in &self.buf {
            let (code, modifiers) = match byte {
                0x1B => (KeyCode::Escape, Modifiers::empty()),
                0x00 => (KeyCode::Char('@'), Modifiers::CTRL),
                b @ 0x01..=0x1A => (KeyCode::Char((b + b'a' - 1) as char), Modifiers::CTRL),
                0x7F => (KeyCode::Backspace, Modifiers::empty()),
                b @ 0x20..=0x7E => (KeyCode::Char(b as char), Modifiers::empty()),
                _ => continue,
            };
            inputs.push(key_with(code, modifiers));
        }
        self.buf.clear();
        inputs
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────

enum Parsed {
    Input(Input, usize),
    Incomplete,
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        0x00 => Parsed::Input(key_with(KeyCode::Char('@'), Modifiers::CTRL), 1),
        b @ (0x01..=0x07 | 0x0B..=0x0C | 0x0E..=0x1A) => Parsed::Input(
            key_with(KeyCode::Char((b + b'a' - 1) as char), Modifiers::CTRL),
            1,
        ),
        0x08 | 0x7F => Parsed::Input(press(KeyCode::Backspace), 1),
        0x09 => Parsed::Input(press(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Input(press(KeyCode::Enter), 1),
        b @ 0x20..=0x7E => Parsed::Input(press(KeyCode::Char(b as char)), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

/// Inside a paste every byte is literal text; newlines arrive as Enter.
fn parse_paste_byte(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => Parsed::Input(press(KeyCode::Escape), 1),
        _ => try_parse(buf),
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        0x1B => Parsed::Input(key_with(KeyCode::Escape, Modifiers::ALT), 2),
        b @ 0x20..=0x7E => Parsed::Input(key_with(KeyCode::Char(b as char), Modifiers::ALT), 2),
        b @ 0x01..=0x1A => Parsed::Input(
            key_with(
                KeyCode::Char((b + b'a' - 1) as char),
                Modifiers::ALT | Modifiers::CTRL,
            ),
            2,
        ),
        _ => Parsed::Input(press(KeyCode::Escape), 1),
    }
}

// ── CSI ─────────────────────────────────────────────────────────────────────

fn parse_csi(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    match buf[2] {
        b'<' => return parse_sgr_mouse(buf),
        b'I' => return Parsed::Input(Input::Focus(true), 3),
        b'O' => return Parsed::Input(Input::Focus(false), 3),
        _ => {}
    }

    // Parameter bytes 0x30..=0x3F, intermediates 0x20..=0x2F, final 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params_raw = &buf[2..end];
    let consumed = end + 1;

    if final_byte == b'u' {
        return parse_kitty_key(params_raw, consumed);
    }

    let params = parse_csi_params(params_raw);
    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

    if final_byte == b'~' {
        let code = match params.first().map_or(0, |p| p.0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            n @ 11..=15 => KeyCode::F(fn_key(n - 10)),
            n @ 17..=21 => KeyCode::F(fn_key(n - 11)),
            n @ 23..=26 => KeyCode::F(fn_key(n - 12)),
            n @ 28..=29 => KeyCode::F(fn_key(n - 13)),
            n @ 31..=34 => KeyCode::F(fn_key(n - 14)),
            _ => return Parsed::Skip(consumed),
        };
        return Parsed::Input(key_with(code, modifiers), consumed);
    }

    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        b'Z' => return Parsed::Input(key_with(KeyCode::Tab, Modifiers::SHIFT), consumed),
        _ => return Parsed::Skip(consumed),
    };
    Parsed::Input(key_with(code, modifiers), consumed)
}

// ── SS3 ─────────────────────────────────────────────────────────────────────

fn parse_ss3(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match buf[2] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'M' => KeyCode::Enter,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Parsed::Skip(3),
    };
    Parsed::Input(press(code), 3)
}

// ── SGR Mouse Protocol ──────────────────────────────────────────────────────

fn parse_sgr_mouse(buf: &[u8]) -> Parsed {
    // ESC [ < Pb ; Px ; Py M   (press / motion)
    // ESC [ < Pb ; Px ; Py m   (release)
    let start = 3;
    let mut end = start;
    while end < buf.len() {
        if buf[end] == b'M' || buf[end] == b'm' {
            break;
        }
        if !buf[end].is_ascii_digit() && buf[end] != b';' {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let is_release = buf[end] == b'm';
    let consumed = end + 1;

    let params = parse_csi_params(&buf[start..end]);
    let value = |i: usize| params.get(i).map_or(0, |p| p.0);
    let cb = value(0);
    // SGR coordinates are 1-indexed; anything past u16 pins to the edge.
    let coord = |i: usize| u16::try_from(value(i).saturating_sub(1)).unwrap_or(u16::MAX);
    let x = coord(1);
    let y = coord(2);

    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let base = cb & 3;
    let kind = if cb & 64 != 0 {
        match base {
            0 => MouseEventKind::ScrollUp,
            1 => MouseEventKind::ScrollDown,
            2 => MouseEventKind::ScrollLeft,
            _ => MouseEventKind::ScrollRight,
        }
    } else if cb & 32 != 0 {
        match base {
            0 => MouseEventKind::Drag(MouseButton::Left),
            1 => MouseEventKind::Drag(MouseButton::Middle),
            2 => MouseEventKind::Drag(MouseButton::Right),
            _ => MouseEventKind::Move,
        }
    } else if is_release {
        MouseEventKind::Release(decode_mouse_button(base))
    } else {
        MouseEventKind::Press(decode_mouse_button(base))
    };

    Parsed::Input(
        Input::Mouse(MouseEvent {
            kind,
            x,
            y,
            modifiers,
        }),
        consumed,
    )
}

// ── Kitty Keyboard Protocol ─────────────────────────────────────────────────

fn parse_kitty_key(params_raw: &[u8], consumed: usize) -> Parsed {
    // CSI codepoint [; modifiers[:event_type]] u
    let params = parse_csi_params(params_raw);
    let codepoint = params.first().map_or(0, |p| p.0);
    let (modifier_val, event_type) = params.get(1).map_or((0, 0), |p| (p.0, p.1));

    let kind = match event_type {
        2 => KeyEventKind::Repeat,
        3 => KeyEventKind::Release,
        _ => KeyEventKind::Press,
    };

    Parsed::Input(
        Input::Key(KeyEvent {
            code: kitty_codepoint_to_keycode(codepoint),
            modifiers: decode_modifiers(modifier_val),
            kind,
        }),
        consumed,
    )
}

// ── UTF-8 ───────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);
    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }
    if buf[1..expected].iter().any(|&b| b & 0xC0 != 0x80) {
        return Parsed::Skip(1);
    }

    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(expected), |ch| {
            Parsed::Input(press(KeyCode::Char(ch)), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn press(code: KeyCode) -> Input {
    key_with(code, Modifiers::empty())
}

const fn key_with(code: KeyCode, modifiers: Modifiers) -> Input {
    Input::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
    })
}

/// Legacy function-key numbers are at most 20 after offsetting.
#[allow(clippy::cast_possible_truncation)]
const fn fn_key(n: u32) -> u8 {
    n as u8
}

/// CSI parameter: `(main_value, colon_sub_parameter)`.
struct CsiParam(u32, u32);

/// Semicolon-separated parameters with optional colon sub-parameters:
/// `97;5:2` → `[(97,0), (5,2)]`.
fn parse_csi_params(raw: &[u8]) -> Vec<CsiParam> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut params = Vec::with_capacity(4);
    let mut pos = 0;
    loop {
        let (main_val, next) = parse_number_at(raw, pos);
        pos = next;

        let sub_val = if raw.get(pos) == Some(&b':') {
            let (v, n) = parse_number_at(raw, pos + 1);
            pos = n;
            v
        } else {
            0
        };
        params.push(CsiParam(main_val, sub_val));

        if raw.get(pos) == Some(&b';') {
            pos += 1;
        } else {
            break;
        }
    }
    params
}

/// Decimal digits from `start`, saturating. Returns `(value, next_position)`.
fn parse_number_at(buf: &[u8], start: usize) -> (u32, usize) {
    let mut val: u32 = 0;
    let mut pos = start;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .saturating_mul(10)
            .saturating_add(u32::from(buf[pos] - b'0'));
        pos += 1;
    }
    (val, pos)
}

/// The encoding is `1 + bitmask`; 0 and 1 mean no modifiers. Only the low
/// six bits carry flags.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u32) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    Modifiers::from_bits_truncate(val as u8)
}

const fn decode_mouse_button(base: u32) -> MouseButton {
    match base {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        _ => MouseButton::Right,
    }
}

/// Kitty functional keys live in the Private Use Area from 57344.
fn kitty_codepoint_to_keycode(cp: u32) -> KeyCode {
    match cp {
        27 | 57344 => KeyCode::Escape,
        13 | 57345 => KeyCode::Enter,
        9 | 57346 => KeyCode::Tab,
        127 | 57347 => KeyCode::Backspace,
        57348 => KeyCode::Insert,
        57349 => KeyCode::Delete,
        57350 => KeyCode::Left,
        57351 => KeyCode::Right,
        57352 => KeyCode::Up,
        57353 => KeyCode::Down,
        57354 => KeyCode::PageUp,
        57355 => KeyCode::PageDown,
        57356 => KeyCode::Home,
        57357 => KeyCode::End,
        57358 => KeyCode::CapsLock,
        57359 => KeyCode::ScrollLock,
        57360 => KeyCode::NumLock,
        57361 => KeyCode::PrintScreen,
        57362 => KeyCode::Pause,
        57363 => KeyCode::Menu,
        cp @ 57364..=57398 => KeyCode::F(fn_key(cp - 57364 + 1)),
        cp => char::from_u32(cp).map_or(KeyCode::Char('\0'), KeyCode::Char),
    }
}

/// Byte length of a UTF-8 character from its lead byte; 0 when invalid.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(data: &[u8]) -> Vec<Input> {
        Parser::new().advance(data)
    }

    fn parse_one(data: &[u8]) -> Input {
        let inputs = parse(data);
        assert_eq!(inputs.len(), 1, "expected 1 input, got {inputs:?}");
        inputs[0]
    }

    fn key(code: KeyCode) -> Input {
        press(code)
    }

    fn key_mod(code: KeyCode, modifiers: Modifiers) -> Input {
        key_with(code, modifiers)
    }

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Input {
        Input::Mouse(MouseEvent {
            kind,
            x,
            y,
            modifiers: Modifiers::empty(),
        })
    }

    // ── Plain keys ──────────────────────────────────────────────────────

    #[test]
    fn ascii_chars() {
        assert_eq!(
            parse(b"ab "),
            vec![
                key(KeyCode::Char('a')),
                key(KeyCode::Char('b')),
                key(KeyCode::Char(' ')),
            ]
        );
    }

    #[test]
    fn control_characters() {
        assert_eq!(parse_one(b"\x01"), key_mod(KeyCode::Char('a'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\x03"), key_mod(KeyCode::Char('c'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\x00"), key_mod(KeyCode::Char('@'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\r"), key(KeyCode::Enter));
        assert_eq!(parse_one(b"\n"), key(KeyCode::Enter));
        assert_eq!(parse_one(b"\t"), key(KeyCode::Tab));
        assert_eq!(parse_one(b"\x7F"), key(KeyCode::Backspace));
        assert_eq!(parse_one(b"\x08"), key(KeyCode::Backspace));
    }

    #[test]
    fn utf8_characters() {
        assert_eq!(parse_one("é".as_bytes()), key(KeyCode::Char('é')));
        assert_eq!(parse_one("世".as_bytes()), key(KeyCode::Char('世')));
        assert_eq!(parse_one("🦀".as_bytes()), key(KeyCode::Char('🦀')));
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "世".as_bytes();
        let mut p = Parser::new();
        assert!(p.advance(&bytes[..1]).is_empty());
        assert!(p.has_pending());
        assert_eq!(p.advance(&bytes[1..]), vec![key(KeyCode::Char('世'))]);
        assert!(!p.has_pending());
    }

    #[test]
    fn stray_continuation_byte_is_skipped() {
        assert_eq!(parse(b"\x80a"), vec![key(KeyCode::Char('a'))]);
    }

    // ── CSI / SS3 ───────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(parse_one(b"\x1b[A"), key(KeyCode::Up));
        assert_eq!(parse_one(b"\x1b[B"), key(KeyCode::Down));
        assert_eq!(parse_one(b"\x1b[C"), key(KeyCode::Right));
        assert_eq!(parse_one(b"\x1b[D"), key(KeyCode::Left));
        assert_eq!(parse_one(b"\x1bOA"), key(KeyCode::Up));
    }

    #[test]
    fn modified_arrows() {
        assert_eq!(parse_one(b"\x1b[1;2A"), key_mod(KeyCode::Up, Modifiers::SHIFT));
        assert_eq!(parse_one(b"\x1b[1;5C"), key_mod(KeyCode::Right, Modifiers::CTRL));
        assert_eq!(
            parse_one(b"\x1b[1;4D"),
            key_mod(KeyCode::Left, Modifiers::SHIFT | Modifiers::ALT)
        );
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(parse_one(b"\x1b[1~"), key(KeyCode::Home));
        assert_eq!(parse_one(b"\x1b[2~"), key(KeyCode::Insert));
        assert_eq!(parse_one(b"\x1b[3~"), key(KeyCode::Delete));
        assert_eq!(parse_one(b"\x1b[4~"), key(KeyCode::End));
        assert_eq!(parse_one(b"\x1b[5~"), key(KeyCode::PageUp));
        assert_eq!(parse_one(b"\x1b[6~"), key(KeyCode::PageDown));
        assert_eq!(parse_one(b"\x1b[3;5~"), key_mod(KeyCode::Delete, Modifiers::CTRL));
    }

    #[test]
    fn function_keys() {
        assert_eq!(parse_one(b"\x1bOP"), key(KeyCode::F(1)));
        assert_eq!(parse_one(b"\x1b[S"), key(KeyCode::F(4)));
        assert_eq!(parse_one(b"\x1b[11~"), key(KeyCode::F(1)));
        assert_eq!(parse_one(b"\x1b[15~"), key(KeyCode::F(5)));
        assert_eq!(parse_one(b"\x1b[17~"), key(KeyCode::F(6)));
        assert_eq!(parse_one(b"\x1b[21~"), key(KeyCode::F(10)));
        assert_eq!(parse_one(b"\x1b[23~"), key(KeyCode::F(11)));
        assert_eq!(parse_one(b"\x1b[24~"), key(KeyCode::F(12)));
        assert_eq!(parse_one(b"\x1b[29~"), key(KeyCode::F(16)));
        assert_eq!(parse_one(b"\x1b[34~"), key(KeyCode::F(20)));
        assert_eq!(parse_one(b"\x1b[24;5~"), key_mod(KeyCode::F(12), Modifiers::CTRL));
    }

    #[test]
    fn shift_tab() {
        assert_eq!(parse_one(b"\x1b[Z"), key_mod(KeyCode::Tab, Modifiers::SHIFT));
    }

    #[test]
    fn unknown_csi_is_skipped() {
        assert_eq!(parse(b"\x1b[99~x"), vec![key(KeyCode::Char('x'))]);
        assert_eq!(parse(b"\x1b[?1;2cx"), vec![key(KeyCode::Char('x'))]);
    }

    // ── Alt / Escape ────────────────────────────────────────────────────

    #[test]
    fn alt_keys() {
        assert_eq!(parse_one(b"\x1ba"), key_mod(KeyCode::Char('a'), Modifiers::ALT));
        assert_eq!(parse_one(b"\x1b\x1b"), key_mod(KeyCode::Escape, Modifiers::ALT));
        assert_eq!(
            parse_one(b"\x1b\x01"),
            key_mod(KeyCode::Char('a'), Modifiers::ALT | Modifiers::CTRL)
        );
    }

    #[test]
    fn lone_escape_waits_for_flush() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b").is_empty());
        assert!(p.has_pending());
        assert_eq!(p.flush(), vec![key(KeyCode::Escape)]);
        assert!(!p.has_pending());
    }

    #[test]
    fn partial_csi_completes_on_next_read() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b[1;").is_empty());
        assert_eq!(p.advance(b"5A"), vec![key_mod(KeyCode::Up, Modifiers::CTRL)]);
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn sgr_mouse_buttons() {
        assert_eq!(
            parse_one(b"\x1b[<0;10;20M"),
            mouse(MouseEventKind::Press(MouseButton::Left), 9, 19)
        );
        assert_eq!(
            parse_one(b"\x1b[<0;10;20m"),
            mouse(MouseEventKind::Release(MouseButton::Left), 9, 19)
        );
        assert_eq!(
            parse_one(b"\x1b[<1;1;1M"),
            mouse(MouseEventKind::Press(MouseButton::Middle), 0, 0)
        );
        assert_eq!(
            parse_one(b"\x1b[<2;3;4M"),
            mouse(MouseEventKind::Press(MouseButton::Right), 2, 3)
        );
    }

    #[test]
    fn sgr_mouse_motion_and_scroll() {
        assert_eq!(
            parse_one(b"\x1b[<32;5;5M"),
            mouse(MouseEventKind::Drag(MouseButton::Left), 4, 4)
        );
        assert_eq!(parse_one(b"\x1b[<35;5;5M"), mouse(MouseEventKind::Move, 4, 4));
        assert_eq!(parse_one(b"\x1b[<64;1;1M"), mouse(MouseEventKind::ScrollUp, 0, 0));
        assert_eq!(parse_one(b"\x1b[<65;1;1M"), mouse(MouseEventKind::ScrollDown, 0, 0));
    }

    #[test]
    fn sgr_mouse_modifiers() {
        assert_eq!(
            parse_one(b"\x1b[<20;1;1M"),
            Input::Mouse(MouseEvent {
                kind: MouseEventKind::Press(MouseButton::Left),
                x: 0,
                y: 0,
                modifiers: Modifiers::SHIFT | Modifiers::CTRL,
            })
        );
    }

    #[test]
    fn sgr_mouse_oversized_coordinates_clamp() {
        assert_eq!(
            parse_one(b"\x1b[<0;70000;99999999999M"),
            mouse(MouseEventKind::Press(MouseButton::Left), u16::MAX, u16::MAX)
        );
        assert_eq!(
            parse_one(b"\x1b[<0;65536;1M"),
            mouse(MouseEventKind::Press(MouseButton::Left), 65535, 0)
        );
    }

    // ── Kitty ───────────────────────────────────────────────────────────

    #[test]
    fn kitty_keys() {
        assert_eq!(parse_one(b"\x1b[97u"), key(KeyCode::Char('a')));
        assert_eq!(parse_one(b"\x1b[97;5u"), key_mod(KeyCode::Char('a'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\x1b[57352u"), key(KeyCode::Up));
        assert_eq!(parse_one(b"\x1b[57364u"), key(KeyCode::F(1)));
        assert_eq!(
            parse_one(b"\x1b[97;1:3u"),
            Input::Key(KeyEvent {
                code: KeyCode::Char('a'),
                modifiers: Modifiers::empty(),
                kind: KeyEventKind::Release,
            })
        );
    }

    // ── Focus / Paste ───────────────────────────────────────────────────

    #[test]
    fn focus_events() {
        assert_eq!(parse_one(b"\x1b[I"), Input::Focus(true));
        assert_eq!(parse_one(b"\x1b[O"), Input::Focus(false));
    }

    #[test]
    fn paste_is_bracketed_keys() {
        assert_eq!(
            parse(b"\x1b[200~hi\r\x1b[201~x"),
            vec![
                Input::PasteStart,
                key(KeyCode::Char('h')),
                key(KeyCode::Char('i')),
                key(KeyCode::Enter),
                Input::PasteEnd,
                key(KeyCode::Char('x')),
            ]
        );
    }

    #[test]
    fn paste_escape_is_literal() {
        let inputs = parse(b"\x1b[200~\x1b[A\x1b[201~");
        assert_eq!(inputs[1], key(KeyCode::Escape));
        assert_eq!(inputs[2], key(KeyCode::Char('[')));
        assert_eq!(inputs.last(), Some(&Input::PasteEnd));
    }

    #[test]
    fn paste_delimiters_split_across_reads() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b[20").is_empty());
        assert_eq!(p.advance(b"0~a"), vec![Input::PasteStart, key(KeyCode::Char('a'))]);
        assert!(p.in_paste());
        assert!(p.advance(b"\x1b[2").is_empty());
        assert_eq!(p.advance(b"01~"), vec![Input::PasteEnd]);
        assert!(!p.in_paste());
    }

    #[test]
    fn inputs_convert_to_event_kinds() {
        assert!(matches!(EventKind::from(Input::PasteStart), EventKind::PasteStart));
        assert!(matches!(
            EventKind::from(Input::Focus(false)),
            EventKind::Focus { gained: false }
        ));
        assert!(matches!(
            EventKind::from(key(KeyCode::Enter)),
            EventKind::Key(KeyEvent { code: KeyCode::Enter, .. })
        ));
    }
}
