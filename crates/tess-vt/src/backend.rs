// SPDX-License-Identifier: MIT
//
// VT/xterm backend — the `Backend` contract over a real terminal.
//
// Output: each frame is encoded into one `OutputBuffer` inside a
// synchronized-update bracket and written with a single call. The
// `CellWriter` keeps the pen state across frames, so unchanged colors and
// adjacent cells cost nothing.
//
// Input: an `InputReader` thread feeds the screen's queue. It is stopped
// on suspend (the sub-shell owns stdin) and started again on resume.
//
// Capability data comes from the environment: the locale decides the
// character set, `NO_COLOR` / `COLORTERM` / `TERM` the color count.

use std::env;
use std::io::{self, Write};

use tess_screen::backend::Backend;
use tess_screen::error::{Error, Result};
use tess_screen::event::KeyCode;
use tess_screen::mode::{Capabilities, CursorStyle, MouseFlags};
use tess_screen::queue::EventQueue;
use tess_screen::render::{CursorPlacement, Displayable, Frame, Glyph};

use crate::ansi;
use crate::charset;
use crate::config::VtConfig;
use crate::output::{CellWriter, OutputBuffer};
use crate::reader::{InputReader, SharedSize};
use crate::terminal::{self, Terminal};

// ─── Environment ────────────────────────────────────────────────────────────

/// Color count implied by the environment.
///
/// `NO_COLOR` (any non-empty value) wins; then `COLORTERM=truecolor|24bit`;
/// then a `TERM` ending in `256color`; otherwise the 8 ANSI colors.
#[must_use]
pub fn detect_colors(no_color: Option<&str>, colorterm: Option<&str>, term: Option<&str>) -> u32 {
    if no_color.is_some_and(|v| !v.is_empty()) {
        return 0;
    }
    if colorterm.is_some_and(|v| v.eq_ignore_ascii_case("truecolor") || v.eq_ignore_ascii_case("24bit")) {
        return 1 << 24;
    }
    match term {
        Some("dumb") => 0,
        Some(t) if t.ends_with("256color") => 256,
        Some(t) if t.ends_with("-direct") => 1 << 24,
        _ => 8,
    }
}

/// What a terminal named `term` can do. A `dumb` terminal can only beep.
#[must_use]
pub fn detect_capabilities(term: Option<&str>, config: &VtConfig) -> Capabilities {
    if term == Some("dumb") {
        return Capabilities::BEEP;
    }
    let mut caps = Capabilities::MOUSE_BUTTON
        | Capabilities::MOUSE_DRAG
        | Capabilities::MOUSE_MOTION
        | Capabilities::BRACKETED_PASTE
        | Capabilities::CURSOR_STYLE
        | Capabilities::RESIZE
        | Capabilities::BEEP;
    if config.focus_reporting {
        caps |= Capabilities::FOCUS;
    }
    caps
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

// ─── VtBackend ──────────────────────────────────────────────────────────────

/// Backend for VT100-descended terminals on a Unix TTY.
///
/// Bytes go to `W` (stdout by default); input is always read from stdin.
pub struct VtBackend<W: Write = io::Stdout> {
    config: VtConfig,
    out: W,
    buf: OutputBuffer,
    writer: CellWriter,
    terminal: Terminal,
    size: SharedSize,
    reader: Option<InputReader>,
    events: Option<EventQueue>,
    charset: String,
    colors: u32,
    caps: Capabilities,
    cursor: Option<(u16, u16)>,
}

impl VtBackend {
    /// A backend on stdout, configured from the environment.
    #[must_use]
    pub fn new(config: VtConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }
}

impl<W: Write> VtBackend<W> {
    /// A backend that writes its bytes to `out`.
    #[must_use]
    pub fn with_writer(config: VtConfig, out: W) -> Self {
        let term = var("TERM");
        let colors = detect_colors(
            var("NO_COLOR").as_deref(),
            var("COLORTERM").as_deref(),
            term.as_deref(),
        );
        let terminal = Terminal::new(config.enter_options());
        let size = SharedSize::new(terminal.size());
        Self {
            config,
            out,
            buf: OutputBuffer::new(),
            writer: CellWriter::new(colors),
            terminal,
            size,
            reader: None,
            events: None,
            charset: charset::from_env(),
            colors,
            caps: detect_capabilities(term.as_deref(), &config),
            cursor: None,
        }
    }

    /// Override the detected character set.
    #[must_use]
    pub fn with_charset(mut self, name: &str) -> Self {
        self.charset = name.to_owned();
        self
    }

    /// Override the detected color count.
    #[must_use]
    pub fn with_colors(mut self, colors: u32) -> Self {
        self.colors = colors;
        self.writer = CellWriter::new(colors);
        self
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &VtConfig {
        &self.config
    }

    /// The sink bytes are written to.
    #[inline]
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    fn start_reader(&mut self) -> io::Result<()> {
        if let Some(events) = &self.events {
            if !events.is_stopped() {
                self.reader = Some(InputReader::spawn(
                    events.clone(),
                    self.size.clone(),
                    self.config.reader(),
                )?);
            }
        }
        Ok(())
    }

    fn stop_reader(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.stop();
        }
    }

    /// Write a short control sequence straight through.
    fn send(&mut self, f: impl FnOnce(&mut OutputBuffer) -> io::Result<()>) -> io::Result<()> {
        f(&mut self.buf)?;
        self.buf.flush_to(&mut self.out)
    }

    fn encode(&mut self, frame: &Frame) -> io::Result<()> {
        let out = &mut self.buf;
        ansi::begin_sync(out)?;
        ansi::cursor_hide(out)?;
        if frame.full {
            ansi::reset(out)?;
            ansi::clear_screen(out)?;
            self.writer.reset_state();
        }

        for w in &frame.writes {
            match &w.glyph {
                Glyph::Text(text) => self.writer.put(out, w.x, w.y, w.style, text, w.width),
                Glyph::Alternate(ch) => match charset::acs_byte(*ch) {
                    Some(byte) if self.config.acs => {
                        self.writer.put_line_drawing(out, w.x, w.y, w.style, byte);
                    }
                    _ => self.writer.put(out, w.x, w.y, w.style, "?", 1),
                },
            }
        }
        if !frame.writes.is_empty() {
            ansi::reset(out)?;
            self.writer.reset_state();
        }

        match frame.cursor {
            Some(CursorPlacement::At(x, y)) => self.cursor = Some((x, y)),
            Some(CursorPlacement::Hidden) => self.cursor = None,
            None => {}
        }
        if let Some((x, y)) = self.cursor {
            ansi::cursor_to(out, x, y)?;
            ansi::cursor_show(out)?;
            self.writer.reset_state();
        }
        ansi::end_sync(out)
    }
}

impl<W: Write> Displayable for VtBackend<W> {
    fn can_encode(&self, ch: char) -> bool {
        charset::can_encode(&self.charset, ch)
    }

    fn has_alternate(&self, ch: char) -> bool {
        self.config.acs && charset::acs_byte(ch).is_some()
    }
}

impl<W: Write> Backend for VtBackend<W> {
    fn init(&mut self, events: EventQueue) -> Result<()> {
        if !terminal::is_tty() {
            return Err(Error::NotATerminal);
        }
        self.terminal.enter(&mut self.out)?;
        self.size.set(self.terminal.refresh_size());
        self.writer.reset_state();
        self.cursor = None;
        self.events = Some(events);
        if let Err(err) = self.start_reader() {
            let _ = self.terminal.leave(&mut self.out, true);
            return Err(err.into());
        }
        log::debug!(
            "vt backend up: charset={} colors={} caps={:?}",
            self.charset,
            self.colors,
            self.caps
        );
        Ok(())
    }

    fn fini(&mut self) {
        self.stop_reader();
        if let Err(err) = self.terminal.leave(&mut self.out, true) {
            log::warn!("terminal restore failed: {err}");
        }
        self.events = None;
    }

    fn size(&self) -> (u16, u16) {
        let s = self.size.get();
        (s.cols, s.rows)
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn colors(&self) -> u32 {
        self.colors
    }

    fn character_set(&self) -> &str {
        &self.charset
    }

    fn implicit_fallbacks(&self) -> Vec<(char, String)> {
        charset::implicit_fallbacks(&self.charset)
    }

    /// Legacy encodings reach F1-F20; lock and system keys only exist in
    /// the Kitty protocol, which is not requested.
    fn has_key(&self, key: KeyCode) -> bool {
        match key {
            KeyCode::F(n) => (1..=20).contains(&n),
            KeyCode::CapsLock
            | KeyCode::ScrollLock
            | KeyCode::NumLock
            | KeyCode::PrintScreen
            | KeyCode::Pause
            | KeyCode::Menu => false,
            _ => true,
        }
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        let encoded = self.encode(frame);
        if encoded.is_err() {
            self.buf.clear();
            self.writer.reset_state();
        }
        encoded?;
        log::trace!("frame: {} writes, {} bytes", frame.writes.len(), self.buf.len());
        self.buf.flush_to(&mut self.out)
    }

    fn set_mouse(&mut self, flags: MouseFlags) -> io::Result<()> {
        self.send(|out| ansi::mouse(out, flags))
    }

    fn set_paste(&mut self, on: bool) -> io::Result<()> {
        self.send(|out| ansi::bracketed_paste(out, on))
    }

    fn set_cursor_style(&mut self, style: CursorStyle) -> io::Result<()> {
        self.send(|out| ansi::cursor_style(out, style))
    }

    fn suspend(&mut self, clear: bool) -> io::Result<()> {
        self.stop_reader();
        self.terminal.leave(&mut self.out, clear)
    }

    fn resume(&mut self) -> io::Result<()> {
        self.terminal.enter(&mut self.out)?;
        self.size.set(self.terminal.refresh_size());
        self.writer.reset_state();
        self.cursor = None;
        self.start_reader()
    }

    fn beep(&mut self) -> io::Result<()> {
        self.send(|out| ansi::bell(out))
    }

    /// Sends the request and reports `false`: the terminal answers, if it
    /// does, with a window-size change that the input thread picks up.
    fn set_size(&mut self, width: u16, height: u16) -> io::Result<bool> {
        self.send(|out| ansi::resize_window(out, width, height))?;
        Ok(false)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
