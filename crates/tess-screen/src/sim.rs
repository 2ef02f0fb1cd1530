// SPDX-License-Identifier: MIT
//
// In-memory backend for tests and headless use.
//
// SimBackend applies frames to a grid of strings standing in for the
// physical display, and records everything the screen asks of it: frames,
// mode switches, beeps, suspends. Tests drive input by injecting events
// into the queue it was given at init.
//
// Character set, capabilities, color count and the alternate character
// set are all configurable, so fallback and capability paths can be
// exercised without a terminal. Failures can be injected per category.

use std::collections::HashSet;
use std::io;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::event::{Event, KeyCode};
use crate::mode::{Capabilities, CursorStyle, MouseFlags};
use crate::queue::EventQueue;
use crate::render::{CursorPlacement, Displayable, Frame, Glyph};
use crate::style::Style;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    text: String,
    style: Style,
}

impl Slot {
    fn blank() -> Self {
        Self {
            text: " ".to_string(),
            style: Style::DEFAULT,
        }
    }
}

/// Simulated display.
#[derive(Debug)]
pub struct SimBackend {
    width: u16,
    height: u16,
    caps: Capabilities,
    colors: u32,
    charset: String,
    alternates: HashSet<char>,
    implicit: Vec<(char, String)>,
    missing_keys: HashSet<KeyCode>,

    surface: Vec<Slot>,
    cursor: Option<(u16, u16)>,
    frames: Vec<Frame>,

    events: Option<EventQueue>,
    initialized: bool,
    suspended: bool,
    last_suspend_cleared: bool,

    mouse: MouseFlags,
    paste: bool,
    cursor_style: CursorStyle,
    mode_calls: usize,
    beeps: usize,

    fail_init: bool,
    fail_draw: bool,
    fail_modes: bool,
    fail_beep: bool,
    fail_resume: bool,
}

impl SimBackend {
    /// A UTF-8, 256-color display with every capability.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            caps: Capabilities::all(),
            colors: 256,
            charset: "UTF-8".to_string(),
            alternates: HashSet::new(),
            implicit: Vec::new(),
            missing_keys: HashSet::new(),
            surface: vec![Slot::blank(); usize::from(width) * usize::from(height)],
            cursor: None,
            frames: Vec::new(),
            events: None,
            initialized: false,
            suspended: false,
            last_suspend_cleared: false,
            mouse: MouseFlags::empty(),
            paste: false,
            cursor_style: CursorStyle::Default,
            mode_calls: 0,
            beeps: 0,
            fail_init: false,
            fail_draw: false,
            fail_modes: false,
            fail_beep: false,
            fail_resume: false,
        }
    }

    // ─── Configuration ───────────────────────────────────────────────────

    #[must_use]
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: u32) -> Self {
        self.colors = colors;
        self
    }

    /// Character set name. Anything other than `UTF-8` can encode ASCII
    /// only.
    #[must_use]
    pub fn with_charset(mut self, name: &str) -> Self {
        self.charset = name.to_string();
        self
    }

    /// Runes drawable through the alternate character set.
    #[must_use]
    pub fn with_alternates(mut self, runes: impl IntoIterator<Item = char>) -> Self {
        self.alternates = runes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_implicit_fallbacks(mut self, entries: Vec<(char, String)>) -> Self {
        self.implicit = entries;
        self
    }

    #[must_use]
    pub fn without_key(mut self, key: KeyCode) -> Self {
        self.missing_keys.insert(key);
        self
    }

    pub fn fail_init(&mut self, on: bool) {
        self.fail_init = on;
    }

    pub fn fail_draw(&mut self, on: bool) {
        self.fail_draw = on;
    }

    pub fn fail_modes(&mut self, on: bool) {
        self.fail_modes = on;
    }

    pub fn fail_beep(&mut self, on: bool) {
        self.fail_beep = on;
    }

    pub fn fail_resume(&mut self, on: bool) {
        self.fail_resume = on;
    }

    // ─── Driving input ───────────────────────────────────────────────────

    /// Post an event as if the device produced it. Returns false before
    /// init or once the queue is stopped or full.
    pub fn inject(&self, ev: Event) -> bool {
        self.events.as_ref().is_some_and(|q| q.post(ev).is_ok())
    }

    /// Simulate the user resizing the display.
    pub fn resize_device(&mut self, width: u16, height: u16) {
        self.reshape(width, height);
        let _ = self.inject(Event::resize(width, height));
    }

    // ─── Readback ────────────────────────────────────────────────────────

    /// Text shown at a display position. Continuation columns of wide
    /// glyphs read as the empty string.
    #[must_use]
    pub fn text_at(&self, x: u16, y: u16) -> &str {
        self.slot(x, y).map_or("", |s| s.text.as_str())
    }

    #[must_use]
    pub fn style_at(&self, x: u16, y: u16) -> Style {
        self.slot(x, y).map_or(Style::DEFAULT, |s| s.style)
    }

    /// One display row as a string.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width).map(|x| self.text_at(x, y)).collect()
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Whether the most recent suspend wiped the display.
    #[must_use]
    pub const fn last_suspend_cleared(&self) -> bool {
        self.last_suspend_cleared
    }

    #[must_use]
    pub const fn mouse(&self) -> MouseFlags {
        self.mouse
    }

    #[must_use]
    pub const fn paste(&self) -> bool {
        self.paste
    }

    #[must_use]
    pub const fn cursor_style(&self) -> CursorStyle {
        self.cursor_style
    }

    /// Number of mode switches that reached the device.
    #[must_use]
    pub const fn mode_calls(&self) -> usize {
        self.mode_calls
    }

    #[must_use]
    pub const fn beeps(&self) -> usize {
        self.beeps
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn slot(&self, x: u16, y: u16) -> Option<&Slot> {
        if x < self.width && y < self.height {
            self.surface
                .get(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    fn slot_mut(&mut self, x: u16, y: u16) -> Option<&mut Slot> {
        if x < self.width && y < self.height {
            self.surface
                .get_mut(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    /// Store one column the way a terminal does: overwriting either half
    /// of a wide glyph blanks the other half.
    fn put(&mut self, x: u16, y: u16, text: String, style: Style) {
        let Some(old) = self.slot(x, y).map(|s| s.text.is_empty()) else {
            return;
        };
        if old {
            if let Some(head) = x.checked_sub(1).and_then(|hx| self.slot_mut(hx, y)) {
                *head = Slot::blank();
            }
        } else if self.slot(x + 1, y).is_some_and(|s| s.text.is_empty()) {
            if let Some(tail) = self.slot_mut(x + 1, y) {
                *tail = Slot::blank();
            }
        }
        if let Some(slot) = self.slot_mut(x, y) {
            *slot = Slot { text, style };
        }
    }

    fn reshape(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.surface = vec![Slot::blank(); usize::from(width) * usize::from(height)];
    }

    fn wipe(&mut self) {
        self.surface.fill(Slot::blank());
    }

    fn mode_switch(&mut self) -> io::Result<()> {
        if self.fail_modes {
            return Err(io::Error::other("simulated mode failure"));
        }
        self.mode_calls += 1;
        Ok(())
    }
}

impl Displayable for SimBackend {
    fn can_encode(&self, ch: char) -> bool {
        self.charset.eq_ignore_ascii_case("UTF-8") || ch.is_ascii()
    }

    fn has_alternate(&self, ch: char) -> bool {
        self.alternates.contains(&ch)
    }
}

impl Backend for SimBackend {
    fn init(&mut self, events: EventQueue) -> Result<()> {
        if self.fail_init {
            return Err(Error::NotATerminal);
        }
        self.events = Some(events);
        self.initialized = true;
        Ok(())
    }

    fn fini(&mut self) {
        self.initialized = false;
        self.events = None;
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
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
        self.implicit.clone()
    }

    fn has_key(&self, key: KeyCode) -> bool {
        !self.missing_keys.contains(&key)
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        if self.fail_draw {
            return Err(io::Error::other("simulated draw failure"));
        }
        if frame.full {
            self.wipe();
        }
        for w in &frame.writes {
            let text = match &w.glyph {
                Glyph::Text(s) => s.clone(),
                Glyph::Alternate(c) => c.to_string(),
            };
            self.put(w.x, w.y, text, w.style);
            if w.width == 2 {
                self.put(w.x + 1, w.y, String::new(), w.style);
            }
        }
        match frame.cursor {
            Some(CursorPlacement::At(x, y)) => self.cursor = Some((x, y)),
            Some(CursorPlacement::Hidden) => self.cursor = None,
            None => {}
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn set_mouse(&mut self, flags: MouseFlags) -> io::Result<()> {
        self.mode_switch()?;
        self.mouse = flags;
        Ok(())
    }

    fn set_paste(&mut self, on: bool) -> io::Result<()> {
        self.mode_switch()?;
        self.paste = on;
        Ok(())
    }

    fn set_cursor_style(&mut self, style: CursorStyle) -> io::Result<()> {
        self.mode_switch()?;
        self.cursor_style = style;
        Ok(())
    }

    fn suspend(&mut self, clear: bool) -> io::Result<()> {
        if clear {
            self.wipe();
        }
        self.suspended = true;
        self.last_suspend_cleared = clear;
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        if self.fail_resume {
            return Err(io::Error::other("simulated resume failure"));
        }
        self.suspended = false;
        Ok(())
    }

    fn beep(&mut self) -> io::Result<()> {
        if self.fail_beep {
            return Err(io::Error::other("no bell"));
        }
        self.beeps += 1;
        Ok(())
    }

    fn set_size(&mut self, width: u16, height: u16) -> io::Result<bool> {
        if !self.caps.contains(Capabilities::RESIZE) {
            return Ok(false);
        }
        self.reshape(width, height);
        Ok(true)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CellWrite;

    fn write(x: u16, text: &str, width: u8) -> CellWrite {
        CellWrite {
            x,
            y: 0,
            glyph: Glyph::Text(text.to_string()),
            style: Style::DEFAULT,
            width,
        }
    }

    #[test]
    fn draw_updates_surface() {
        let mut be = SimBackend::new(4, 1);
        let frame = Frame {
            full: true,
            width: 4,
            height: 1,
            writes: vec![write(0, "a", 1), write(1, "世", 2)],
            cursor: Some(CursorPlacement::At(3, 0)),
        };
        be.draw(&frame).unwrap();
        assert_eq!(be.text_at(0, 0), "a");
        assert_eq!(be.text_at(1, 0), "世");
        assert_eq!(be.text_at(2, 0), "");
        assert_eq!(be.row_text(0), "a世 ");
        assert_eq!(be.cursor(), Some((3, 0)));
        assert_eq!(be.frames().len(), 1);
    }

    #[test]
    fn overwriting_half_a_wide_glyph_blanks_the_other_half() {
        let mut be = SimBackend::new(4, 1);
        let mut frame = Frame {
            full: true,
            width: 4,
            height: 1,
            writes: vec![write(0, "世", 2), write(2, "界", 2)],
            cursor: None,
        };
        be.draw(&frame).unwrap();
        assert_eq!(be.row_text(0), "世界");

        frame.full = false;
        frame.writes = vec![write(1, "a", 1), write(2, "b", 1)];
        be.draw(&frame).unwrap();
        assert_eq!(be.row_text(0), " ab ");
    }

    #[test]
    fn ascii_charset_limits_encoding() {
        let be = SimBackend::new(1, 1)
            .with_charset("US-ASCII")
            .with_alternates(['─']);
        assert!(be.can_encode('a'));
        assert!(!be.can_encode('─'));
        assert!(be.has_alternate('─'));
    }

    #[test]
    fn inject_before_init_fails() {
        let be = SimBackend::new(1, 1);
        assert!(!be.inject(Event::resize(1, 1)));
    }

    #[test]
    fn set_size_respects_capability() {
        let mut be = SimBackend::new(5, 5).with_capabilities(Capabilities::empty());
        assert!(!be.set_size(10, 10).unwrap());
        assert_eq!(be.size(), (5, 5));

        let mut be = SimBackend::new(5, 5);
        assert!(be.set_size(10, 3).unwrap());
        assert_eq!(be.size(), (10, 3));
    }

    #[test]
    fn injected_failures() {
        let mut be = SimBackend::new(1, 1);
        be.fail_draw(true);
        assert!(be.draw(&Frame::default()).is_err());
        be.fail_init(true);
        assert!(matches!(be.init(EventQueue::default()), Err(Error::NotATerminal)));
    }
}
