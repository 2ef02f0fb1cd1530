// SPDX-License-Identifier: MIT
//
// Screen — the application-facing façade.
//
// A Screen ties the pieces together: the application writes cells into
// the back grid and reads events; `show` runs the diff pass and hands the
// frame to the backend; mode requests go through the controller, which
// skips anything the backend cannot do.
//
// Lifecycle:
//
//   New ──init──▶ Running ──suspend──▶ Suspended
//                    ▲                     │
//                    └──────resume─────────┘
//   Running / Suspended ──fini──▶ Stopped   (one-way)
//
// Threading: the screen itself is single-owner. Consumers on other
// threads take an `event_queue()` handle; `fini` stops that queue, which
// releases every thread blocked on it.

use crossbeam_channel::{Receiver, Sender};

use crate::backend::Backend;
use crate::buffer::CellBuffer;
use crate::cell::Content;
use crate::config::ScreenConfig;
use crate::error::{Error, Result};
use crate::event::{Event, KeyCode};
use crate::fallback::FallbackRegistry;
use crate::mode::{Capabilities, CursorStyle, ModeController, MouseFlags};
use crate::queue::EventQueue;
use crate::render::{RenderStats, Renderer};
use crate::style::Style;

/// Where a screen is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    New,
    Running,
    Suspended,
    Stopped,
}

/// A cell-addressable display plus its event stream.
///
/// ```
/// use tess_screen::screen::Screen;
/// use tess_screen::sim::SimBackend;
/// use tess_screen::style::Style;
///
/// let mut screen = Screen::new(SimBackend::new(20, 2));
/// screen.init().unwrap();
/// screen.put_str(0, 0, "hello", Style::DEFAULT);
/// screen.show().unwrap();
/// assert_eq!(screen.backend().row_text(0).trim_end(), "hello");
/// screen.fini();
/// ```
pub struct Screen<B: Backend> {
    backend: B,
    buffer: CellBuffer,
    fallbacks: FallbackRegistry,
    renderer: Renderer,
    events: EventQueue,
    modes: ModeController,
    default_style: Style,
    cursor: Option<(u16, u16)>,
    state: State,
}

impl<B: Backend> Screen<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ScreenConfig::default())
    }

    #[must_use]
    pub fn with_config(backend: B, config: ScreenConfig) -> Self {
        let (width, height) = backend.size();
        Self {
            backend,
            buffer: CellBuffer::new(width, height),
            fallbacks: FallbackRegistry::new(),
            renderer: Renderer::new(),
            events: EventQueue::new(config.queue_capacity),
            modes: ModeController::default(),
            default_style: config.default_style,
            cursor: None,
            state: State::New,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Acquire the backend and start event delivery.
    ///
    /// Calling `init` on a running screen does nothing.
    ///
    /// # Errors
    ///
    /// Backend acquisition failures. The screen is stopped afterwards and
    /// cannot be reused.
    pub fn init(&mut self) -> Result<()> {
        match self.state {
            State::New => {}
            State::Running | State::Suspended => return Ok(()),
            State::Stopped => return Err(Error::NotRunning),
        }
        if let Err(err) = self.backend.init(self.events.clone()) {
            log::debug!("backend init failed: {err}");
            self.events.stop();
            self.state = State::Stopped;
            return Err(err);
        }

        let caps = self.backend.capabilities();
        self.modes = ModeController::new(caps);
        self.fallbacks.seed_implicit(self.backend.implicit_fallbacks());
        self.refresh_size();
        self.buffer.invalidate();
        self.renderer.invalidate_cursor();
        self.state = State::Running;

        let (width, height) = self.buffer.size();
        log::debug!(
            "screen running: {width}x{height}, charset={}, colors={}, caps={caps:?}",
            self.backend.character_set(),
            self.backend.colors()
        );
        Ok(())
    }

    /// Stop event delivery, restore modes and release the backend.
    ///
    /// Idempotent. Every thread blocked in `poll`, `post_wait` or
    /// `forward` on this screen's queue returns.
    pub fn fini(&mut self) {
        if self.state == State::Stopped {
            return;
        }
        self.events.stop();
        if self.state != State::New {
            self.modes.release(&mut self.backend);
            self.backend.fini();
        }
        self.state = State::Stopped;
        log::debug!("screen stopped");
    }

    /// Current lifecycle state. A backend whose input failed for good
    /// closes the event queue; the screen reads as stopped from then on,
    /// though [`fini`](Self::fini) is still needed to restore the device.
    #[must_use]
    pub fn state(&self) -> State {
        match self.state {
            State::Running | State::Suspended if self.events.is_stopped() => State::Stopped,
            state => state,
        }
    }

    /// Give the terminal to another process, clearing the display first.
    ///
    /// # Errors
    ///
    /// Failures restoring the device's original settings.
    pub fn suspend(&mut self) -> Result<()> {
        self.suspend_inner(true)
    }

    /// Like [`suspend`](Self::suspend) but leaves the display as is.
    ///
    /// # Errors
    ///
    /// Failures restoring the device's original settings.
    pub fn suspend_no_clear(&mut self) -> Result<()> {
        self.suspend_inner(false)
    }

    fn suspend_inner(&mut self, clear: bool) -> Result<()> {
        if self.state != State::Running {
            return Ok(());
        }
        self.modes.release(&mut self.backend);
        if let Err(err) = self.backend.suspend(clear) {
            self.modes.reapply(&mut self.backend);
            return Err(err.into());
        }
        self.state = State::Suspended;
        log::debug!("screen suspended (clear={clear})");
        Ok(())
    }

    /// Take the terminal back. The next `show` repaints everything.
    ///
    /// # Errors
    ///
    /// Failures re-entering raw mode; the screen stays suspended.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != State::Suspended {
            return Ok(());
        }
        self.backend.resume()?;
        self.state = State::Running;
        self.modes.reapply(&mut self.backend);
        self.refresh_size();
        self.buffer.invalidate();
        self.renderer.invalidate_cursor();
        log::debug!("screen resumed");
        Ok(())
    }

    // ─── Cells ───────────────────────────────────────────────────────────

    /// Reset every cell to a blank in the default style.
    pub fn clear(&mut self) {
        self.refresh_size();
        self.buffer.clear(Style::DEFAULT);
    }

    pub fn fill(&mut self, ch: char, style: Style) {
        self.refresh_size();
        self.buffer.fill(ch, style);
    }

    /// Write one cell of the back grid. Out-of-range positions are
    /// ignored.
    pub fn set_content(&mut self, x: i32, y: i32, primary: char, combining: &[char], style: Style) {
        self.buffer.set_content(x, y, primary, combining, style);
    }

    /// Write one cell from a rune list: the first rune is primary, the
    /// rest are combining marks. An empty list does nothing.
    pub fn set_cell(&mut self, x: i32, y: i32, style: Style, runes: &[char]) {
        if let Some((&primary, combining)) = runes.split_first() {
            self.buffer.set_content(x, y, primary, combining, style);
        }
    }

    /// Logical content of a back-grid cell, as last written.
    ///
    /// Cells left in the default style (after [`clear`](Self::clear), or
    /// written with `Style::DEFAULT`) report the `Style::DEFAULT`
    /// placeholder, not the screen's current default style; the
    /// placeholder is resolved only when the cell is drawn.
    #[must_use]
    pub fn get_content(&self, x: i32, y: i32) -> Content<'_> {
        self.buffer.get_content(x, y)
    }

    /// Lay out a string from `(x, y)`; returns columns consumed.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: Style) -> u16 {
        self.buffer.put_str(x, y, text, style)
    }

    /// Change the default style. Applies from the next diff pass to the
    /// cells that pass draws.
    pub fn set_style(&mut self, style: Style) {
        self.default_style = style;
    }

    #[inline]
    #[must_use]
    pub const fn default_style(&self) -> Style {
        self.default_style
    }

    /// `(width, height)` of the cell grid.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        self.buffer.size()
    }

    /// Kept for view compatibility; a screen always spans its device.
    pub const fn resize(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {}

    // ─── Cursor ──────────────────────────────────────────────────────────

    /// Place the cursor. Positions outside the grid hide it.
    pub fn show_cursor(&mut self, x: i32, y: i32) {
        let (width, height) = self.buffer.size();
        self.cursor = match (u16::try_from(x), u16::try_from(y)) {
            (Ok(x), Ok(y)) if x < width && y < height => Some((x, y)),
            _ => None,
        };
    }

    pub fn hide_cursor(&mut self) {
        self.show_cursor(-1, -1);
    }

    /// Best-effort; ignored when the backend cannot shape the cursor.
    pub fn set_cursor_style(&mut self, style: CursorStyle) {
        self.modes.set_cursor_style(&mut self.backend, style);
    }

    // ─── Flushing ────────────────────────────────────────────────────────

    /// Send the cells that changed since the last flush.
    ///
    /// Does nothing unless the screen is running.
    ///
    /// # Errors
    ///
    /// Backend write failures. The next `show` then repaints everything.
    pub fn show(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Ok(());
        }
        self.refresh_size();
        let frame = self.renderer.render(
            &mut self.buffer,
            &self.fallbacks,
            &self.backend,
            self.default_style,
            self.cursor,
        );
        if frame.is_noop() {
            return Ok(());
        }
        if let Err(err) = self.backend.draw(&frame) {
            log::warn!("draw failed, forcing full repaint: {err}");
            self.buffer.invalidate();
            self.renderer.invalidate_cursor();
            return Err(err.into());
        }
        Ok(())
    }

    /// Repaint every cell, whatever the display is believed to show.
    ///
    /// # Errors
    ///
    /// Backend write failures.
    pub fn sync(&mut self) -> Result<()> {
        self.buffer.invalidate();
        self.renderer.invalidate_cursor();
        self.show()
    }

    /// Stats from the most recent diff pass.
    #[inline]
    #[must_use]
    pub const fn render_stats(&self) -> RenderStats {
        self.renderer.last_stats()
    }

    fn refresh_size(&mut self) {
        let (width, height) = self.backend.size();
        if (width, height) != self.buffer.size() {
            log::debug!("resizing cell grids to {width}x{height}");
            self.buffer.resize(width, height);
            if let Some((x, y)) = self.cursor {
                if x >= width || y >= height {
                    self.cursor = None;
                }
            }
        }
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Block for the next event. `None` once the screen is stopped.
    #[must_use]
    pub fn poll_event(&self) -> Option<Event> {
        self.events.poll()
    }

    /// Whether `poll_event` would return immediately with an event.
    /// Always `false` once stopped.
    #[must_use]
    pub fn has_pending_event(&self) -> bool {
        self.events.has_pending()
    }

    /// Enqueue without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::EventQueueFull`] when the queue is at capacity; the event
    /// is dropped. [`Error::NotRunning`] after `fini`.
    pub fn post_event(&self, ev: Event) -> Result<()> {
        self.events.post(ev)
    }

    /// Enqueue, waiting for space.
    ///
    /// Never call this from the thread that drains the queue: with the
    /// queue full it would wait on itself forever.
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] when the screen stops before space frees up.
    pub fn post_event_wait(&self, ev: Event) -> Result<()> {
        if self.events.post_wait(ev) {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    /// Relay events into `ch` until `quit` fires or the screen stops,
    /// then drop `ch`. Blocks; run it on its own thread via an
    /// [`event_queue`](Self::event_queue) handle when the screen stays on
    /// the current one.
    pub fn channel_events(&self, ch: Sender<Event>, quit: &Receiver<()>) {
        self.events.forward(ch, quit);
    }

    /// Shared handle on the event queue, for consumers and producers on
    /// other threads.
    #[must_use]
    pub fn event_queue(&self) -> EventQueue {
        self.events.clone()
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    /// Turn on mouse reporting. Empty flags ask for everything the backend
    /// supports. Idempotent.
    pub fn enable_mouse(&mut self, flags: MouseFlags) {
        self.modes.enable_mouse(&mut self.backend, flags);
    }

    pub fn disable_mouse(&mut self) {
        self.modes.disable_mouse(&mut self.backend);
    }

    pub fn enable_paste(&mut self) {
        self.modes.set_paste(&mut self.backend, true);
    }

    pub fn disable_paste(&mut self) {
        self.modes.set_paste(&mut self.backend, false);
    }

    #[must_use]
    pub fn has_mouse(&self) -> bool {
        self.backend.capabilities().has_mouse()
    }

    /// Mode state as applied to the backend.
    #[inline]
    #[must_use]
    pub const fn modes(&self) -> &ModeController {
        &self.modes
    }

    /// Ask the device to change size. On success the grids are resized,
    /// the next `show` repaints, and a resize event is queued. Ignored by
    /// devices that cannot resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        if self.state != State::Running
            || !self.backend.capabilities().contains(Capabilities::RESIZE)
        {
            return;
        }
        match self.backend.set_size(width, height) {
            Ok(true) => {
                self.refresh_size();
                self.buffer.invalidate();
                let (w, h) = self.buffer.size();
                if let Err(err) = self.events.post(Event::resize(w, h)) {
                    log::debug!("resize event dropped: {err}");
                }
            }
            Ok(false) => {}
            Err(err) => log::warn!("resize request failed: {err}"),
        }
    }

    /// # Errors
    ///
    /// The device could not produce an alert.
    pub fn beep(&mut self) -> Result<()> {
        self.backend.beep().map_err(Error::from)
    }

    // ─── Capabilities & fallbacks ────────────────────────────────────────

    #[must_use]
    pub fn colors(&self) -> u32 {
        self.backend.colors()
    }

    #[must_use]
    pub fn character_set(&self) -> &str {
        self.backend.character_set()
    }

    /// Draw `subst` wherever `rune` cannot be displayed. `subst` should be
    /// as wide as `rune`.
    pub fn register_rune_fallback(&mut self, rune: char, subst: &str) {
        self.fallbacks.register(rune, subst);
    }

    /// Remove any substitute for `rune`, built-in ones included.
    pub fn unregister_rune_fallback(&mut self, rune: char) {
        self.fallbacks.unregister(rune);
    }

    #[inline]
    #[must_use]
    pub const fn fallbacks(&self) -> &FallbackRegistry {
        &self.fallbacks
    }

    /// Whether `rune` shows up as itself, or, with `check_fallbacks`, as
    /// some substitute other than `?`.
    #[must_use]
    pub fn can_display(&self, rune: char, check_fallbacks: bool) -> bool {
        if self.backend.can_encode(rune) {
            return true;
        }
        check_fallbacks && (self.backend.has_alternate(rune) || self.fallbacks.contains(rune))
    }

    /// Whether the device can produce `key`. Plain characters always can.
    #[must_use]
    pub fn has_key(&self, key: KeyCode) -> bool {
        matches!(key, KeyCode::Char(_)) || self.backend.has_key(key)
    }

    // ─── Backend access ──────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: Backend> Drop for Screen<B> {
    fn drop(&mut self) {
        self.fini();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Modifiers;
    use crate::render::Displayable;
    use crate::sim::SimBackend;

    fn running(w: u16, h: u16) -> Screen<SimBackend> {
        let mut s = Screen::new(SimBackend::new(w, h));
        s.init().unwrap();
        s
    }

    #[test]
    fn init_transitions_to_running() {
        let s = running(10, 5);
        assert_eq!(s.state(), State::Running);
        assert!(s.backend().is_initialized());
        assert_eq!(s.size(), (10, 5));
    }

    #[test]
    fn failed_init_stops_screen() {
        let mut be = SimBackend::new(10, 5);
        be.fail_init(true);
        let mut s = Screen::new(be);
        assert!(matches!(s.init(), Err(Error::NotATerminal)));
        assert_eq!(s.state(), State::Stopped);
        assert!(matches!(s.init(), Err(Error::NotRunning)));
    }

    #[test]
    fn fini_is_idempotent() {
        let mut s = running(10, 5);
        s.fini();
        s.fini();
        assert_eq!(s.state(), State::Stopped);
        assert!(!s.backend().is_initialized());
        assert!(s.poll_event().is_none());
    }

    #[test]
    fn closed_input_stops_screen_after_drain() {
        let mut s = running(10, 5);
        let queue = s.event_queue();
        queue
            .post(Event::key(KeyCode::Char('q'), Modifiers::empty()))
            .unwrap();
        queue.close();
        assert_eq!(s.state(), State::Running);
        assert!(s.poll_event().is_some());
        assert_eq!(s.state(), State::Stopped);
        assert!(s.poll_event().is_none());
        assert!(!s.has_pending_event());

        // The device still has to be handed back.
        assert!(s.backend().is_initialized());
        s.fini();
        assert!(!s.backend().is_initialized());
    }

    #[test]
    fn get_content_reports_placeholder_style_after_clear() {
        let mut s = running(3, 1);
        let default = Style::DEFAULT
            .fg(crate::style::Color::WHITE)
            .bg(crate::style::Color::BLUE);
        s.set_style(default);
        s.clear();
        assert_eq!(s.get_content(0, 0).style, Style::DEFAULT);
        s.show().unwrap();
        assert_eq!(s.backend().style_at(0, 0), default);
        assert_eq!(s.get_content(0, 0).style, Style::DEFAULT);
    }

    #[test]
    fn show_before_init_is_noop() {
        let mut s = Screen::new(SimBackend::new(4, 1));
        s.put_str(0, 0, "ab", Style::DEFAULT);
        s.show().unwrap();
        assert!(s.backend().frames().is_empty());
    }

    #[test]
    fn set_cell_splits_runes() {
        let mut s = running(4, 1);
        s.set_cell(0, 0, Style::DEFAULT, &['e', '\u{301}']);
        let c = s.get_content(0, 0);
        assert_eq!(c.primary, 'e');
        assert_eq!(c.combining, &['\u{301}']);
        s.set_cell(1, 0, Style::DEFAULT, &[]);
        assert_eq!(s.get_content(1, 0).primary, ' ');
    }

    #[test]
    fn show_cursor_outside_grid_hides() {
        let mut s = running(10, 5);
        s.show_cursor(3, 4);
        s.show().unwrap();
        assert_eq!(s.backend().cursor(), Some((3, 4)));
        s.show_cursor(10, 0);
        s.show().unwrap();
        assert_eq!(s.backend().cursor(), None);
        s.show_cursor(1, 1);
        s.show().unwrap();
        s.hide_cursor();
        s.show().unwrap();
        assert_eq!(s.backend().cursor(), None);
    }

    #[test]
    fn draw_failure_forces_repaint() {
        let mut s = running(4, 1);
        s.show().unwrap();
        s.put_str(0, 0, "x", Style::DEFAULT);
        s.backend_mut().fail_draw(true);
        assert!(s.show().is_err());
        s.backend_mut().fail_draw(false);
        s.show().unwrap();
        assert!(s.backend().last_frame().unwrap().full);
    }

    #[test]
    fn set_style_applies_to_next_pass() {
        let mut s = running(2, 1);
        s.show().unwrap();
        let blue = Style::DEFAULT.bg(crate::style::Color::BLUE);
        s.set_style(blue);
        s.put_str(0, 0, "a", Style::DEFAULT);
        s.show().unwrap();
        let be = s.backend();
        assert_eq!(be.style_at(0, 0), blue);
        // Unchanged cells keep their old rendering.
        assert_eq!(be.style_at(1, 0), Style::DEFAULT);
    }

    #[test]
    fn can_display_modes() {
        let s = {
            let mut s = Screen::new(
                SimBackend::new(4, 1)
                    .with_charset("US-ASCII")
                    .with_alternates(['─'])
                    .with_implicit_fallbacks(vec![('│', "|".to_string())]),
            );
            s.init().unwrap();
            s
        };
        assert!(s.can_display('a', false));
        assert!(!s.can_display('─', false));
        assert!(s.can_display('─', true));
        assert!(s.can_display('│', true));
        assert!(!s.can_display('é', true));
        assert!(!s.backend().can_encode('é'));
    }

    #[test]
    fn has_key_always_true_for_chars() {
        let mut s = Screen::new(SimBackend::new(1, 1).without_key(KeyCode::F(13)));
        s.init().unwrap();
        assert!(s.has_key(KeyCode::Char('z')));
        assert!(s.has_key(KeyCode::F(1)));
        assert!(!s.has_key(KeyCode::F(13)));
    }

    #[test]
    fn beep_reports_failure() {
        let mut s = running(1, 1);
        s.beep().unwrap();
        assert_eq!(s.backend().beeps(), 1);
        s.backend_mut().fail_beep(true);
        assert!(matches!(s.beep(), Err(Error::Io(_))));
    }

    #[test]
    fn resume_failure_keeps_suspended() {
        let mut s = running(1, 1);
        s.suspend().unwrap();
        s.backend_mut().fail_resume(true);
        assert!(s.resume().is_err());
        assert_eq!(s.state(), State::Suspended);
    }

    #[test]
    fn device_resize_picked_up_on_show() {
        let mut s = running(10, 5);
        s.show().unwrap();
        s.backend_mut().resize_device(6, 3);
        s.show().unwrap();
        assert_eq!(s.size(), (6, 3));
        let frame = s.backend().last_frame().unwrap();
        assert!(frame.full);
        assert_eq!(frame.writes.len(), 18);
    }

    #[test]
    fn drop_releases_backend_modes() {
        let queue;
        {
            let mut s = running(2, 2);
            s.enable_mouse(MouseFlags::empty());
            queue = s.event_queue();
        }
        assert!(queue.is_stopped());
    }
}
