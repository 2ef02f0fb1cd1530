// SPDX-License-Identifier: MIT
//
// Terminal modes: mouse reporting, bracketed paste, cursor shape.
//
// The controller remembers what the application asked for and what the
// backend is currently in, and talks to the backend only on change. It
// reapplies everything after a resume and puts the terminal back to its
// defaults on shutdown. Requests a backend cannot honour are recorded
// and silently ignored.

use std::io;

use bitflags::bitflags;

use crate::backend::Backend;

bitflags! {
    /// Which mouse events to report. Empty means everything supported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct MouseFlags: u8 {
        /// Press and release.
        const BUTTON_EVENTS = 1;
        /// Motion while a button is held.
        const DRAG_EVENTS = 2;
        /// All motion, button or not.
        const MOTION_EVENTS = 4;
    }
}

impl MouseFlags {
    /// Normalise a request: empty selects every reporting level.
    #[must_use]
    pub const fn resolve(self) -> Self {
        if self.is_empty() { Self::all() } else { self }
    }
}

bitflags! {
    /// What a backend can do beyond drawing cells.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Capabilities: u16 {
        const MOUSE_BUTTON    = 1 << 0;
        const MOUSE_DRAG      = 1 << 1;
        const MOUSE_MOTION    = 1 << 2;
        const BRACKETED_PASTE = 1 << 3;
        const CURSOR_STYLE    = 1 << 4;
        const RESIZE          = 1 << 5;
        const BEEP            = 1 << 6;
        const FOCUS           = 1 << 7;
    }
}

impl Capabilities {
    /// Any mouse reporting at all.
    #[inline]
    #[must_use]
    pub const fn has_mouse(self) -> bool {
        self.intersects(Self::MOUSE_BUTTON.union(Self::MOUSE_DRAG).union(Self::MOUSE_MOTION))
    }

    /// Restrict mouse flags to what this backend reports.
    #[must_use]
    pub const fn mask_mouse(self, flags: MouseFlags) -> MouseFlags {
        let mut bits = 0;
        if self.contains(Self::MOUSE_BUTTON) {
            bits |= MouseFlags::BUTTON_EVENTS.bits();
        }
        if self.contains(Self::MOUSE_DRAG) {
            bits |= MouseFlags::DRAG_EVENTS.bits();
        }
        if self.contains(Self::MOUSE_MOTION) {
            bits |= MouseFlags::MOTION_EVENTS.bits();
        }
        MouseFlags::from_bits_truncate(flags.bits() & bits)
    }
}

/// Cursor shape. `Default` is whatever the terminal uses on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CursorStyle {
    #[default]
    Default,
    BlinkingBlock,
    SteadyBlock,
    BlinkingUnderline,
    SteadyUnderline,
    BlinkingBar,
    SteadyBar,
}

impl CursorStyle {
    /// DECSCUSR parameter for this shape.
    #[must_use]
    pub const fn decscusr(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::BlinkingBlock => 1,
            Self::SteadyBlock => 2,
            Self::BlinkingUnderline => 3,
            Self::SteadyUnderline => 4,
            Self::BlinkingBar => 5,
            Self::SteadyBar => 6,
        }
    }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Desired vs applied mode state.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    caps: Capabilities,

    want_mouse: MouseFlags,
    want_paste: bool,
    want_cursor: CursorStyle,

    applied_mouse: MouseFlags,
    applied_paste: bool,
    applied_cursor: CursorStyle,
}

impl ModeController {
    #[must_use]
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Mouse flags currently in effect on the backend.
    #[inline]
    #[must_use]
    pub const fn mouse(&self) -> MouseFlags {
        self.applied_mouse
    }

    #[inline]
    #[must_use]
    pub const fn paste(&self) -> bool {
        self.applied_paste
    }

    #[inline]
    #[must_use]
    pub const fn cursor_style(&self) -> CursorStyle {
        self.applied_cursor
    }

    /// Request mouse reporting. Empty flags select all levels; flags the
    /// backend cannot report are dropped.
    pub fn enable_mouse<B: Backend + ?Sized>(&mut self, backend: &mut B, flags: MouseFlags) {
        self.want_mouse = self.caps.mask_mouse(flags.resolve());
        self.apply_mouse(backend);
    }

    pub fn disable_mouse<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        self.want_mouse = MouseFlags::empty();
        self.apply_mouse(backend);
    }

    pub fn set_paste<B: Backend + ?Sized>(&mut self, backend: &mut B, on: bool) {
        self.want_paste = on && self.caps.contains(Capabilities::BRACKETED_PASTE);
        self.apply_paste(backend);
    }

    pub fn set_cursor_style<B: Backend + ?Sized>(&mut self, backend: &mut B, style: CursorStyle) {
        if !self.caps.contains(Capabilities::CURSOR_STYLE) {
            self.want_cursor = CursorStyle::Default;
            return;
        }
        self.want_cursor = style;
        self.apply_cursor(backend);
    }

    /// Push every desired mode to the backend regardless of what it is
    /// believed to be in. Used after a resume, when the terminal was
    /// handed to something else.
    pub fn reapply<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        self.applied_mouse = MouseFlags::empty();
        self.applied_paste = false;
        self.applied_cursor = CursorStyle::Default;
        if !self.want_mouse.is_empty() {
            self.apply_mouse(backend);
        }
        if self.want_paste {
            self.apply_paste(backend);
        }
        if self.want_cursor != CursorStyle::Default {
            self.apply_cursor(backend);
        }
    }

    /// Turn everything off on the backend. Desired state is kept so a
    /// later [`reapply`](Self::reapply) restores it.
    pub fn release<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        if !self.applied_mouse.is_empty() {
            absorb("mouse", backend.set_mouse(MouseFlags::empty()));
            self.applied_mouse = MouseFlags::empty();
        }
        if self.applied_paste {
            absorb("paste", backend.set_paste(false));
            self.applied_paste = false;
        }
        if self.applied_cursor != CursorStyle::Default {
            absorb("cursor style", backend.set_cursor_style(CursorStyle::Default));
            self.applied_cursor = CursorStyle::Default;
        }
    }

    fn apply_mouse<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        if self.want_mouse == self.applied_mouse {
            return;
        }
        if absorb("mouse", backend.set_mouse(self.want_mouse)) {
            self.applied_mouse = self.want_mouse;
        }
    }

    fn apply_paste<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        if self.want_paste == self.applied_paste {
            return;
        }
        if absorb("paste", backend.set_paste(self.want_paste)) {
            self.applied_paste = self.want_paste;
        }
    }

    fn apply_cursor<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        if self.want_cursor == self.applied_cursor {
            return;
        }
        if absorb("cursor style", backend.set_cursor_style(self.want_cursor)) {
            self.applied_cursor = self.want_cursor;
        }
    }
}

/// Log and swallow a mode-switch failure. Returns whether it succeeded.
fn absorb(what: &str, res: io::Result<()>) -> bool {
    match res {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to switch {what} mode: {err}");
            false
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBackend;

    fn full() -> ModeController {
        ModeController::new(Capabilities::all())
    }

    #[test]
    fn empty_flags_resolve_to_all() {
        assert_eq!(MouseFlags::empty().resolve(), MouseFlags::all());
        assert_eq!(
            MouseFlags::BUTTON_EVENTS.resolve(),
            MouseFlags::BUTTON_EVENTS
        );
    }

    #[test]
    fn flag_values() {
        assert_eq!(MouseFlags::BUTTON_EVENTS.bits(), 1);
        assert_eq!(MouseFlags::DRAG_EVENTS.bits(), 2);
        assert_eq!(MouseFlags::MOTION_EVENTS.bits(), 4);
    }

    #[test]
    fn mouse_enable_is_idempotent() {
        let mut be = SimBackend::new(10, 5);
        let mut m = full();
        m.enable_mouse(&mut be, MouseFlags::empty());
        m.enable_mouse(&mut be, MouseFlags::empty());
        assert_eq!(be.mode_calls(), 1);
        assert_eq!(m.mouse(), MouseFlags::all());
    }

    #[test]
    fn unsupported_mouse_is_ignored() {
        let mut be = SimBackend::new(10, 5);
        let mut m = ModeController::new(Capabilities::empty());
        m.enable_mouse(&mut be, MouseFlags::all());
        assert_eq!(be.mode_calls(), 0);
        assert!(m.mouse().is_empty());
    }

    #[test]
    fn partial_mouse_support_masks_flags() {
        let caps = Capabilities::MOUSE_BUTTON | Capabilities::MOUSE_DRAG;
        assert_eq!(
            caps.mask_mouse(MouseFlags::all()),
            MouseFlags::BUTTON_EVENTS | MouseFlags::DRAG_EVENTS
        );
        assert!(caps.has_mouse());
        assert!(!Capabilities::BEEP.has_mouse());
    }

    #[test]
    fn paste_toggles_once() {
        let mut be = SimBackend::new(10, 5);
        let mut m = full();
        m.set_paste(&mut be, true);
        m.set_paste(&mut be, true);
        assert!(m.paste());
        m.set_paste(&mut be, false);
        assert!(!m.paste());
        assert_eq!(be.mode_calls(), 2);
    }

    #[test]
    fn cursor_style_without_support_stays_default() {
        let mut be = SimBackend::new(10, 5);
        let mut m = ModeController::new(Capabilities::empty());
        m.set_cursor_style(&mut be, CursorStyle::SteadyBar);
        assert_eq!(m.cursor_style(), CursorStyle::Default);
        assert_eq!(be.mode_calls(), 0);
    }

    #[test]
    fn release_then_reapply_restores() {
        let mut be = SimBackend::new(10, 5);
        let mut m = full();
        m.enable_mouse(&mut be, MouseFlags::BUTTON_EVENTS);
        m.set_paste(&mut be, true);
        m.set_cursor_style(&mut be, CursorStyle::BlinkingBar);

        m.release(&mut be);
        assert!(be.mouse().is_empty());
        assert!(!be.paste());
        assert_eq!(be.cursor_style(), CursorStyle::Default);

        m.reapply(&mut be);
        assert_eq!(be.mouse(), MouseFlags::BUTTON_EVENTS);
        assert!(be.paste());
        assert_eq!(be.cursor_style(), CursorStyle::BlinkingBar);
    }

    #[test]
    fn failed_switch_is_absorbed() {
        let mut be = SimBackend::new(10, 5);
        be.fail_modes(true);
        let mut m = full();
        m.enable_mouse(&mut be, MouseFlags::empty());
        assert!(m.mouse().is_empty());
    }

    #[test]
    fn decscusr_codes() {
        assert_eq!(CursorStyle::Default.decscusr(), 0);
        assert_eq!(CursorStyle::SteadyBar.decscusr(), 6);
    }
}
