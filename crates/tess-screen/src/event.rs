// SPDX-License-Identifier: MIT
//
// Events — everything that flows from the backend to the application.
//
// An event is an immutable record: a creation timestamp and a payload.
// The pipeline never inspects payloads; it only moves them, in order.
//
// Key and mouse vocabularies mirror what modern terminals can report:
// legacy CSI keys, Kitty keyboard codepoints, and SGR mouse buttons. A
// backend that knows less simply never produces the richer variants.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bitflags::bitflags;

use crate::error::Error;

/// Opaque, shareable payload for interrupt and backend-specific events.
pub type Payload = Arc<dyn Any + Send + Sync>;

// ─── Event ───────────────────────────────────────────────────────────────────

/// A timestamped input event.
#[derive(Clone)]
pub struct Event {
    when: Instant,
    kind: EventKind,
}

impl Event {
    /// Stamp `kind` with the current time.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            when: Instant::now(),
            kind,
        }
    }

    /// Convenience constructor for a plain key press.
    #[must_use]
    pub fn key(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(EventKind::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
        }))
    }

    /// Convenience constructor for a resize notification.
    #[must_use]
    pub fn resize(width: u16, height: u16) -> Self {
        Self::new(EventKind::Resize { width, height })
    }

    /// When the event was created.
    #[inline]
    #[must_use]
    pub const fn when(&self) -> Instant {
        self.when
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn into_kind(self) -> EventKind {
        self.kind
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:?})", self.kind)
    }
}

/// What happened.
#[derive(Clone)]
pub enum EventKind {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Start of a bracketed paste. Keys until [`PasteEnd`](Self::PasteEnd)
    /// are pasted text, not typing.
    PasteStart,
    PasteEnd,
    /// The display changed size. Carries the new dimensions.
    Resize { width: u16, height: u16 },
    Focus { gained: bool },
    /// Wake-up posted by the application itself, with optional data.
    Interrupt(Option<Payload>),
    /// A failure observed on the input side (e.g. a read error).
    Error(Arc<Error>),
    /// Backend-specific payload.
    Custom(Payload),
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "Key({k:?})"),
            Self::Mouse(m) => write!(f, "Mouse({m:?})"),
            Self::PasteStart => write!(f, "PasteStart"),
            Self::PasteEnd => write!(f, "PasteEnd"),
            Self::Resize { width, height } => write!(f, "Resize({width}x{height})"),
            Self::Focus { gained } => write!(f, "Focus(gained={gained})"),
            Self::Interrupt(p) => write!(f, "Interrupt(payload={})", p.is_some()),
            Self::Error(e) => write!(f, "Error({e})"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// A keyboard event with key identity, modifiers, and press state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

/// Press / repeat / release. Terminals without the Kitty protocol only
/// ever report presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A literal character. Always available.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F35.
    F(u8),
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    Menu,
}

bitflags! {
    /// Keyboard modifier flags (xterm/Kitty bit layout).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
        const HYPER = 0b0001_0000;
        const META  = 0b0010_0000;
    }
}

// ─── Mouse ───────────────────────────────────────────────────────────────────

/// A mouse action at a 0-indexed cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Press(MouseButton),
    Release(MouseButton),
    /// Motion with a button held.
    Drag(MouseButton),
    /// Motion with no button held.
    Move,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
