// SPDX-License-Identifier: MIT
//
// Backend — the device behind a screen.
//
// A backend owns everything device-specific: raw mode, the output byte
// stream, the input reader, capability detection. The screen hands it
// finished frames and mode switches; it hands the screen events through
// the queue it receives at init.
//
// Mode switches return `io::Result` so the mode controller can log and
// absorb failures. A backend without a capability reports it as absent in
// `capabilities()` and may treat the matching calls as no-ops.

use std::io;

use crate::error::Result;
use crate::event::KeyCode;
use crate::mode::{Capabilities, CursorStyle, MouseFlags};
use crate::queue::EventQueue;
use crate::render::{Displayable, Frame};

pub trait Backend: Displayable {
    /// Take over the device and start delivering events into `events`.
    ///
    /// # Errors
    ///
    /// Fails when the device cannot be opened or configured.
    fn init(&mut self, events: EventQueue) -> Result<()>;

    /// Stop event delivery and give the device back. Must tolerate being
    /// called on a backend that never finished `init`.
    fn fini(&mut self);

    /// Current device dimensions `(width, height)`.
    fn size(&self) -> (u16, u16);

    fn capabilities(&self) -> Capabilities;

    /// Number of colors the device can show; 0 for monochrome.
    fn colors(&self) -> u32;

    /// Name of the device's character set, e.g. `"UTF-8"`.
    fn character_set(&self) -> &str;

    /// Built-in substitutions for runes this device cannot draw.
    fn implicit_fallbacks(&self) -> Vec<(char, String)> {
        Vec::new()
    }

    /// Whether the device can produce `key`.
    fn has_key(&self, key: KeyCode) -> bool;

    /// Apply a frame.
    ///
    /// # Errors
    ///
    /// Write failures on the device.
    fn draw(&mut self, frame: &Frame) -> io::Result<()>;

    /// Switch mouse reporting. Empty flags turn it off.
    ///
    /// # Errors
    ///
    /// Write failures on the device.
    fn set_mouse(&mut self, flags: MouseFlags) -> io::Result<()>;

    /// # Errors
    ///
    /// Write failures on the device.
    fn set_paste(&mut self, on: bool) -> io::Result<()>;

    /// # Errors
    ///
    /// Write failures on the device.
    fn set_cursor_style(&mut self, style: CursorStyle) -> io::Result<()>;

    /// Hand the device to someone else. When `clear` is set the display
    /// is wiped first.
    ///
    /// # Errors
    ///
    /// Failures restoring the device's original mode.
    fn suspend(&mut self, clear: bool) -> io::Result<()>;

    /// Take the device back after [`suspend`](Self::suspend).
    ///
    /// # Errors
    ///
    /// Failures re-entering raw mode.
    fn resume(&mut self) -> io::Result<()>;

    /// Audible or visual alert.
    ///
    /// # Errors
    ///
    /// Write failures on the device.
    fn beep(&mut self) -> io::Result<()>;

    /// Ask the device to change size. Returns whether the request was
    /// honoured; `false` when the device cannot be resized.
    ///
    /// # Errors
    ///
    /// Write failures on the device.
    fn set_size(&mut self, _width: u16, _height: u16) -> io::Result<bool> {
        Ok(false)
    }
}
