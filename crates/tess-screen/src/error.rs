// SPDX-License-Identifier: MIT
//
// Error kinds surfaced by the screen layer.
//
// Only resource and OS-level failures live here. Capability gaps (no
// mouse, no bracketed paste, no cursor shapes, no resize) are absorbed by
// the mode controller and never reach the caller as errors.

use std::io;

use thiserror::Error;

/// Errors returned by [`Screen`](crate::screen::Screen) and its parts.
#[derive(Debug, Error)]
pub enum Error {
    /// `post_event` found the queue at capacity. The event was dropped.
    #[error("event queue is full")]
    EventQueueFull,

    /// The backend's device is not a terminal.
    #[error("not a terminal")]
    NotATerminal,

    /// The operation needs an initialized, running screen.
    #[error("screen is not running")]
    NotRunning,

    /// I/O failure talking to the device (raw mode, writes, alerts).
    #[error("terminal I/O: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
