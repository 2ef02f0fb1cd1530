// SPDX-License-Identifier: MIT
//
// tess-screen — the terminal screen core of tessera.
//
// An application describes a grid of styled cells and receives input
// events; this crate owns everything in between that does not depend on
// a particular device. Two grids (what the application wants, what the
// display shows) are diffed into minimal frames; undisplayable runes go
// through a fallback registry; input flows through a bounded queue that a
// single stop signal can drain and release; optional terminal modes are
// switched only when they change and only when the device supports them.
//
// Devices plug in through the `Backend` trait. `tess-vt` implements it
// for VT/xterm terminals; `sim::SimBackend` implements it in memory.

pub mod backend;
pub mod buffer;
pub mod cell;
pub mod config;
pub mod error;
pub mod event;
pub mod fallback;
pub mod grid;
pub mod mode;
pub mod queue;
pub mod render;
pub mod screen;
pub mod sim;
pub mod style;

pub use backend::Backend;
pub use config::ScreenConfig;
pub use error::{Error, Result};
pub use event::{Event, EventKind, KeyCode, KeyEvent, Modifiers, MouseEvent};
pub use mode::{Capabilities, CursorStyle, MouseFlags};
pub use queue::EventQueue;
pub use render::{CellWrite, CursorPlacement, Displayable, Frame, Glyph};
pub use screen::{Screen, State};
pub use style::{Attr, Color, Style, UnderlineStyle};
