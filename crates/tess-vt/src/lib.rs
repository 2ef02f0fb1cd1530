// SPDX-License-Identifier: MIT
//
// tess-vt — a tessera backend for VT100-descended terminals.
//
// Direct terminal control, no TUI framework underneath: raw termios,
// hand-encoded escape sequences, a poll()-driven stdin reader and a
// parser for the input protocols modern terminals speak (CSI/SS3 keys,
// SGR mouse, Kitty keys, bracketed paste, focus reports). Every frame is
// buffered and written in one call inside a synchronized-update bracket.

pub mod ansi;
pub mod backend;
pub mod charset;
pub mod config;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;

pub use backend::VtBackend;
pub use config::VtConfig;
