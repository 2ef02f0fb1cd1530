// SPDX-License-Identifier: MIT
//
// Backend configuration.

use std::time::Duration;

use crate::reader::ReaderConfig;
use crate::terminal::EnterOptions;

/// Knobs for a [`VtBackend`](crate::backend::VtBackend).
///
/// The defaults suit a full-screen application: alternate screen, focus
/// reports, line drawing through the DEC special graphics set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtConfig {
    /// How often the input thread rechecks its stop conditions
    /// (milliseconds). Bounds shutdown and suspend latency.
    pub poll_timeout_ms: u64,

    /// How long a lone ESC waits for the rest of an escape sequence before
    /// it is reported as the Escape key (milliseconds).
    pub escape_timeout_ms: u64,

    /// Draw on the alternate screen, leaving the shell's scrollback alone.
    pub alt_screen: bool,

    /// Ask for focus in/out reports.
    pub focus_reporting: bool,

    /// Use the DEC line-drawing set for box and block runes the locale
    /// cannot encode.
    pub acs: bool,
}

impl Default for VtConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 50,
            escape_timeout_ms: 25,
            alt_screen: true,
            focus_reporting: true,
            acs: true,
        }
    }
}

impl VtConfig {
    #[must_use]
    pub const fn reader(&self) -> ReaderConfig {
        ReaderConfig {
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            escape_timeout: Duration::from_millis(self.escape_timeout_ms),
        }
    }

    #[must_use]
    pub const fn enter_options(&self) -> EnterOptions {
        EnterOptions {
            alt_screen: self.alt_screen,
            focus_reporting: self.focus_reporting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let cfg = VtConfig::default();
        assert_eq!(cfg.poll_timeout_ms, 50);
        assert!(cfg.escape_timeout_ms <= cfg.poll_timeout_ms);
        assert_eq!(cfg.reader().escape_timeout, Duration::from_millis(25));
    }

    #[test]
    fn enter_options_follow_config() {
        let cfg = VtConfig {
            alt_screen: false,
            ..VtConfig::default()
        };
        let opts = cfg.enter_options();
        assert!(!opts.alt_screen);
        assert!(opts.focus_reporting);
    }
}
