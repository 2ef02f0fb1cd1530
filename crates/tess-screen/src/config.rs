// SPDX-License-Identifier: MIT
//
// Screen configuration.

use crate::queue::DEFAULT_CAPACITY;
use crate::style::Style;

/// Knobs for a [`Screen`](crate::screen::Screen).
///
/// ```
/// use tess_screen::config::ScreenConfig;
///
/// let cfg = ScreenConfig::default();
/// assert_eq!(cfg.queue_capacity, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    /// Pending events held before `post_event` starts failing.
    pub queue_capacity: usize,

    /// Style applied wherever a cell leaves a color unset.
    pub default_style: Style,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CAPACITY,
            default_style: Style::DEFAULT,
        }
    }
}

impl ScreenConfig {
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_default_style(mut self, style: Style) -> Self {
        self.default_style = style;
        self
    }
}
