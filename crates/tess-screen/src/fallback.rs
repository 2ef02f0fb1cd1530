// SPDX-License-Identifier: MIT
//
// Rune fallbacks — what to draw when the terminal cannot draw a rune.
//
// Two layers of substitution live here:
//
//   implicit — seeded from the backend's capability data at init (for a
//              VT terminal: ASCII stand-ins for line-drawing runes).
//   explicit — registered by the application.
//
// Explicit entries shadow implicit ones. Unregistering a rune removes it
// from both layers, so an application can opt out of a built-in stand-in
// and get `?` instead.
//
// Width contract: a substitute must occupy as many columns as the rune it
// replaces, or everything to its right shifts. This is the caller's
// contract; the registry only reports violations.

use std::collections::HashMap;

use log::warn;
use unicode_width::UnicodeWidthStr;

use crate::cell::char_width;

/// A substitution whose width differs from the rune it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthMismatch {
    pub rune: char,
    pub substitute: String,
    pub rune_width: usize,
    pub substitute_width: usize,
}

/// Rune → substitute string mapping.
///
/// ```
/// use tess_screen::fallback::FallbackRegistry;
///
/// let mut reg = FallbackRegistry::new();
/// reg.seed_implicit([('─', "-".to_string())]);
/// reg.register('─', "=");
/// assert_eq!(reg.lookup('─'), Some("="));
/// reg.unregister('─');
/// assert_eq!(reg.lookup('─'), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FallbackRegistry {
    explicit: HashMap<char, String>,
    implicit: HashMap<char, String>,
}

impl FallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add built-in substitutions supplied by a backend.
    pub fn seed_implicit<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (char, String)>,
    {
        self.implicit.extend(entries);
    }

    /// Register an explicit substitute for `rune`.
    ///
    /// A substitute whose display width differs from the rune's is accepted
    /// but logged.
    pub fn register(&mut self, rune: char, substitute: &str) {
        let rune_width = usize::from(char_width(rune));
        let substitute_width = substitute.width();
        if rune_width != substitute_width {
            warn!(
                "fallback for {rune:?} is {substitute_width} column(s) wide, rune is {rune_width}"
            );
        }
        self.explicit.insert(rune, substitute.to_owned());
    }

    /// Remove every substitute for `rune`, explicit and implicit.
    pub fn unregister(&mut self, rune: char) {
        self.explicit.remove(&rune);
        self.implicit.remove(&rune);
    }

    /// The substitute that would be drawn for `rune`, if any.
    #[must_use]
    pub fn lookup(&self, rune: char) -> Option<&str> {
        self.explicit
            .get(&rune)
            .or_else(|| self.implicit.get(&rune))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, rune: char) -> bool {
        self.explicit.contains_key(&rune) || self.implicit.contains_key(&rune)
    }

    /// Number of runes that currently have a substitute.
    #[must_use]
    pub fn len(&self) -> usize {
        self.implicit
            .keys()
            .filter(|r| !self.explicit.contains_key(*r))
            .count()
            + self.explicit.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty() && self.implicit.is_empty()
    }

    /// Every effective mapping whose substitute width differs from the
    /// rune width, sorted by rune.
    #[must_use]
    pub fn width_mismatches(&self) -> Vec<WidthMismatch> {
        let mut out: Vec<WidthMismatch> = self
            .implicit
            .iter()
            .filter(|(r, _)| !self.explicit.contains_key(*r))
            .chain(self.explicit.iter())
            .filter_map(|(&rune, substitute)| {
                let rune_width = usize::from(char_width(rune));
                let substitute_width = substitute.width();
                (rune_width != substitute_width).then(|| WidthMismatch {
                    rune,
                    substitute: substitute.clone(),
                    rune_width,
                    substitute_width,
                })
            })
            .collect();
        out.sort_by_key(|m| m.rune);
        out
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_registry_has_nothing() {
        let reg = FallbackRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.lookup('ø'), None);
        assert!(!reg.contains('ø'));
    }

    #[test]
    fn explicit_shadows_implicit() {
        let mut reg = FallbackRegistry::new();
        reg.seed_implicit([('│', "|".to_string())]);
        assert_eq!(reg.lookup('│'), Some("|"));
        reg.register('│', "!");
        assert_eq!(reg.lookup('│'), Some("!"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_removes_both_layers() {
        let mut reg = FallbackRegistry::new();
        reg.seed_implicit([('┌', "+".to_string())]);
        reg.register('┌', "#");
        reg.unregister('┌');
        assert_eq!(reg.lookup('┌'), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_implicit_only() {
        let mut reg = FallbackRegistry::new();
        reg.seed_implicit([('─', "-".to_string()), ('│', "|".to_string())]);
        reg.unregister('─');
        assert_eq!(reg.lookup('─'), None);
        assert_eq!(reg.lookup('│'), Some("|"));
    }

    #[test]
    fn matching_widths_report_nothing() {
        let mut reg = FallbackRegistry::new();
        reg.register('ø', "o");
        reg.register('世', "[]");
        assert!(reg.width_mismatches().is_empty());
    }

    #[test]
    fn wide_rune_with_narrow_substitute_is_flagged() {
        let mut reg = FallbackRegistry::new();
        reg.register('世', "?");
        assert_eq!(
            reg.width_mismatches(),
            vec![WidthMismatch {
                rune: '世',
                substitute: "?".to_string(),
                rune_width: 2,
                substitute_width: 1,
            }]
        );
    }

    #[test]
    fn shadowed_implicit_mismatch_is_not_reported() {
        let mut reg = FallbackRegistry::new();
        reg.seed_implicit([('─', "--".to_string())]);
        assert_eq!(reg.width_mismatches().len(), 1);
        reg.register('─', "-");
        assert!(reg.width_mismatches().is_empty());
    }
}
