// SPDX-License-Identifier: MIT
//
// Character sets — what the terminal can be sent, and what to send when
// it can't.
//
// The locale decides the encoding (`LC_ALL` beats `LC_CTYPE` beats
// `LANG`). VT100-family terminals additionally carry a line-drawing
// alternate set (DEC Special Graphics, entered with `ESC ( 0`), which
// covers box drawing and a few symbols even on 7-bit terminals. For
// anything neither path can show, plain ASCII look-alikes are registered
// as implicit fallbacks.

use std::env;

pub const UTF8: &str = "UTF-8";
pub const ASCII: &str = "US-ASCII";

// ─── Locale ─────────────────────────────────────────────────────────────────

/// Character set named by the process locale.
#[must_use]
pub fn from_env() -> String {
    let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|k| env::var(k).ok())
        .find(|v| !v.is_empty())
        .unwrap_or_default();
    from_locale(&locale)
}

/// Character set of a locale string such as `en_US.UTF-8@euro`.
///
/// `C`, `POSIX` and the empty locale are ASCII. A locale without an
/// explicit codeset is assumed to be UTF-8.
#[must_use]
pub fn from_locale(locale: &str) -> String {
    if locale.is_empty() || locale == "C" || locale == "POSIX" {
        return ASCII.to_owned();
    }
    let Some((_, codeset)) = locale.split_once('.') else {
        return UTF8.to_owned();
    };
    let codeset = codeset.split('@').next().unwrap_or(codeset);
    normalize(codeset)
}

fn normalize(codeset: &str) -> String {
    match codeset.to_ascii_uppercase().replace('_', "-").as_str() {
        "UTF-8" | "UTF8" => UTF8.to_owned(),
        "ANSI-X3.4-1968" | "ASCII" | "US-ASCII" => ASCII.to_owned(),
        "ISO-8859-1" | "ISO8859-1" | "LATIN1" => "ISO-8859-1".to_owned(),
        other => other.to_owned(),
    }
}

/// Whether `ch` can be written as-is in `charset`.
#[must_use]
pub fn can_encode(charset: &str, ch: char) -> bool {
    match charset {
        UTF8 => true,
        "ISO-8859-1" => u32::from(ch) < 0x100,
        _ => ch.is_ascii(),
    }
}

// ─── DEC Special Graphics ───────────────────────────────────────────────────

/// Runes reachable through the line-drawing set, with the byte that
/// selects each one while the set is shifted in.
#[rustfmt::skip]
const ACS: &[(char, u8)] = &[
    ('─', b'q'), ('│', b'x'), ('┌', b'l'), ('┐', b'k'), ('└', b'm'), ('┘', b'j'),
    ('├', b't'), ('┤', b'u'), ('┴', b'v'), ('┬', b'w'), ('┼', b'n'),
    ('◆', b'`'), ('▒', b'a'), ('°', b'f'), ('±', b'g'), ('·', b'~'),
    ('⎺', b'o'), ('⎻', b'p'), ('⎼', b'r'), ('⎽', b's'),
    ('≤', b'y'), ('≥', b'z'), ('π', b'{'), ('≠', b'|'), ('£', b'}'),
    ('→', b'+'), ('←', b','), ('↑', b'-'), ('↓', b'.'),
    ('█', b'0'), ('░', b'h'), ('§', b'i'),
];

/// Line-drawing byte for `ch`, if the alternate set has it.
#[must_use]
pub fn acs_byte(ch: char) -> Option<u8> {
    ACS.iter().find(|&&(c, _)| c == ch).map(|&(_, b)| b)
}

// ─── ASCII Fallbacks ────────────────────────────────────────────────────────

/// Look-alikes for line-drawing runes, used when neither the locale nor
/// the alternate set can show them.
#[rustfmt::skip]
const ASCII_FALLBACKS: &[(char, &str)] = &[
    ('█', "#"), ('░', "#"), ('▒', ":"), ('·', "o"), ('°', "o"), ('◆', "+"),
    ('↓', "v"), ('↑', "^"), ('←', "<"), ('→', ">"),
    ('≥', ">"), ('≤', "<"), ('≠', "!"), ('π', "p"), ('±', "#"), ('£', "f"),
    ('─', "-"), ('│', "|"),
    ('┌', "+"), ('┐', "+"), ('└', "+"), ('┘', "+"),
    ('├', "+"), ('┤', "+"), ('┬', "+"), ('┴', "+"), ('┼', "+"),
    ('⎺', "~"), ('⎻', "-"), ('⎼', "-"), ('⎽', "_"),
];

/// Implicit fallbacks for `charset`: empty for UTF-8, the ASCII
/// look-alikes otherwise.
#[must_use]
pub fn implicit_fallbacks(charset: &str) -> Vec<(char, String)> {
    if charset == UTF8 {
        return Vec::new();
    }
    ASCII_FALLBACKS
        .iter()
        .filter(|&&(ch, _)| !can_encode(charset, ch))
        .map(|&(ch, s)| (ch, s.to_owned()))
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────
