//! Removal of emoji and pictograph glyphs from review text.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

/// Inclusive code-point ranges treated as non-textual glyphs.
///
/// Covers emoticons, pictographs, transport/map symbols, regional-indicator
/// flags, dingbats, enclosed alphanumerics and the emoji presentation
/// selectors. Letters of every script, digits and punctuation are outside
/// these ranges.
pub const EXCLUDED_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs (includes skin tones)
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F1E0, 0x1F1FF), // regional indicators (flags)
    (0x2702, 0x27B0),   // dingbats
    (0x24C2, 0x24C2),   // circled M
    (0x1F000, 0x1F0FF), // mahjong, domino, playing cards
    (0x1F170, 0x1F251), // enclosed alphanumeric and ideographic supplements
    (0x1F900, 0x1F9FF), // supplemental symbols & pictographs
    (0x1FA70, 0x1FAFF), // symbols & pictographs extended-A
    (0x2600, 0x26FF),   // miscellaneous symbols
    (0x2B00, 0x2BFF),   // miscellaneous symbols and arrows
    (0x25A0, 0x25FF),   // geometric shapes
    (0x231A, 0x231B),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0x20E3, 0x20E3), // combining enclosing keycap
    (0xFE0E, 0xFE0F), // variation selectors 15/16
];

/// Text symbols that only become emoji when followed by U+FE0F.
///
/// On their own (`©`, `™`, `↔`) they are ordinary punctuation and are kept.
pub const PRESENTATION_BASES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x21AA), // arrows
    (0x2934, 0x2935),
];

/// Runs of excluded glyphs, including zero-width joiners that sit between
/// two glyphs of the same sequence. A joiner next to ordinary text is kept.
static GLYPH_RUN: LazyLock<Regex> = LazyLock::new(|| {
    let glyph = format!(
        "(?:{}|{}\\x{{FE0F}})",
        char_class(EXCLUDED_RANGES),
        char_class(PRESENTATION_BASES)
    );
    let pattern = format!("{glyph}+(?:\\x{{200D}}{glyph}+)*");
    Regex::new(&pattern).expect("valid glyph regex")
});

fn char_class(ranges: &[(u32, u32)]) -> String {
    let mut class = String::from("[");
    for &(start, end) in ranges {
        if start == end {
            let _ = write!(class, "\\x{{{start:X}}}");
        } else {
            let _ = write!(class, "\\x{{{start:X}}}-\\x{{{end:X}}}");
        }
    }
    class.push(']');
    class
}

/// Returns `true` if `c` falls in one of [`EXCLUDED_RANGES`].
#[must_use]
pub fn is_excluded_glyph(c: char) -> bool {
    let cp = u32::from(c);
    EXCLUDED_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}

/// Strip emoji/pictograph glyphs from `text` and trim surrounding whitespace.
///
/// Every other character is kept as-is, including punctuation, inner
/// whitespace and non-Latin scripts. Input made only of glyphs and
/// whitespace comes back as an empty string, which callers treat as "no
/// content". Idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped = GLYPH_RUN.replace_all(text, "");
    stripped.trim().to_string()
}
