//! Text normalization: raw page text to clean, ordered lines.
//!
//! ## Why NFC?
//!
//! PDF generators for right-to-left scripts emit reshaped glyph sequences;
//! the same visible word can arrive as different code-point sequences
//! (combining marks, composed or decomposed forms) depending on the shaping
//! engine. Canonical composition (NFC) collapses the canonical-equivalence
//! cases so the rule table matches on one spelling instead of several.
//! Compatibility forms (Arabic presentation forms) are *not* folded here —
//! NFC leaves them alone by design, and the rule table carries anchors for
//! both spellings instead.

use unicode_normalization::UnicodeNormalization;

/// Canonicalize raw extracted page text into non-empty, trimmed, NFC lines.
///
/// Lines keep their original order; nothing is reordered, merged, or
/// interpreted. Empty input yields an empty vec — there is no failure mode.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.nfc().collect())
        .collect()
}
