//! Deterministic OCR correction of raw candidate tokens.
//!
//! Corrections are applied unconditionally and aggressively to maximize
//! recall; protection against false positives lives entirely in the
//! validator's corpus check, never here.

/// Fixed character-substitution table for common OCR misreads, applied to
/// the already-uppercased token.
///
/// The lowercase rows (`i/s/z/q`) are unreachable after uppercasing, and
/// `q→9` disagrees with `Q→0`. This table is ported verbatim from the
/// shipped lookup; do not reorder or "fix" the asymmetry.
const SUBSTITUTIONS: [(char, char); 12] = [
    ('O', '0'),
    ('I', '1'),
    ('S', '5'),
    ('B', '8'),
    ('G', '6'),
    ('Z', '2'),
    ('A', '4'),
    ('Q', '0'),
    ('i', '1'),
    ('s', '5'),
    ('z', '2'),
    ('q', '9'),
];

/// Mangled forms of a leading `K` the OCR engine produces from the
/// glyph sequence "K(" in scanned headers.
const K_LIGATURES: [&str; 4] = ["|<.", "1(", "|(", "l("];

/// Normalize a raw candidate token. Pure and total — any input yields a
/// string, most of which the validator will then reject.
pub fn correct(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let upper = stripped.to_uppercase();

    let substituted: String = upper
        .chars()
        .map(|c| {
            SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect();

    let mut corrected = substituted;
    for ligature in K_LIGATURES {
        corrected = corrected.replace(ligature, "K");
    }
    if let Some(rest) = corrected.strip_prefix("1<") {
        corrected = format!("K{rest}");
    }

    corrected
}
