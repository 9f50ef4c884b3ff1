//! Occurrence-location scoring for validated identifiers.
//!
//! Only consulted in section-aware mode; the default pipeline keeps
//! scanner order.

use crate::rules::section_detection::clamp_to_char_boundary;
use crate::types::SeWindow;
use anyhow::Result;
use regex::Regex;

/// Identifier appears inside a substantial-equivalence window
pub const SCORE_SE_SECTION: u8 = 40;

/// Identifier appears near testing/clinical discussion
pub const SCORE_TEST_CONTEXT: u8 = 25;

/// Identifier appears only in general prose
pub const SCORE_GENERAL: u8 = 10;

/// Characters inspected on each side of an occurrence for test-context
/// keywords
const CONTEXT_RADIUS: usize = 500;

pub struct RelevanceScorer {
    context_re: Regex,
}

impl RelevanceScorer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            context_re: Regex::new(
                r"(?i)testing|performance|clinical|biocompatibility|verification|validation|electrical\s+safety",
            )?,
        })
    }

    /// Score an identifier from the offsets of its occurrences. The SE
    /// rule wins over the context rule when both apply.
    pub fn score(&self, occurrences: &[usize], se_windows: &[SeWindow], text: &str) -> u8 {
        if occurrences
            .iter()
            .any(|offset| se_windows.iter().any(|w| w.contains(*offset)))
        {
            return SCORE_SE_SECTION;
        }

        for &offset in occurrences {
            let start = clamp_to_char_boundary(text, offset.saturating_sub(CONTEXT_RADIUS));
            let end = clamp_to_char_boundary(text, offset + CONTEXT_RADIUS);
            if self.context_re.is_match(&text[start..end]) {
                return SCORE_TEST_CONTEXT;
            }
        }

        SCORE_GENERAL
    }
}

/// Byte offsets of every occurrence of `needle` in `text`.
pub fn occurrences(text: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle).map(|(offset, _)| offset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::new().unwrap()
    }

    #[test]
    fn occurrence_inside_se_window_scores_highest() {
        let text = "... K123456 ...";
        let windows = [SeWindow { start: 0, end: text.len() }];
        let offsets = occurrences(text, "K123456");
        assert_eq!(scorer().score(&offsets, &windows, text), SCORE_SE_SECTION);
    }

    #[test]
    fn occurrence_near_testing_keyword_scores_context() {
        let text = "Biocompatibility data supported K123456 for this use.";
        let offsets = occurrences(text, "K123456");
        assert_eq!(scorer().score(&offsets, &[], text), SCORE_TEST_CONTEXT);
    }

    #[test]
    fn occurrence_in_plain_prose_scores_general() {
        let text = "The sponsor previously marketed K123456 in Europe.";
        let offsets = occurrences(text, "K123456");
        assert_eq!(scorer().score(&offsets, &[], text), SCORE_GENERAL);
    }

    #[test]
    fn se_window_wins_over_context_keywords() {
        let text = "clinical testing of K123456 inside the SE discussion";
        let windows = [SeWindow { start: 0, end: text.len() }];
        let offsets = occurrences(text, "K123456");
        assert_eq!(scorer().score(&offsets, &windows, text), SCORE_SE_SECTION);
    }

    #[test]
    fn keyword_outside_radius_does_not_count() {
        let mut text = "K123456.".to_string();
        text.push_str(&" filler".repeat(100)); // push the keyword > 500 chars away
        text.push_str(" clinical");
        let offsets = occurrences(&text, "K123456");
        assert_eq!(scorer().score(&offsets, &[], &text), SCORE_GENERAL);
    }

    #[test]
    fn occurrences_finds_every_position() {
        let text = "K111111 then K111111";
        assert_eq!(occurrences(text, "K111111"), vec![0, 13]);
        assert!(occurrences(text, "K222222").is_empty());
    }
}
