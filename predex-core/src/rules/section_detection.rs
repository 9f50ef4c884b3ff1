//! Substantial-equivalence window detection.
//!
//! Two strategies, tried in order. The direct strategy matches SE header
//! phrases and opens a fixed-length window at each hit. Only when that
//! finds nothing does the fallback run: a sliding window over the whole
//! document that qualifies on signal-phrase density. Submissions with
//! clean headings never pay for the sliding scan.

use crate::config::SectionDetectionConfig;
use crate::types::SeWindow;
use anyhow::Result;
use regex::Regex;

pub struct SectionDetector {
    header_patterns: Vec<Regex>,
    word_re: Regex,
    signal_phrases: Vec<String>,
    se_window_chars: usize,
    sliding_window_words: usize,
    sliding_stride_words: usize,
    min_signal_phrases: usize,
}

impl SectionDetector {
    pub fn new(config: &SectionDetectionConfig) -> Result<Self> {
        let mut header_patterns = Vec::new();
        for pattern in &config.header_patterns {
            header_patterns.push(Regex::new(pattern)?);
        }
        Ok(Self {
            header_patterns,
            word_re: Regex::new(r"\S+")?,
            signal_phrases: config
                .signal_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            se_window_chars: config.se_window_chars,
            sliding_window_words: config.sliding_window_words.max(1),
            sliding_stride_words: config.sliding_stride_words.max(1),
            min_signal_phrases: config.min_signal_phrases,
        })
    }

    /// Locate text windows believed to contain substantial-equivalence
    /// discussion. Windows may overlap; no merging is performed.
    pub fn detect_se_windows(&self, text: &str) -> Vec<SeWindow> {
        let windows = self.header_windows(text);
        if !windows.is_empty() {
            return windows;
        }
        self.keyword_windows(text)
    }

    /// Direct strategy: each header-phrase match opens a window of up to
    /// `se_window_chars` characters.
    fn header_windows(&self, text: &str) -> Vec<SeWindow> {
        let mut windows = Vec::new();
        for pattern in &self.header_patterns {
            for m in pattern.find_iter(text) {
                windows.push(SeWindow {
                    start: m.start(),
                    end: clamp_to_char_boundary(text, m.start() + self.se_window_chars),
                });
            }
        }
        windows.sort_by_key(|w| w.start);
        windows
    }

    /// Fallback strategy: slide a word window across the document and keep
    /// every position where enough distinct signal phrases co-occur. The
    /// resulting offsets are approximate — word-aligned, not sentence-
    /// aligned — which is all the relevance scorer needs.
    fn keyword_windows(&self, text: &str) -> Vec<SeWindow> {
        let words: Vec<(usize, usize)> = self
            .word_re
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut index = 0;
        while index < words.len() {
            let end_index = (index + self.sliding_window_words).min(words.len());
            let start = words[index].0;
            let end = words[end_index - 1].1;
            let chunk = text[start..end].to_lowercase();

            let hits = self
                .signal_phrases
                .iter()
                .filter(|phrase| chunk.contains(phrase.as_str()))
                .count();
            if hits >= self.min_signal_phrases {
                windows.push(SeWindow { start, end });
            }

            if end_index == words.len() {
                break;
            }
            index += self.sliding_stride_words;
        }
        windows
    }
}

/// Walk an index back onto a char boundary so window arithmetic never
/// slices the middle of a multi-byte character.
pub(crate) fn clamp_to_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SectionDetector {
        SectionDetector::new(&SectionDetectionConfig::default()).unwrap()
    }

    #[test]
    fn header_match_opens_a_bounded_window() {
        let mut text = String::from("Intro text. SUBSTANTIAL EQUIVALENCE\n");
        text.push_str(&"predicate discussion ".repeat(200));

        let windows = detector().detect_se_windows(&text);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 12);
        assert_eq!(windows[0].end, windows[0].start + 2000);
    }

    #[test]
    fn header_window_is_clamped_to_document_end() {
        let text = "Comparison to the predicate device follows.";
        let windows = detector().detect_se_windows(text);
        assert_eq!(windows.len(), 1);
        assert!(windows[0].end <= text.len());
    }

    #[test]
    fn fallback_requires_multiple_signal_phrases() {
        // No header phrase anywhere, one signal phrase only — no window
        let sparse = "The subject device is described below. ".repeat(30);
        assert!(detector().detect_se_windows(&sparse).is_empty());

        // Two distinct signal phrases inside one window — qualifies
        let dense = format!(
            "{} The subject device resembles the cleared device in form. {}",
            "filler words here. ".repeat(20),
            "more filler. ".repeat(20)
        );
        let windows = detector().detect_se_windows(&dense);
        assert!(!windows.is_empty());
    }

    #[test]
    fn fallback_not_used_when_headers_exist() {
        let text = format!(
            "Substantial Equivalence summary. {}",
            "subject device predicate device ".repeat(100)
        );
        let windows = detector().detect_se_windows(&text);
        // Direct hits only — one header phrase, one window
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 0);
    }

    #[test]
    fn empty_text_yields_no_windows() {
        assert!(detector().detect_se_windows("").is_empty());
    }
}
