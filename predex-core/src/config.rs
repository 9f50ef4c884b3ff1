use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_batch_size() -> usize {
    100
}

fn default_se_window_chars() -> usize {
    2000
}

fn default_sliding_window_words() -> usize {
    200
}

fn default_sliding_stride_words() -> usize {
    50
}

fn default_min_signal_phrases() -> usize {
    2
}

fn default_header_patterns() -> Vec<String> {
    vec![
        r"(?i)substantial\s+equivalence".to_string(),
        r"(?i)substantially\s+equivalent".to_string(),
        r"(?i)predicate\s+(?:device\s+)?comparison".to_string(),
        r"(?i)comparison\s+(?:to|with)\s+(?:the\s+)?predicate".to_string(),
        r"(?i)technological\s+characteristics".to_string(),
    ]
}

fn default_signal_phrases() -> Vec<String> {
    vec![
        "predicate device".to_string(),
        "substantial equivalence".to_string(),
        "substantially equivalent".to_string(),
        "subject device".to_string(),
        "cleared device".to_string(),
        "device comparison".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Score identifier occurrences by where they appear and reorder each
    /// role list by descending relevance. Off by default: scanner order.
    #[serde(default)]
    pub section_aware: bool,

    /// Documents per sequential batch — bounds peak memory, results are
    /// released to the coordinator between batches.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Worker threads per batch. 0 means one per logical CPU.
    #[serde(default)]
    pub workers: usize,

    /// Enable per-stage timing output
    #[serde(default)]
    pub profile: bool,

    #[serde(default)]
    pub section_detection: SectionDetectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDetectionConfig {
    /// Header phrases that open a substantial-equivalence window directly
    #[serde(default = "default_header_patterns")]
    pub header_patterns: Vec<String>,

    /// Window length (characters) opened at each header match
    #[serde(default = "default_se_window_chars")]
    pub se_window_chars: usize,

    /// Fallback sliding window length, in words
    #[serde(default = "default_sliding_window_words")]
    pub sliding_window_words: usize,

    /// Fallback sliding window stride, in words
    #[serde(default = "default_sliding_stride_words")]
    pub sliding_stride_words: usize,

    /// Signal phrases counted inside a fallback window
    #[serde(default = "default_signal_phrases")]
    pub signal_phrases: Vec<String>,

    /// Distinct signal-phrase hits required for a fallback window to qualify
    #[serde(default = "default_min_signal_phrases")]
    pub min_signal_phrases: usize,
}

impl Default for SectionDetectionConfig {
    fn default() -> Self {
        Self {
            header_patterns: default_header_patterns(),
            se_window_chars: default_se_window_chars(),
            sliding_window_words: default_sliding_window_words(),
            sliding_stride_words: default_sliding_stride_words(),
            signal_phrases: default_signal_phrases(),
            min_signal_phrases: default_min_signal_phrases(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            section_aware: false,
            batch_size: default_batch_size(),
            workers: 0,
            profile: false,
            section_detection: SectionDetectionConfig::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|_| {
                eprintln!("⚠️  Failed to load config from {}, using defaults", p);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
