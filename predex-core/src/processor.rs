use crate::cache::CachedText;
use crate::classifier::{partition_roles, DeviceClassifier};
use crate::config::ExtractionConfig;
use crate::corpus::ReferenceCorpus;
use crate::errors::ExtractError;
use crate::extractors::TextExtractor;
use crate::rules::{
    ocr, relevance, CandidateScanner, IdentifierValidator, RelevanceScorer, SectionDetector,
};
use crate::storage::{calculate_doc_hash, TextStorage};
use crate::types::{device_id_from_path, ExtractionRecord, Identifier};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn print_summary(&self, label: &str) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("📊 {label}");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = (duration.as_secs_f64() / total.as_secs_f64()) * 100.0;
            println!(
                "   {:.<35} {:.1}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("   {:.<35} {:.1}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

/// Per-document extraction pipeline. Built once per batch run and shared
/// read-only by every worker — all state (corpus, compiled regexes, cache
/// handle) is immutable after construction.
pub struct DocumentProcessor {
    extractor: Arc<dyn TextExtractor>,
    storage: Arc<dyn TextStorage>,
    corpus: Arc<ReferenceCorpus>,
    config: ExtractionConfig,
    scanner: CandidateScanner,
    validator: IdentifierValidator,
    detector: SectionDetector,
    scorer: RelevanceScorer,
    classifier: DeviceClassifier,
}

impl DocumentProcessor {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        storage: Arc<dyn TextStorage>,
        corpus: Arc<ReferenceCorpus>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        let detector = SectionDetector::new(&config.section_detection)?;
        Ok(Self {
            extractor,
            storage,
            corpus,
            config,
            scanner: CandidateScanner::new()?,
            validator: IdentifierValidator::new()?,
            detector,
            scorer: RelevanceScorer::new()?,
            classifier: DeviceClassifier::new(),
        })
    }

    /// Process one document from disk: cache-first text acquisition, then
    /// the text pipeline. Extraction failures surface as typed errors for
    /// the coordinator to isolate.
    pub fn process_document(&self, path: &Path) -> std::result::Result<ExtractionRecord, ExtractError> {
        let device_id = device_id_from_path(path);
        let text = self.load_text(path)?;
        Ok(self.process_text(&device_id, &text))
    }

    /// Cache-first text acquisition: content-hash lookup, then the
    /// external extractor, storing its output for the next run.
    fn load_text(&self, path: &Path) -> std::result::Result<String, ExtractError> {
        let doc_bytes = std::fs::read(path).map_err(|e| ExtractError::ExtractionFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let doc_hash = calculate_doc_hash(&doc_bytes);

        if let Ok(Some(cached)) = self.storage.get_text(&doc_hash) {
            return Ok(cached.text);
        }

        let text = self.extractor.extract_text(path)?;
        // A failed cache write costs a re-extraction next run, nothing more
        let cached = CachedText::new(text.clone(), self.extractor.name());
        if let Err(e) = self.storage.store_text(&doc_hash, &cached) {
            eprintln!("⚠️  Failed to cache extracted text for {}: {e}", path.display());
        }
        Ok(text)
    }

    /// The pure text pipeline: scan → correct+validate → dedup →
    /// (optional) relevance ordering → classify. No IO, no failure mode.
    pub fn process_text(&self, device_id: &str, text: &str) -> ExtractionRecord {
        let mut profiler = StepProfiler::new(self.config.profile);

        let scan = profiler.time_step("Candidate scan", || self.scanner.scan(text));

        let validated: Vec<Identifier> = profiler.time_step("Correct + validate", || {
            scan.candidates
                .iter()
                .filter_map(|candidate| {
                    let corrected = ocr::correct(&candidate.raw);
                    self.validator.validate(&corrected, &self.corpus)
                })
                .collect()
        });

        let mut identifiers = crate::rules::scanner::dedup_identifiers(validated, device_id);

        if self.config.section_aware {
            identifiers = profiler.time_step("Relevance ordering", || {
                self.order_by_relevance(identifiers, text)
            });
        }

        let product_code = self.corpus.product_code(device_id).map(str::to_string);
        let (predicates, reference_devices) = profiler.time_step("Classification", || {
            partition_roles(
                self.classifier
                    .classify(&identifiers, product_code.as_deref(), &self.corpus),
            )
        });

        profiler.print_summary(device_id);

        ExtractionRecord {
            device_id: device_id.to_string(),
            product_code,
            predicates,
            reference_devices,
            supplement_matches: dedup_strings(scan.supplements),
        }
    }

    /// Stable reorder by descending relevance score; ties keep scanner
    /// order.
    fn order_by_relevance(&self, identifiers: Vec<Identifier>, text: &str) -> Vec<Identifier> {
        let se_windows = self.detector.detect_se_windows(text);
        let mut scored: Vec<(Identifier, u8)> = identifiers
            .into_iter()
            .map(|identifier| {
                let offsets = relevance::occurrences(text, identifier.as_str());
                let score = self.scorer.score(&offsets, &se_windows, text);
                (identifier, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(identifier, _)| identifier).collect()
    }
}

fn dedup_strings(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
