//! Batch coordination: fan a document list out across a worker pool
//! sharing the read-only corpus, and reassemble results in input order.
//!
//! Parallelism is worker-pool based, not shared-mutable: the corpus, the
//! text cache handle, and the compiled pipeline are distributed once as
//! `Arc` references at construction — never per task, never as global
//! state. Workers do not communicate; the only contention point is the
//! pool's own scheduler.

use crate::config::ExtractionConfig;
use crate::corpus::ReferenceCorpus;
use crate::extractors::TextExtractor;
use crate::processor::DocumentProcessor;
use crate::storage::TextStorage;
use crate::types::{device_id_from_path, ExtractionRecord};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A document whose text extraction failed. Recorded alongside the batch
/// output; the document still contributes an empty record so the output
/// table stays aligned with the input list.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One record per input document, in input order
    pub records: Vec<ExtractionRecord>,
    pub failures: Vec<DocumentFailure>,
}

pub struct BatchCoordinator {
    processor: DocumentProcessor,
    batch_size: usize,
    workers: usize,
}

impl BatchCoordinator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        storage: Arc<dyn TextStorage>,
        corpus: Arc<ReferenceCorpus>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        corpus.ensure_available()?;
        let batch_size = config.batch_size.max(1);
        let workers = config.workers;
        let processor = DocumentProcessor::new(extractor, storage, corpus, config)?;
        Ok(Self {
            processor,
            batch_size,
            workers,
        })
    }

    /// Process all documents in sequential batches of `batch_size`,
    /// dispatching one task per document to a fixed-size worker pool
    /// within each batch.
    pub fn run(&self, documents: &[PathBuf]) -> Result<BatchOutcome> {
        self.run_with_progress(documents, |_| {})
    }

    /// Like [`run`](Self::run), ticking `on_document` once per completed
    /// document (from worker threads) so callers can drive a progress bar
    /// without this crate depending on one.
    pub fn run_with_progress<F>(&self, documents: &[PathBuf], on_document: F) -> Result<BatchOutcome>
    where
        F: Fn(&Path) + Send + Sync,
    {
        // A dedicated pool rather than the global one: batch runs embed in
        // hosts that already use rayon, and worker count is per-run config
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .context("Failed to build worker pool")?;

        let mut outcome = BatchOutcome::default();

        for batch in documents.chunks(self.batch_size) {
            // Task index travels with each unit of work so results can be
            // resequenced into input order regardless of completion order
            let mut results: Vec<(usize, ExtractionRecord, Option<DocumentFailure>)> = pool
                .install(|| {
                    batch
                        .par_iter()
                        .enumerate()
                        .map(|(index, path)| {
                            let (record, failure) = self.process_one(path);
                            on_document(path);
                            (index, record, failure)
                        })
                        .collect()
                });
            results.sort_by_key(|(index, _, _)| *index);

            for (_, record, failure) in results {
                outcome.records.push(record);
                if let Some(failure) = failure {
                    outcome.failures.push(failure);
                }
            }
            // Batch results are handed back before the next batch starts,
            // bounding peak memory to one batch of documents
        }

        Ok(outcome)
    }

    /// Failure isolation boundary: an extraction error becomes an empty
    /// record plus a failure entry, never a batch abort.
    fn process_one(&self, path: &Path) -> (ExtractionRecord, Option<DocumentFailure>) {
        match self.processor.process_document(path) {
            Ok(record) => (record, None),
            Err(e) => {
                eprintln!("⚠️  {e}");
                let failure = DocumentFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                };
                (ExtractionRecord::empty(&device_id_from_path(path)), Some(failure))
            }
        }
    }
}
