use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Import from predex-core
use predex_core::table::{OutputTable, SupplementTable};
use predex_core::{
    device_id_from_path, BatchCoordinator, BatchOutcome, DeviceEnricher, ExtractError,
    ExtractionConfig, ExtractionRecord, FileStorage, Identifier, NoOpStorage, PlainTextExtractor,
    ReferenceCorpus, TextExtractor, TextStorage,
};

// Import CLI utilities
use predex::{CorpusManager, OpenFdaClient};

#[derive(Parser)]
#[command(name = "predex")]
#[command(about = "Extract and classify FDA predicate-device identifiers from OCR-scanned submission text")]
struct Args {
    /// Directory of OCR'd submission text files (one .txt per document,
    /// named after its device id, e.g. K241234.txt)
    #[arg(short, long)]
    input: PathBuf,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output table path
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Supplement table path
    #[arg(long, default_value = "supplement.csv")]
    supplement_output: PathBuf,

    /// Merge into the existing output table, skipping documents already in
    /// it, instead of rebuilding from scratch
    #[arg(long)]
    incremental: bool,

    /// Order each document's identifiers by relevance (SE-section hits
    /// first) instead of scanner order
    #[arg(long)]
    section_aware: bool,

    /// Documents per sequential batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Number of parallel workers per batch (default: one per CPU core)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Directory with pre-downloaded FDA release files
    /// If not specified, listings are auto-downloaded on first use
    #[arg(long)]
    corpus_dir: Option<PathBuf>,

    /// Directory for the extracted-text cache
    #[arg(long, default_value = "cache")]
    cache_dir: String,

    /// Skip the extracted-text cache and re-extract every document
    #[arg(long)]
    no_cache: bool,

    /// Enable detailed per-document stage timings
    #[arg(long)]
    profile: bool,

    /// Look up device metadata on openFDA after the batch completes
    #[arg(long)]
    enrich: bool,

    /// Enriched metadata output path (with --enrich)
    #[arg(long, default_value = "enriched.csv")]
    enriched_output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🧾 Predex Predicate Extractor");

    // Check if input directory exists
    if !args.input.is_dir() {
        println!("⚠️  Input directory not found at: {}", args.input.display());
        println!("   Please check the path.");
        return Ok(());
    }

    // Load config using the functional fallback pattern
    let mut config = ExtractionConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    // Apply CLI overrides to config
    if args.section_aware {
        config.section_aware = true;
    }
    if args.profile {
        config.profile = true;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let corpus = Arc::new(load_corpus(&args)?);

    let mut documents = collect_documents(&args.input)?;
    println!(
        "📄 Found {} documents in {}",
        documents.len(),
        args.input.display()
    );

    // Incremental mode: recover prior state, then drop documents that are
    // already in the table (the "already processed" filter)
    let existing_table = if args.incremental {
        read_existing_table(&args.output)
    } else {
        None
    };
    let existing_supplements = if args.incremental {
        read_existing_supplements(&args.supplement_output)
    } else {
        None
    };

    if let Some(existing) = &existing_table {
        let processed = existing.device_ids();
        let before = documents.len();
        documents.retain(|path| !processed.contains(&device_id_from_path(path)));
        if before > documents.len() {
            println!(
                "⏭️  Skipping {} already-processed documents",
                before - documents.len()
            );
        }
    }

    let storage: Arc<dyn TextStorage> = if args.no_cache {
        Arc::new(NoOpStorage::new())
    } else {
        Arc::new(FileStorage::new(&args.cache_dir)?)
    };
    let coordinator = BatchCoordinator::new(
        Arc::new(PlainTextExtractor::new()),
        storage,
        Arc::clone(&corpus),
        config,
    )?;

    // Run the batch with a progress bar
    let started = std::time::Instant::now();
    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("template is compile-time constant")
            .progress_chars("█▓▒░  "),
    );

    let outcome = coordinator.run_with_progress(&documents, |_| progress.inc(1))?;
    progress.finish_and_clear();

    // Merge into prior state and rewrite both tables atomically
    let table = OutputTable::merge(existing_table, OutputTable::from_records(&outcome.records));
    table.write_csv(&args.output)?;
    println!(
        "💾 Output table saved to: {} ({} rows, {} predicate + {} reference columns)",
        args.output.display(),
        table.len(),
        table.pred_width(),
        table.ref_width()
    );

    let supplements = SupplementTable::merge(
        existing_supplements,
        SupplementTable::from_records(&outcome.records),
    );
    supplements.write_csv(&args.supplement_output)?;
    println!(
        "💾 Supplement table saved to: {} ({} rows)",
        args.supplement_output.display(),
        supplements.rows().len()
    );

    print_summary(&outcome, started.elapsed());

    if args.enrich {
        run_enrichment(&outcome.records, &args.enriched_output)?;
    }

    Ok(())
}

/// Build the reference corpus: from a user-supplied directory of release
/// files, or from the auto-downloaded installation.
fn load_corpus(args: &Args) -> Result<ReferenceCorpus> {
    let reference_dir = match &args.corpus_dir {
        Some(dir) => {
            println!("🔧 Using reference files from: {}", dir.display());
            dir.clone()
        }
        None => {
            let manager = CorpusManager::new()?;
            manager.ensure_reference_files()?
        }
    };
    ReferenceCorpus::from_release_files(&reference_dir)
}

/// Collect supported documents from the input directory, sorted by path so
/// batch order (and therefore output order) is stable across runs.
fn collect_documents(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let extractor = PlainTextExtractor::new();
    let mut documents: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read input directory: {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && extractor.supports_file_type(path))
        .collect();
    documents.sort();

    if documents.is_empty() {
        anyhow::bail!(
            "No supported documents found in {} (expected .txt files)",
            input_dir.display()
        );
    }
    Ok(documents)
}

/// Read the existing output table for incremental mode. A table whose
/// header cannot be parsed falls back to a full rebuild — loudly, since
/// the old rows will be replaced.
fn read_existing_table(path: &Path) -> Option<OutputTable> {
    if !path.exists() {
        return None;
    }
    match OutputTable::read_csv(path) {
        Ok(table) => {
            println!("🔁 Incremental mode: merging into {} existing rows", table.len());
            Some(table)
        }
        Err(ExtractError::MergeSchemaMismatch(reason)) => {
            eprintln!("⚠️  Existing output table cannot be merged: {reason}");
            eprintln!("    Falling back to a full rebuild — prior rows will be replaced.");
            None
        }
        Err(e) => {
            eprintln!("⚠️  Failed to read existing output table ({e}), rebuilding from scratch");
            None
        }
    }
}

fn read_existing_supplements(path: &Path) -> Option<SupplementTable> {
    if !path.exists() {
        return None;
    }
    match SupplementTable::read_csv(path) {
        Ok(table) => Some(table),
        Err(e) => {
            eprintln!("⚠️  Failed to read existing supplement table ({e}), rebuilding from scratch");
            None
        }
    }
}

fn print_summary(outcome: &BatchOutcome, elapsed: std::time::Duration) {
    let with_identifiers = outcome
        .records
        .iter()
        .filter(|record| !record.is_empty())
        .count();
    println!(
        "✅ Processed {} documents in {:.1}s — {} with identifiers, {} extraction failures",
        outcome.records.len(),
        elapsed.as_secs_f64(),
        with_identifiers,
        outcome.failures.len()
    );
    println!("🕒 Completed at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    for failure in &outcome.failures {
        println!("   ⚠️  {}: {}", failure.path.display(), failure.reason);
    }
}

/// Post-batch enrichment: one openFDA lookup per distinct identifier seen
/// across the whole run, written as its own table.
fn run_enrichment(records: &[ExtractionRecord], output_path: &Path) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    let mut identifiers: Vec<Identifier> = Vec::new();
    for record in records {
        for identifier in record.predicates.iter().chain(&record.reference_devices) {
            if seen.insert(identifier.as_str().to_string()) {
                identifiers.push(identifier.clone());
            }
        }
    }

    if identifiers.is_empty() {
        println!("⏭️  No identifiers to enrich");
        return Ok(());
    }

    println!("🌐 Enriching {} identifiers via openFDA...", identifiers.len());
    let client = OpenFdaClient::new();
    let enriched = client.enrich(&identifiers)?;

    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record([
        "Number",
        "Device Name",
        "Applicant",
        "Decision Date",
        "Product Code",
    ])?;
    for identifier in &identifiers {
        let metadata = enriched.get(identifier).cloned().unwrap_or_default();
        writer.write_record([
            identifier.as_str(),
            metadata.device_name.as_deref().unwrap_or(""),
            metadata.applicant.as_deref().unwrap_or(""),
            metadata.decision_date.as_deref().unwrap_or(""),
            metadata.product_code.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    println!(
        "💾 Enriched metadata saved to: {} ({} of {} found)",
        output_path.display(),
        enriched.len(),
        identifiers.len()
    );
    Ok(())
}
