//! Corpus Manager - Auto-download and manage FDA premarket release files
//!
//! Downloads the 510(k) and PMA listing archives on first use if not
//! present. Stores the extracted pipe-delimited files in the user's data
//! directory for reuse across invocations.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// FDA premarket FTP area serving the release archives
const RELEASE_BASE_URL: &str = "https://www.accessdata.fda.gov/premarket/ftparea";

/// Release archives to fetch: each zip contains one pipe-delimited `.txt`
/// listing. The 510(k) history is split by decade; `pmn96cur` rolls
/// forward with current clearances.
const RELEASE_ARCHIVES: [&str; 5] = ["pmn7680", "pmn8185", "pmn8695", "pmn96cur", "pma"];

/// Manages the reference-file installation for the CLI
pub struct CorpusManager {
    /// Base directory for predex data (e.g. ~/.local/share/predex)
    data_dir: PathBuf,
}

impl CorpusManager {
    /// Create a new CorpusManager using the default data directory
    pub fn new() -> Result<Self> {
        let data_dir = Self::get_data_dir()?;
        Ok(Self { data_dir })
    }

    /// Get the data directory (~/.local/share/predex on all Unix platforms)
    fn get_data_dir() -> Result<PathBuf> {
        #[cfg(windows)]
        {
            // On Windows, use the standard local app data location
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
            Ok(base.join("predex"))
        }

        #[cfg(not(windows))]
        {
            // Use ~/.local/share/predex consistently on macOS/Linux.
            // This is more predictable than platform-specific paths like
            // ~/Library/Application Support
            let home =
                dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
            Ok(home.join(".local").join("share").join("predex"))
        }
    }

    /// Directory holding the extracted reference files
    pub fn reference_dir(&self) -> PathBuf {
        self.data_dir.join("reference")
    }

    /// Check if every expected listing file is already extracted
    pub fn is_installed(&self) -> bool {
        RELEASE_ARCHIVES
            .iter()
            .all(|name| self.reference_dir().join(format!("{name}.txt")).exists())
    }

    /// Ensure the reference files are available, downloading if necessary.
    /// Returns the directory to hand to `ReferenceCorpus::from_release_files`.
    pub fn ensure_reference_files(&self) -> Result<PathBuf> {
        let reference_dir = self.reference_dir();

        if self.is_installed() {
            println!("✅ Reference files found at: {}", reference_dir.display());
            return Ok(reference_dir);
        }

        println!("📦 Reference files not found, downloading FDA premarket listings...");
        fs::create_dir_all(&reference_dir).with_context(|| {
            format!(
                "Failed to create reference directory: {}",
                reference_dir.display()
            )
        })?;

        for name in RELEASE_ARCHIVES {
            let target = reference_dir.join(format!("{name}.txt"));
            if target.exists() {
                continue;
            }

            let url = Self::archive_url(name);
            println!("   URL: {url}");

            let temp_path = self.data_dir.join(format!("{name}.zip.tmp"));
            self.download_file(&url, &temp_path)?;
            self.extract_zip(&temp_path, &reference_dir)
                .with_context(|| format!("Failed to extract archive for {name}"))?;
            let _ = fs::remove_file(&temp_path);

            if !target.exists() {
                return Err(anyhow!(
                    "Archive {name}.zip did not contain the expected {name}.txt listing"
                ));
            }
        }

        println!(
            "✅ Reference files installed at: {}",
            reference_dir.display()
        );
        Ok(reference_dir)
    }

    /// Build the download URL for one release archive
    fn archive_url(name: &str) -> String {
        format!("{RELEASE_BASE_URL}/{name}.zip")
    }

    /// Download a file with progress indication
    fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        let response = ureq::get(url)
            .call()
            .with_context(|| format!("Failed to download from {url}"))?;

        let total_size = response
            .header("Content-Length")
            .and_then(|s| s.parse::<u64>().ok());

        let mut reader = response.into_reader();
        let mut file = File::create(dest)
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];
        let mut last_progress = 0;

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])?;
            downloaded += bytes_read as u64;

            // Print progress every 10%
            if let Some(total) = total_size {
                let progress = ((downloaded * 100) / total) as usize;
                if progress >= last_progress + 10 {
                    print!(
                        "\r   Downloading: {}% ({:.1} MB)",
                        progress,
                        downloaded as f64 / 1_000_000.0
                    );
                    io::stdout().flush()?;
                    last_progress = progress;
                }
            }
        }

        if total_size.is_some() {
            println!("\r   Downloading: 100%                    ");
        }

        Ok(())
    }

    /// Extract the listing `.txt` entries from a release archive
    fn extract_zip(&self, archive_path: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive_path)
            .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .with_context(|| "Failed to read zip archive")?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = match entry.enclosed_name().and_then(|p| {
                p.file_name().map(|n| n.to_string_lossy().to_lowercase())
            }) {
                Some(n) if n.ends_with(".txt") => n,
                _ => continue, // release zips occasionally carry readme cruft
            };

            let mut out = File::create(dest.join(&name))
                .with_context(|| format!("Failed to create listing file: {name}"))?;
            io::copy(&mut entry, &mut out)?;
        }

        Ok(())
    }
}
