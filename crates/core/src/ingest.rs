//! ZIP archive ingestion.
//!
//! The caller stages the archive on disk. Entries are extracted one at a
//! time into a scoped scratch directory, handed to the [`FilePlacer`], and
//! their temporary copy is deleted straight away, so peak scratch usage is
//! one archive plus one entry. Per-entry failures are recorded and skipped.

use std::fs::File;
use std::io;
use std::path::{Component, Path};
use std::sync::Arc;

use serde::Serialize;

use crate::placement::{FilePlacer, Placement};
use crate::types::UrlDescriptor;

// ── Constants ─────────────────────────────────────────────────────────

/// Article used for entries that sit at the archive root.
pub const UNKNOWN_ARTICLE: &str = "unknown";

/// Base names skipped regardless of extension (compared case-insensitively).
pub const IGNORED_FILE_NAMES: &[&str] = &["thumbs.db", ".ds_store"];

/// Top-level folder macOS adds to archives it creates.
const MACOS_METADATA_DIR: &str = "__MACOSX";

// ── Types ─────────────────────────────────────────────────────────────

/// Archive-level failure. Per-entry problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not a valid ZIP archive: {0}")]
    BadArchive(#[from] zip::result::ZipError),

    #[error("failed to stage archive: {0}")]
    Io(#[from] io::Error),
}

/// An archive entry that produced no descriptor, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub entry: String,
    pub reason: String,
}

/// Everything one archive produced.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub placed: Vec<UrlDescriptor>,
    pub skipped: Vec<SkippedEntry>,
}

impl IngestReport {
    fn skip(&mut self, entry: impl Into<String>, reason: impl Into<String>) {
        let entry = entry.into();
        let reason = reason.into();
        tracing::debug!(entry = %entry, reason = %reason, "Skipping archive entry");
        self.skipped.push(SkippedEntry { entry, reason });
    }
}

// ── Ingestion ─────────────────────────────────────────────────────────

/// Walks ZIP archives and places their images.
#[derive(Debug, Clone)]
pub struct ArchiveIngestor {
    placer: Arc<FilePlacer>,
}

impl ArchiveIngestor {
    pub fn new(placer: Arc<FilePlacer>) -> Self {
        Self { placer }
    }

    /// Ingest an archive already on disk, grouping entries by their top-level
    /// folder and filing them under `catalog`.
    pub fn ingest_file(&self, archive_path: &Path, catalog: &str) -> Result<IngestReport, ArchiveError> {
        let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
        let scratch = tempfile::tempdir()?;
        let mut report = IngestReport::default();

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    report.skip(format!("#{index}"), format!("unreadable entry: {e}"));
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let raw_name = entry.name().to_string();
            let Some(enclosed) = entry.enclosed_name() else {
                report.skip(raw_name, "unsafe path");
                continue;
            };
            let parts: Vec<String> = enclosed
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            let Some(file_name) = parts.last() else {
                continue;
            };

            if parts.len() > 1 && parts[0] == MACOS_METADATA_DIR {
                continue;
            }
            if is_ignored_file(file_name) {
                report.skip(raw_name, "system file");
                continue;
            }
            if !self.placer.storage().is_allowed(file_name) {
                report.skip(raw_name, "extension not allowed");
                continue;
            }

            let article = if parts.len() > 1 {
                parts[0].as_str()
            } else {
                UNKNOWN_ARTICLE
            };

            let mut extracted = match tempfile::NamedTempFile::new_in(scratch.path()) {
                Ok(f) => f,
                Err(e) => {
                    report.skip(raw_name, format!("scratch file: {e}"));
                    continue;
                }
            };
            if let Err(e) = io::copy(&mut entry, &mut extracted) {
                report.skip(raw_name, format!("extraction failed: {e}"));
                continue;
            }
            drop(entry);

            match self.placer.place(extracted.path(), file_name, catalog, article) {
                Ok(Placement::Placed(descriptor)) => report.placed.push(descriptor),
                Ok(Placement::Skipped { reason, .. }) => report.skip(raw_name, reason),
                Err(e) => {
                    tracing::warn!(entry = %raw_name, error = %e, "Failed to place archive entry");
                    report.skip(raw_name, e.to_string());
                }
            }

            if let Err(e) = extracted.close() {
                tracing::warn!(error = %e, "Failed to remove extracted entry");
            }
        }

        tracing::info!(
            catalog = %catalog,
            placed = report.placed.len(),
            skipped = report.skipped.len(),
            "Archive ingested"
        );
        Ok(report)
    }
}

// ── Pure functions ────────────────────────────────────────────────────

/// `true` for OS metadata files such as `Thumbs.db` and `.DS_Store`.
pub fn is_ignored_file(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    IGNORED_FILE_NAMES.contains(&lower.as_str())
}

// ── Tests ─────────────────────────────────────────────────────────────
