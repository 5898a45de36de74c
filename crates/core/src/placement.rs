//! File placer: moves one image into the upload tree.
//!
//! Layout: `<upload_root>/<template_folder>/<article_folder>/<stem>_<hex6>.<ext>`
//! with an optional `<stem>_<hex6>_thumb.jpg` sibling.

use std::fs::{self, File};
use std::path::Path;

use rand::Rng;

use crate::config::{StorageConfig, ThumbnailConfig};
use crate::sanitize::safe_folder_name;
use crate::thumbnail::create_thumbnail;
use crate::types::UrlDescriptor;

// ── Constants ─────────────────────────────────────────────────────────

/// Number of hex characters appended to every stored file name.
pub const SUFFIX_LEN: usize = 6;

// ── Types ─────────────────────────────────────────────────────────────

/// Failure to place a single file. The batch logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to copy {file}: {source}")]
    Copy {
        file: String,
        source: std::io::Error,
    },
}

/// Outcome of placing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Placed(UrlDescriptor),
    /// The extension is not on the allow-list; nothing was written.
    Skipped { filename: String, reason: String },
}

/// Copies files into the upload tree and builds their public URLs.
#[derive(Debug, Clone)]
pub struct FilePlacer {
    storage: StorageConfig,
    thumbnails: ThumbnailConfig,
}

impl FilePlacer {
    pub fn new(storage: StorageConfig, thumbnails: ThumbnailConfig) -> Self {
        Self { storage, thumbnails }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Place `source` (whose user-facing name is `original_filename`) under
    /// the folders derived from `template_label` and `article_label`.
    ///
    /// The descriptor's `article` keeps the unsanitized label. When no
    /// thumbnail can be produced, `thumbnail_url` points at the original.
    pub fn place(
        &self,
        source: &Path,
        original_filename: &str,
        template_label: &str,
        article_label: &str,
    ) -> Result<Placement, PlacementError> {
        let base_name = base_name(original_filename);
        if !self.storage.is_allowed(base_name) {
            return Ok(Placement::Skipped {
                filename: base_name.to_string(),
                reason: "extension not allowed".to_string(),
            });
        }

        let template_folder = safe_folder_name(template_label);
        let article_folder = safe_folder_name(article_label);
        let dir = self.storage.article_dir(&template_folder, &article_folder);
        fs::create_dir_all(&dir).map_err(|source| PlacementError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;

        let (stem, ext) = split_name(base_name);
        let suffix = random_suffix();
        let unique_filename = format!("{stem}_{suffix}.{ext}");
        let destination = dir.join(&unique_filename);

        copy_preserving_mtime(source, &destination).map_err(|source| PlacementError::Copy {
            file: base_name.to_string(),
            source,
        })?;

        let thumb_target = dir.join(format!("{stem}_{suffix}_thumb.jpg"));
        let thumb_filename = create_thumbnail(&destination, &thumb_target, &self.thumbnails)
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| unique_filename.clone());

        tracing::debug!(
            file = %unique_filename,
            template = %template_folder,
            article = %article_folder,
            "Placed image"
        );

        Ok(Placement::Placed(UrlDescriptor {
            url: self
                .storage
                .image_url(&template_folder, &article_folder, &unique_filename),
            article: article_label.to_string(),
            filename: unique_filename,
            thumbnail_url: self
                .storage
                .image_url(&template_folder, &article_folder, &thumb_filename),
        }))
    }
}

// ── Private helpers ───────────────────────────────────────────────────

/// Last component of a client-supplied name, tolerating both separators.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Split into (stem, extension). Only called for names that passed the
/// extension check, so dotfiles such as `.png` never reach it.
fn split_name(filename: &str) -> (&str, &str) {
    filename.rsplit_once('.').unwrap_or((filename, ""))
}

fn random_suffix() -> String {
    let value: u32 = rand::rng().random_range(0..(1 << (4 * SUFFIX_LEN)));
    format!("{value:0width$x}", width = SUFFIX_LEN)
}

/// Copy bytes and permissions, then carry the modification time over.
///
/// The timestamp is best-effort; only the copy itself can fail.
fn copy_preserving_mtime(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::copy(source, destination)?;
    let carried = fs::metadata(source)
        .and_then(|m| m.modified())
        .and_then(|modified| {
            File::options()
                .write(true)
                .open(destination)?
                .set_modified(modified)
        });
    if let Err(e) = carried {
        tracing::debug!(file = %destination.display(), error = %e, "Could not preserve mtime");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────
