//! Plain configuration values handed to each component at construction.
//!
//! Nothing here reads the environment; the API crate builds these from
//! `ServerConfig::from_env`.

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in URL path segments: ASCII alphanumerics and
/// `-_.~`. Everything else (including `/`) is percent-encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default raster extensions accepted for upload.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Where files are written and how their public URLs are spelled.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of the `<template>/<article>/<file>` tree.
    pub upload_root: PathBuf,
    /// Directory holding `results_<id>.json` documents.
    pub results_root: PathBuf,
    /// Public base URL; images are served under `{base_url}/images/...`.
    pub base_url: String,
    /// Lowercase extensions without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("uploads"),
            results_root: PathBuf::from("results"),
            base_url: "http://localhost".to_string(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl StorageConfig {
    /// Returns `true` if `filename` has an allowed extension (case-insensitive).
    pub fn is_allowed(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|a| *a == ext)
            }
            None => false,
        }
    }

    /// Prefix every image URL starts with: `{base_url}/images/`.
    pub fn images_prefix(&self) -> String {
        format!("{}/images/", self.base_url.trim_end_matches('/'))
    }

    /// Public URL of `uploads/<template_folder>/<article_folder>/<filename>`.
    pub fn image_url(&self, template_folder: &str, article_folder: &str, filename: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.images_prefix(),
            utf8_percent_encode(template_folder, SEGMENT),
            utf8_percent_encode(article_folder, SEGMENT),
            utf8_percent_encode(filename, SEGMENT),
        )
    }

    /// On-disk directory for one template/article pair.
    pub fn article_dir(&self, template_folder: &str, article_folder: &str) -> PathBuf {
        self.upload_root.join(template_folder).join(article_folder)
    }
}

/// Thumbnail geometry and encoding.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Longest edge of the bounding box, in pixels.
    pub max_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: 90,
            quality: 85,
        }
    }
}

/// Spreadsheet export settings.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// Number of `Link N` columns in the one-link-per-column layout.
    pub link_columns: usize,
    /// Optional on-disk template for the one-link-per-column layout.
    pub row_template: Option<PathBuf>,
    /// Optional on-disk template for the delimited-cell layout.
    pub cell_template: Option<PathBuf>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            link_columns: 10,
            row_template: None,
            cell_template: None,
        }
    }
}

/// Extension of the last path component, without the dot.
///
/// Dotfiles such as `.png` have no extension.
pub(crate) fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extensions_are_case_insensitive() {
        let cfg = StorageConfig::default();
        assert!(cfg.is_allowed("photo.PNG"));
        assert!(cfg.is_allowed("photo.jpeg"));
        assert!(!cfg.is_allowed("notes.txt"));
        assert!(!cfg.is_allowed("no_extension"));
        assert!(!cfg.is_allowed(".png"));
    }

    #[test]
    fn image_url_escapes_each_segment() {
        let cfg = StorageConfig {
            base_url: "http://cdn.local/".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(
            cfg.image_url("generic", "Red Shoe", "a b_1f2e3d.jpg"),
            "http://cdn.local/images/generic/Red%20Shoe/a%20b_1f2e3d.jpg"
        );
        assert_eq!(
            cfg.image_url("t", "a/b", "x.png"),
            "http://cdn.local/images/t/a%2Fb/x.png"
        );
    }

    #[test]
    fn image_url_escapes_non_ascii() {
        let cfg = StorageConfig::default();
        let url = cfg.image_url("В-строку", "A1", "f.png");
        assert!(url.starts_with("http://localhost/images/%D0%92-"));
    }
}
