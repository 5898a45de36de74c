//! Records shared between the ingestion, persistence and export layers.

use serde::{Deserialize, Serialize};

/// Public location of one stored image and its thumbnail.
///
/// Produced by [`crate::placement::FilePlacer`], collected into lists, saved
/// by [`crate::results::ResultStore`] and consumed by the spreadsheet
/// generator. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlDescriptor {
    /// URL of the stored original.
    pub url: String,
    /// Grouping key, as the user or the archive folder spelled it.
    pub article: String,
    /// Unique file name on disk (original stem plus random suffix).
    pub filename: String,
    /// URL of the thumbnail, or of the original when no thumbnail exists.
    pub thumbnail_url: String,
}

/// One original image found while walking the upload tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    /// Article folder name (sanitized form).
    pub article: String,
    pub filename: String,
    /// Template folder name (sanitized form).
    pub template: String,
    pub thumbnail_url: String,
}
