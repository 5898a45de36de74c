//! Image ingestion and spreadsheet export, free of HTTP concerns.
//!
//! - [`sanitize`]: user labels to filesystem-safe folder names.
//! - [`placement::FilePlacer`]: copies one image into the upload tree and
//!   builds its public URLs, with a thumbnail from [`thumbnail`].
//! - [`ingest::ArchiveIngestor`]: walks a ZIP archive entry by entry.
//! - [`results::ResultStore`]: one JSON document per processed batch.
//! - [`sheet::SheetGenerator`]: renders descriptors as `.xlsx`.
//! - [`catalog`]: lists and deletes stored images.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod placement;
pub mod results;
pub mod sanitize;
pub mod sheet;
pub mod thumbnail;
pub mod types;

pub use config::{SheetConfig, StorageConfig, ThumbnailConfig};
pub use error::CoreError;
pub use types::{StoredImage, UrlDescriptor};
