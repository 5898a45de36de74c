use std::sync::Arc;

use imgsheet_core::ingest::ArchiveIngestor;
use imgsheet_core::placement::FilePlacer;
use imgsheet_core::results::ResultStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every component is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Places single uploaded images.
    pub placer: Arc<FilePlacer>,
    /// Places images out of uploaded archives.
    pub ingestor: Arc<ArchiveIngestor>,
    /// Saved batches, keyed by result id.
    pub results: Arc<ResultStore>,
}

impl AppState {
    /// Wire every component from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let placer = Arc::new(FilePlacer::new(
            config.storage.clone(),
            config.thumbnails.clone(),
        ));
        let ingestor = Arc::new(ArchiveIngestor::new(Arc::clone(&placer)));
        let results = Arc::new(ResultStore::new(config.storage.results_root.clone()));

        Self {
            config: Arc::new(config),
            placer,
            ingestor,
            results,
        }
    }
}
