/// Domain-level error shared across the core modules.
///
/// Module-specific failures ([`crate::ingest::ArchiveError`],
/// [`crate::placement::PlacementError`], [`crate::results::PersistenceError`],
/// [`crate::sheet::GenerationError`]) live next to the code that raises them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
