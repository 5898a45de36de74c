use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imgsheet_core::error::CoreError;
use imgsheet_core::ingest::ArchiveError;
use imgsheet_core::results::PersistenceError;
use imgsheet_core::sheet::GenerationError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the core error types and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `imgsheet_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The upload is not a readable ZIP archive.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A result document could not be written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The spreadsheet could not be built.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A missing resource with a human-readable message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status, machine code and client-safe message for this error.
    ///
    /// Internal details are logged here and replaced by a generic message.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        const INTERNAL: &str = "An internal error occurred";

        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} not found: {id}"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL.to_string())
                }
            },
            AppError::Archive(ArchiveError::BadArchive(e)) => (
                StatusCode::BAD_REQUEST,
                "BAD_ARCHIVE",
                format!("Error processing archive: {e}"),
            ),
            AppError::Archive(ArchiveError::Io(e)) => {
                tracing::error!(error = %e, "Archive staging failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL.to_string())
            }
            AppError::Persistence(e) => {
                tracing::error!(error = %e, "Result persistence failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR", INTERNAL.to_string())
            }
            AppError::Generation(e) => {
                tracing::error!(error = %e, "Spreadsheet generation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_ERROR", e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

