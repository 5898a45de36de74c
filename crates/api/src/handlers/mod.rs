//! Request handlers for the upload tool.
//!
//! Core operations are synchronous filesystem work; handlers hand them to
//! [`run_blocking`] and map failures via [`AppError`].

pub mod archive;
pub mod export;
pub mod results;
pub mod upload;

use axum::http::header::ACCEPT;
use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};

/// `true` when the client asked for JSON rather than a page.
///
/// Views render HTML for browsers; API clients send
/// `Accept: application/json`.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|media| media.split(';').next().unwrap_or_default().trim() == "application/json")
}

/// Run blocking filesystem work off the async runtime.
pub async fn run_blocking<T, F>(task: &'static str, f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalError(format!("{task} task failed: {e}")))?
}
