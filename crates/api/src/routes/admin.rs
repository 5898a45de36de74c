//! Route definitions for the upload and export tool.
//!
//! Mounted at `/admin`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{archive, export, results, upload};
use crate::pages;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /                  -> upload_form       (HTML)
/// POST   /                  -> submit_upload     (multipart, 303 redirect)
/// GET    /results/{id}      -> get_results
/// POST   /download-xlsx     -> download_xlsx
/// GET    /download-links    -> download_links
/// GET    /archive           -> list_archive
/// POST   /delete-image      -> delete_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::upload_form).post(upload::submit_upload))
        .route("/results/{id}", get(results::get_results))
        .route("/download-xlsx", post(export::download_xlsx))
        .route("/download-links", get(export::download_links))
        .route("/archive", get(archive::list_archive))
        .route("/delete-image", post(archive::delete_image))
}
