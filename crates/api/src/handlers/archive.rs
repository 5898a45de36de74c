//! Browsing and deleting stored images.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use imgsheet_core::catalog;
use imgsheet_core::types::StoredImage;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::{run_blocking, wants_json};
use crate::pages;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /admin/archive
///
/// Every stored original, sorted by template, article and file name. HTML
/// unless the client asks for JSON.
pub async fn list_archive(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let storage = state.config.storage.clone();
    let images: Vec<StoredImage> = run_blocking("list archive", move || {
        catalog::list_stored_images(&storage)
            .map_err(|e| AppError::InternalError(format!("Failed to read upload tree: {e}")))
    })
    .await?;

    if wants_json(&headers) {
        Ok(Json(DataResponse { data: images }).into_response())
    } else {
        Ok(Html(pages::archive_page(&images)).into_response())
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteImageResponse {
    pub success: bool,
    pub removed_files: usize,
}

/// POST /admin/delete-image
///
/// Remove an image, its thumbnails and any folders left empty.
pub async fn delete_image(
    State(state): State<AppState>,
    body: Result<Json<DeleteImageRequest>, JsonRejection>,
) -> AppResult<Json<DeleteImageResponse>> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let image_url = request.image_url.trim().to_string();
    if image_url.is_empty() {
        return Err(AppError::BadRequest("image_url is required".to_string()));
    }

    let storage = state.config.storage.clone();
    let removed_files = run_blocking("delete image", move || {
        Ok(catalog::delete_image(&storage, &image_url)?)
    })
    .await?;

    Ok(Json(DeleteImageResponse {
        success: true,
        removed_files,
    }))
}
