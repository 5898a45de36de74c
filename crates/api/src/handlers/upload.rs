//! The upload form submission: a ZIP archive or a set of loose images.
//!
//! Both flows end in a saved result document and a redirect to it. Any
//! failure redirects back to the form with the message in `?error=`.

use std::path::Path;
use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect, Response};
use imgsheet_core::error::CoreError;
use imgsheet_core::placement::Placement;
use imgsheet_core::sanitize::safe_folder_name;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tempfile::{NamedTempFile, TempDir};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};
use crate::handlers::run_blocking;
use crate::state::AppState;

/// Template folder for images uploaded without an archive.
pub const GENERIC_TEMPLATE: &str = "generic";

/// An uploaded file spooled to the request's staging directory.
struct StagedFile {
    filename: String,
    file: NamedTempFile,
}

#[derive(Default)]
struct UploadForm {
    catalog: String,
    product_name: String,
    archive: Option<StagedFile>,
    images: Vec<StagedFile>,
}

/// POST /admin
pub async fn submit_upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    match process_upload(&state, multipart).await {
        Ok(result_id) => Redirect::to(&format!("/admin/results/{result_id}")).into_response(),
        Err(err) => {
            let (status, _, message) = err.classify();
            tracing::warn!(%status, error = %err, "Upload failed");
            let encoded = utf8_percent_encode(&message, NON_ALPHANUMERIC);
            Redirect::to(&format!("/admin?error={encoded}")).into_response()
        }
    }
}

async fn process_upload(state: &AppState, multipart: Multipart) -> AppResult<String> {
    let staging = tempfile::tempdir()
        .map_err(|e| AppError::InternalError(format!("Failed to create staging dir: {e}")))?;
    let mut form = read_form(multipart, staging.path()).await?;

    match form.archive.take() {
        Some(archive) => process_archive(state, archive, form.catalog, staging).await,
        None => process_images(state, form.product_name, form.images, staging).await,
    }
}

/// Read every field, spooling files to disk as they stream in.
///
/// Fields arrive in form order, so nothing is processed until all are read.
async fn read_form(mut multipart: Multipart, staging: &Path) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "catalog" => form.catalog = read_text(field).await?,
            "product_name" => form.product_name = read_text(field).await?,
            "archive" | "images" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    continue;
                }
                let file = spool(&mut field, staging).await?;
                let staged = StagedFile { filename, file };
                if name == "archive" {
                    form.archive = Some(staged);
                } else {
                    form.images.push(staged);
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(text.trim().to_string())
}

async fn spool(field: &mut Field<'_>, staging: &Path) -> AppResult<NamedTempFile> {
    let spooled = NamedTempFile::new_in(staging)
        .map_err(|e| AppError::InternalError(format!("Failed to create upload file: {e}")))?;
    let handle = spooled
        .as_file()
        .try_clone()
        .map_err(|e| AppError::InternalError(format!("Failed to open upload file: {e}")))?;
    let mut out = tokio::fs::File::from_std(handle);

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;
    }
    out.flush()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    Ok(spooled)
}

async fn process_archive(
    state: &AppState,
    archive: StagedFile,
    catalog: String,
    staging: TempDir,
) -> AppResult<String> {
    if !archive.filename.to_lowercase().ends_with(".zip") {
        return Err(AppError::BadRequest("File must be a ZIP archive".to_string()));
    }
    let catalog = if catalog.is_empty() {
        let stem = Path::new(&archive.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        safe_folder_name(&stem)
    } else {
        catalog
    };

    let ingestor = Arc::clone(&state.ingestor);
    let results = Arc::clone(&state.results);
    run_blocking("ingest archive", move || {
        let report = ingestor.ingest_file(archive.file.path(), &catalog)?;
        for skipped in &report.skipped {
            tracing::info!(entry = %skipped.entry, reason = %skipped.reason, "Archive entry skipped");
        }
        if report.placed.is_empty() {
            return Err(AppError::BadRequest(
                "No suitable images found in the archive".to_string(),
            ));
        }

        let result_id = results.save(&report.placed, &catalog)?;
        drop(staging);
        Ok(result_id)
    })
    .await
}

async fn process_images(
    state: &AppState,
    product_name: String,
    images: Vec<StagedFile>,
    staging: TempDir,
) -> AppResult<String> {
    if product_name.is_empty() {
        return Err(CoreError::Validation("product_name is required".to_string()).into());
    }

    let placer = Arc::clone(&state.placer);
    let results = Arc::clone(&state.results);
    run_blocking("place images", move || {
        let mut placed = Vec::new();
        for image in &images {
            match placer.place(image.file.path(), &image.filename, GENERIC_TEMPLATE, &product_name) {
                Ok(Placement::Placed(descriptor)) => placed.push(descriptor),
                Ok(Placement::Skipped { filename, reason }) => {
                    tracing::info!(file = %filename, reason = %reason, "Upload skipped");
                }
                Err(e) => {
                    tracing::warn!(file = %image.filename, error = %e, "Failed to place upload");
                }
            }
        }
        if placed.is_empty() {
            return Err(AppError::BadRequest(
                "No suitable images were uploaded".to_string(),
            ));
        }

        let result_id = results.save(&placed, &product_name)?;
        drop(staging);
        Ok(result_id)
    })
    .await
}
