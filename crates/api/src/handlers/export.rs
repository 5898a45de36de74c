//! Spreadsheet and plain-text link downloads.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use imgsheet_core::sanitize::safe_folder_name;
use imgsheet_core::sheet::{Separator, SheetGenerator, TemplateKind, XLSX_CONTENT_TYPE};
use imgsheet_core::types::UrlDescriptor;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::run_blocking;
use crate::state::AppState;

/// RFC 5987 `attr-char` set for `filename*=` values.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Deserialize)]
pub struct DownloadXlsxRequest {
    #[serde(default)]
    pub image_data: Vec<UrlDescriptor>,
    pub template_name: Option<String>,
    pub separator: Option<String>,
}

/// POST /admin/download-xlsx
///
/// Render the posted descriptors with the chosen template and return the
/// workbook as an attachment.
pub async fn download_xlsx(
    State(state): State<AppState>,
    body: Result<Json<DownloadXlsxRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected spreadsheet request body");
        AppError::BadRequest("No data provided".to_string())
    })?;

    if request.image_data.is_empty() {
        return Err(AppError::BadRequest("No image data provided".to_string()));
    }
    let template_name = request
        .template_name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Template name is required for XLSX generation".to_string())
        })?;
    let kind = TemplateKind::parse(template_name)?;
    let separator = Separator::parse(request.separator.as_deref())?;

    let generator = SheetGenerator::for_template(kind, separator, &state.config.sheets);
    let records = request.image_data;
    let bytes = run_blocking("generate spreadsheet", move || {
        Ok(generator.generate(&records)?)
    })
    .await?;

    tracing::info!(template = kind.label(), bytes = bytes.len(), "Spreadsheet download");

    let download_name = format!("{}_images.xlsx", safe_folder_name(kind.label()));
    let disposition = format!(
        "attachment; filename=\"images.xlsx\"; filename*=UTF-8''{}",
        utf8_percent_encode(&download_name, ATTR_CHAR)
    );

    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// GET /admin/download-links?urls=a&urls=b
///
/// The given URLs as a newline-separated text file. Other keys are ignored.
pub async fn download_links(
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let urls: Vec<String> = pairs
        .into_iter()
        .filter(|(key, value)| key == "urls" && !value.trim().is_empty())
        .map(|(_, value)| value)
        .collect();
    if urls.is_empty() {
        return Err(AppError::BadRequest("No URLs provided".to_string()));
    }

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"image_links.txt\""),
        ],
        urls.join("\n"),
    ))
}
