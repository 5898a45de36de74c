use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use imgsheet_core::types::UrlDescriptor;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::{run_blocking, wants_json};
use crate::pages;
use crate::response::DataResponse;
use crate::state::AppState;

const NOT_FOUND_MESSAGE: &str = "Results not found or expired";

/// A saved batch as returned to the client.
#[derive(Debug, Serialize)]
pub struct ResultView {
    pub id: String,
    pub product_name: String,
    pub timestamp: String,
    pub image_data: Vec<UrlDescriptor>,
}

/// GET /admin/results/{id}
///
/// The batch page with export controls, or the batch as JSON when the
/// client sends `Accept: application/json`.
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let json = wants_json(&headers);
    let store = Arc::clone(&state.results);
    let lookup = id.clone();
    let record = run_blocking("load results", move || Ok(store.load(&lookup))).await?;

    let Some(record) = record else {
        if json {
            return Err(AppError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        }
        let page = pages::form_page(Some(NOT_FOUND_MESSAGE));
        return Ok((StatusCode::NOT_FOUND, Html(page)).into_response());
    };

    let view = ResultView {
        id,
        product_name: record.product_name,
        timestamp: record.timestamp,
        image_data: record.image_data,
    };
    if json {
        Ok(Json(DataResponse { data: view }).into_response())
    } else {
        Ok(Html(pages::results_page(&view)).into_response())
    }
}
