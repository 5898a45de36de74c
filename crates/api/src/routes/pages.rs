//! HTML pages.

use axum::routing::get;
use axum::Router;

use crate::pages;
use crate::state::AppState;

/// ```text
/// GET    /                -> landing
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(pages::landing))
}
