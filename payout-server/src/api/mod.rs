//! HTTP API, mounted under `/api/v1`.

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod extractors;

/// Build the versioned API router.
pub fn router() -> Router<AppState> {
    Router::new().nest("/admin", admin::router())
}
