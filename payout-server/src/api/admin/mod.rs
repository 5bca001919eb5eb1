//! Admin API handlers.
//!
//! These endpoints require the `Payout-Admin-Authorization` header with the
//! plaintext admin secret.
//!
//! # Endpoints
//!
//! - `POST /import` – bulk import blockchains, currencies and wallets

use axum::{Router, http::StatusCode, response::IntoResponse, routing::post};
use payout_core::import::ImportError;

use crate::state::AppState;

mod import;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/import", post(import::import))
}

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Import(ImportError),
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Import(e @ ImportError::NotAnObject) => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            AdminApiError::Import(e @ ImportError::Aborted { .. }) => {
                tracing::error!(error = %e, "Admin API import aborted");
                (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response()
            }
        }
    }
}
