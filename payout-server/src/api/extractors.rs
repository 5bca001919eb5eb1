//! Custom Axum extractors for request authentication.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Header carrying the plaintext admin secret.
pub const ADMIN_AUTH_HEADER: &str = "Payout-Admin-Authorization";

/// Proof that the request carried the admin secret.
///
/// The header value is verified with argon2 against the configured hash.
pub struct AdminAuth;

/// Errors returned by the [`AdminAuth`] extractor.
#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing Payout-Admin-Authorization header")]
    MissingHeader,
    #[error("invalid Payout-Admin-Authorization header")]
    InvalidHeader,
    #[error("admin secret verification failed")]
    VerificationFailed,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminAuthError::MissingHeader | AdminAuthError::VerificationFailed => {
                StatusCode::UNAUTHORIZED
            }
            AdminAuthError::InvalidHeader => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?;

        let admin = state.config.admin.read().await;
        if admin.verify_secret(secret) {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected admin request with wrong secret");
            Err(AdminAuthError::VerificationFailed)
        }
    }
}
