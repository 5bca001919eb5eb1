use axum::{Json, extract::State};
use payout_sdk::objects::ImportReport;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /import`: create blockchains, currencies and wallets that do not
/// exist yet.
///
/// Always answers with the per-section report unless the store became
/// unreachable.
pub async fn import(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ImportReport>, AdminApiError> {
    let report = state
        .importer
        .import(payload)
        .await
        .map_err(AdminApiError::Import)?;
    Ok(Json(report))
}
