//! Shop settings handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::auth::ApiKeyAuth;
use crate::config::ShopSettings;
use crate::error::ApiError;
use crate::state::AppState;

/// Read the current shop settings.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
) -> Result<Json<ShopSettings>, ApiError> {
    Ok(Json(state.settings_snapshot().await))
}

/// Replace the shop settings.
///
/// The document is validated and persisted before the in-memory copy is
/// swapped, so a crash mid-update never leaves the two out of step.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Json(body): Json<ShopSettings>,
) -> Result<Json<ShopSettings>, ApiError> {
    body.validate().map_err(ApiError::BadRequest)?;
    body.save(&state.config.settings_path)
        .await
        .map_err(|e| ApiError::Internal(format!("could not persist settings: {e}")))?;

    *state.settings.write().await = body.clone();

    tracing::info!("Shop settings updated");

    Ok(Json(body))
}
