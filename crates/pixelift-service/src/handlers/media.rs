//! Signed upload parameter handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::media::UploadSignature;
use crate::state::AppState;

use super::users::require_user;

/// Issue signed upload parameters for the browser upload widget.
///
/// The browser uploads directly to the CDN; this endpoint only hands out
/// server-signed credentials so the API secret never leaves the server.
pub async fn upload_signature(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UploadSignature>, ApiError> {
    // Only resolved users may upload.
    require_user(&state, &auth)?;

    let media = state
        .media
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Media CDN not configured".into()))?;

    let timestamp = chrono::Utc::now().timestamp();
    Ok(Json(media.upload_signature(timestamp)))
}
