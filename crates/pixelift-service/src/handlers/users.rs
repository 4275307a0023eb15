//! User resolution and account handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use pixelift_core::User;
use pixelift_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Local user id.
    pub id: String,
    /// Identity-provider subject id.
    pub subject: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub username: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub photo_url: String,
    /// Current credit balance.
    pub credit_balance: i64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            subject: user.subject.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            photo_url: user.photo_url.clone(),
            credit_balance: user.credit_balance,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Look up the local user record for an authenticated subject.
///
/// Used by every handler that needs the caller's record but must not create
/// one; callers hit `/v1/users/resolve` first.
pub(crate) fn require_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    state
        .store
        .get_user_by_subject(&auth.subject)?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

/// Resolve the authenticated subject to a local user, creating one on first
/// sight.
///
/// Resolution order: by subject id; then by the provider-reported email (a
/// record created through another channel gets the subject attached); then a
/// fresh record with the signup credit grant.
pub(crate) async fn resolve_or_create(state: &AppState, subject: &str) -> Result<User, ApiError> {
    if let Some(user) = state.store.get_user_by_subject(subject)? {
        return Ok(user);
    }

    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Identity provider not configured".into()))?;

    let profile = identity.get_profile(subject).await.map_err(|e| {
        tracing::warn!(subject = %subject, error = %e, "Identity profile fetch failed");
        ApiError::ExternalService("Failed to fetch identity profile".into())
    })?;

    let username = profile.display_name();
    let mut candidate = User::new(
        subject,
        profile.email.clone().unwrap_or_default(),
        username,
        profile.image_url.clone().unwrap_or_default(),
    );
    candidate.first_name = profile.first_name.clone();
    candidate.last_name = profile.last_name.clone();

    // The store either inserts the candidate, links an email-matched record
    // created through another channel, or returns the record a concurrent
    // resolve won with.
    let user = state.store.create_user_if_absent(&candidate)?;

    if user.id == candidate.id {
        tracing::info!(
            user_id = %user.id,
            subject = %subject,
            credit_balance = %user.credit_balance,
            "User created"
        );
    } else {
        tracing::info!(
            user_id = %user.id,
            subject = %subject,
            "Resolved subject to existing user"
        );
    }

    Ok(user)
}

/// Resolve or create the current user.
pub async fn resolve_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = resolve_or_create(&state, &auth.subject).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Get the current user's record.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&state, &auth)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Update profile request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name.
    pub username: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New avatar URL.
    pub photo_url: Option<String>,
}

/// Update the current user's profile fields.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = require_user(&state, &auth)?;

    if let Some(username) = body.username {
        user.username = username;
    }
    if let Some(first_name) = body.first_name {
        user.first_name = Some(first_name);
    }
    if let Some(last_name) = body.last_name {
        user.last_name = Some(last_name);
    }
    if let Some(photo_url) = body.photo_url {
        user.photo_url = photo_url;
    }
    user.updated_at = chrono::Utc::now();

    state.store.put_user(&user)?;

    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(Json(UserResponse::from(&user)))
}

/// Delete the current user's account.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &auth)?;
    state.store.delete_user(&user.id)?;

    tracing::info!(user_id = %user.id, "User deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
