//! Image record handlers and the credit-metered apply step.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use pixelift_core::{
    Image, ImageDetails, ImageId, TransformationConfig, TransformationKind, TRANSFORMATION_FEE,
};
use pixelift_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::users::require_user;

/// Image payload supplied on create and update.
#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    /// Title.
    pub title: String,
    /// Transformation kind (string form).
    pub transformation_type: String,
    /// CDN public id of the uploaded original.
    pub public_id: String,
    /// HTTPS delivery URL of the uploaded original.
    pub secure_url: String,
    /// Pixel width.
    pub width: Option<u32>,
    /// Pixel height.
    pub height: Option<u32>,
    /// Committed transformation configuration.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Client-derived transformation URL; used only when no media CDN is
    /// configured server-side.
    pub transformation_url: Option<String>,
    /// Selected aspect ratio key.
    pub aspect_ratio: Option<String>,
    /// Last prompt used.
    pub prompt: Option<String>,
    /// Last target color used.
    pub color: Option<String>,
}

/// Image response.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Record id.
    pub id: String,
    /// Owning user id.
    pub author: String,
    /// Transformation kind.
    pub transformation_type: String,
    /// Title.
    pub title: String,
    /// CDN public id.
    pub public_id: String,
    /// Original delivery URL.
    pub secure_url: String,
    /// Pixel width.
    pub width: Option<u32>,
    /// Pixel height.
    pub height: Option<u32>,
    /// Committed transformation configuration.
    pub config: serde_json::Value,
    /// Derived transformation URL.
    pub transformation_url: Option<String>,
    /// Aspect ratio key.
    pub aspect_ratio: Option<String>,
    /// Last prompt.
    pub prompt: Option<String>,
    /// Last color.
    pub color: Option<String>,
    /// Created timestamp.
    pub created_at: String,
    /// Updated timestamp.
    pub updated_at: String,
}

impl From<&Image> for ImageResponse {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id.to_string(),
            author: image.author.to_string(),
            transformation_type: image.transformation_type.to_string(),
            title: image.details.title.clone(),
            public_id: image.details.public_id.clone(),
            secure_url: image.details.secure_url.clone(),
            width: image.details.width,
            height: image.details.height,
            config: image.details.config.to_value(),
            transformation_url: image.details.transformation_url.clone(),
            aspect_ratio: image.details.aspect_ratio.clone(),
            prompt: image.details.prompt.clone(),
            color: image.details.color.clone(),
            created_at: image.created_at.to_rfc3339(),
            updated_at: image.updated_at.to_rfc3339(),
        }
    }
}

/// Turn a payload into stored details, deriving the transformation URL from
/// the committed configuration when a media CDN is configured.
fn details_from_payload(
    state: &AppState,
    payload: ImagePayload,
) -> Result<(TransformationKind, ImageDetails), ApiError> {
    let kind: TransformationKind = payload
        .transformation_type
        .parse()
        .map_err(|_| {
            ApiError::BadRequest(format!(
                "unknown transformation type: {}",
                payload.transformation_type
            ))
        })?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    if payload.public_id.is_empty() {
        return Err(ApiError::BadRequest("public_id must not be empty".into()));
    }

    let config = TransformationConfig::from_value(&payload.config);

    let transformation_url = state
        .media
        .as_ref()
        .map(|media| {
            media.transformation_url(&payload.public_id, &config, payload.width, payload.height)
        })
        .or(payload.transformation_url);

    Ok((
        kind,
        ImageDetails {
            title: payload.title,
            public_id: payload.public_id,
            secure_url: payload.secure_url,
            width: payload.width,
            height: payload.height,
            config,
            transformation_url,
            aspect_ratio: payload.aspect_ratio,
            prompt: payload.prompt,
            color: payload.color,
        },
    ))
}

/// Create an image record.
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<ImagePayload>,
) -> Result<Json<ImageResponse>, ApiError> {
    let user = require_user(&state, &auth)?;
    let (kind, details) = details_from_payload(&state, payload)?;

    let image = Image::new(user.id, kind, details);
    state.store.put_image(&image)?;

    tracing::info!(
        image_id = %image.id,
        user_id = %user.id,
        transformation_type = %kind,
        "Image record created"
    );

    Ok(Json(ImageResponse::from(&image)))
}

/// Get an image by id.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>, ApiError> {
    let image_id = parse_image_id(&id)?;
    let image = state
        .store
        .get_image(&image_id)?
        .ok_or_else(|| ApiError::NotFound("image not found".into()))?;

    Ok(Json(ImageResponse::from(&image)))
}

/// Update an image record. Only the owner may update; ownership is checked
/// against the stored author in the store, not trusted from the client.
pub async fn update_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ImagePayload>,
) -> Result<Json<ImageResponse>, ApiError> {
    let user = require_user(&state, &auth)?;
    let image_id = parse_image_id(&id)?;
    let (kind, details) = details_from_payload(&state, payload)?;

    let image = state.store.update_image(&image_id, &user.id, kind, details)?;

    tracing::info!(image_id = %image.id, user_id = %user.id, "Image record updated");

    Ok(Json(ImageResponse::from(&image)))
}

/// Delete an image record (owner only).
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &auth)?;
    let image_id = parse_image_id(&id)?;

    state.store.delete_image(&image_id, &user.id)?;

    tracing::info!(image_id = %image_id, user_id = %user.id, "Image record deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Image list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    /// Maximum number of images to return (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// List images response.
#[derive(Debug, Serialize)]
pub struct ListImagesResponse {
    /// Images (newest first).
    pub images: Vec<ImageResponse>,
    /// Whether there are more images.
    pub has_more: bool,
}

/// List all images, newest first (the gallery page).
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<ListImagesResponse>, ApiError> {
    let limit = query.limit.min(100);
    let images = state.store.list_images(limit + 1, query.offset)?;

    let has_more = images.len() > limit;
    let images: Vec<_> = images.iter().take(limit).map(ImageResponse::from).collect();

    Ok(Json(ListImagesResponse { images, has_more }))
}

/// List the current user's images, newest first.
pub async fn list_user_images(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<ListImagesResponse>, ApiError> {
    let user = require_user(&state, &auth)?;

    let limit = query.limit.min(100);
    let images = state
        .store
        .list_images_by_user(&user.id, limit + 1, query.offset)?;

    let has_more = images.len() > limit;
    let images: Vec<_> = images.iter().take(limit).map(ImageResponse::from).collect();

    Ok(Json(ListImagesResponse { images, has_more }))
}

/// Apply request: the staged configuration fragment to merge.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Staged fragment keyed by transformation kind.
    pub fragment: serde_json::Value,
}

/// Apply response.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    /// Committed configuration after the merge.
    pub config: serde_json::Value,
    /// Balance after the fee debit.
    pub credit_balance: i64,
    /// Derived preview URL for the merged configuration, when a media CDN is
    /// configured.
    pub preview_url: Option<String>,
}

/// Apply a staged transformation fragment to a saved image.
///
/// The fragment is deep-merged into the stored configuration (fragment leaves
/// win) and the per-application fee is debited in the same atomic store
/// operation; a failed debit leaves the stored configuration untouched.
pub async fn apply_transformation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, ApiError> {
    let user = require_user(&state, &auth)?;
    let image_id = parse_image_id(&id)?;

    let fragment = TransformationConfig::from_value(&body.fragment);
    if fragment.is_empty() {
        return Err(ApiError::BadRequest("no transformation staged".into()));
    }

    let image = state
        .store
        .get_image(&image_id)?
        .ok_or_else(|| ApiError::NotFound("image not found".into()))?;

    let merged = image.details.config.merged(&fragment);

    let balance =
        state
            .store
            .apply_transformation(&image_id, &user.id, &merged, TRANSFORMATION_FEE)?;

    tracing::info!(
        image_id = %image_id,
        user_id = %user.id,
        fee = %TRANSFORMATION_FEE,
        new_balance = %balance,
        "Transformation applied"
    );

    let preview_url = state.media.as_ref().map(|media| {
        media.transformation_url(
            &image.details.public_id,
            &merged,
            image.details.width,
            image.details.height,
        )
    });

    Ok(Json(ApplyResponse {
        config: merged.to_value(),
        credit_balance: balance,
        preview_url,
    }))
}

fn parse_image_id(id: &str) -> Result<ImageId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid image id: {id}")))
}
