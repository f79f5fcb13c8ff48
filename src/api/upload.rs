use axum::{
    Extension, Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::services::image::{ImageError, ImageKind, UserImage};

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub image_url: String,
    pub thumbnail_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// POST /api/upload/polish-image
///
/// Multipart body with an `image` file field and an optional `type`
/// text field (`bottle` or `swatch`, bottle by default).
pub async fn upload_polish_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedImage>>), ApiError> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut kind = ImageKind::Bottle;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("Invalid multipart body: {err}")))?
    {
        match field.name() {
            Some("image") => {
                check_image_content_type(field.content_type())?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::validation(format!("Failed to read image: {err}")))?;
                bytes = Some(data.to_vec());
            }
            Some("type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|err| ApiError::validation(format!("Invalid type field: {err}")))?;
                kind = match ImageKind::parse(&raw) {
                    Some(k @ (ImageKind::Bottle | ImageKind::Swatch)) => k,
                    _ => {
                        return Err(ApiError::validation(
                            "Image type must be 'bottle' or 'swatch'",
                        ));
                    }
                };
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::validation("No image file provided"))?;

    let stored = state
        .images()
        .store(bytes, user.id, kind)
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadedImage {
            image_url: stored.image_url,
            thumbnail_url: stored.thumbnail_url,
            kind: kind.as_str().to_string(),
        })),
    ))
}

/// POST /api/upload/nail-art
///
/// Single `image` file field, always stored as a nail-art photo.
pub async fn upload_nail_art(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedImage>>), ApiError> {
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("Invalid multipart body: {err}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        check_image_content_type(field.content_type())?;
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation(format!("Failed to read image: {err}")))?;
        bytes = Some(data.to_vec());
    }

    let bytes = bytes.ok_or_else(|| ApiError::validation("No image file provided"))?;

    let stored = state
        .images()
        .store(bytes, user.id, ImageKind::NailArt)
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadedImage {
            image_url: stored.image_url,
            thumbnail_url: stored.thumbnail_url,
            kind: ImageKind::NailArt.as_str().to_string(),
        })),
    ))
}

/// POST /api/upload/multiple
///
/// Up to the configured batch size of `images` file fields, plus an
/// optional `type` field applied to the whole batch (nail-art by
/// default).
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<UploadedImage>>>), ApiError> {
    let max_batch = state.config().read().await.uploads.max_batch_size;
    let mut batches: Vec<Vec<u8>> = Vec::new();
    let mut kind = ImageKind::NailArt;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("Invalid multipart body: {err}")))?
    {
        match field.name() {
            Some("images") => {
                check_image_content_type(field.content_type())?;

                if batches.len() >= max_batch {
                    return Err(ApiError::validation(format!(
                        "At most {max_batch} images per upload"
                    )));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::validation(format!("Failed to read image: {err}")))?;
                batches.push(data.to_vec());
            }
            Some("type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|err| ApiError::validation(format!("Invalid type field: {err}")))?;
                kind = ImageKind::parse(&raw).ok_or_else(|| {
                    ApiError::validation("Image type must be 'bottle', 'swatch' or 'nail-art'")
                })?;
            }
            _ => {}
        }
    }

    if batches.is_empty() {
        return Err(ApiError::validation("No image files provided"));
    }

    let stores = batches
        .into_iter()
        .map(|bytes| state.images().store(bytes, user.id, kind));
    let uploaded: Vec<UploadedImage> = futures::future::try_join_all(stores)
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?
        .into_iter()
        .map(|stored| UploadedImage {
            image_url: stored.image_url,
            thumbnail_url: stored.thumbnail_url,
            kind: kind.as_str().to_string(),
        })
        .collect();

    Ok((StatusCode::CREATED, Json(ApiResponse::success(uploaded))))
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub image_url: String,
}

/// DELETE /api/upload/image
///
/// The URL must point inside the calling user's upload directory.
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DeleteImageRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let prefix = format!("/uploads/users/{}/", user.id);
    if !payload.image_url.starts_with(&prefix) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this image".to_string(),
        ));
    }

    state
        .images()
        .delete(user.id, &payload.image_url)
        .await
        .map_err(|err| match err {
            ImageError::OutsideUserDir => ApiError::Forbidden(
                "Not authorized to delete this image".to_string(),
            ),
            other => ApiError::internal(other.to_string()),
        })?;

    Ok(Json(ApiResponse::message("Image deleted")))
}

#[derive(Debug, Deserialize)]
pub struct ListImagesParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/upload/images
pub async fn list_user_images(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ListImagesParams>,
) -> Result<Json<ApiResponse<Vec<UserImage>>>, ApiError> {
    let kind = match params.kind.as_deref() {
        Some(raw) => Some(ImageKind::parse(raw).ok_or_else(|| {
            ApiError::validation("Image type must be 'bottle', 'swatch' or 'nail-art'")
        })?),
        None => None,
    };

    let images = state
        .images()
        .list(user.id, kind)
        .await
        .map_err(|err| ApiError::internal(format!("Failed to list images: {err}")))?;

    Ok(Json(ApiResponse::success(images)))
}

fn check_image_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) if ct.starts_with("image/") => Ok(()),
        _ => Err(ApiError::validation("Only image files are accepted")),
    }
}
