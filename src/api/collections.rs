use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_color_hex, validate_name, validate_notes};
use super::{ApiError, ApiResponse, AppState, CollectionDetailDto};
use crate::db::{CollectionRow, CollectionUpdate};
use crate::entities::custom_collections;

/// GET /api/collections
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<CollectionRow>>>, ApiError> {
    let collections = state.store().list_collections(user.id).await?;
    Ok(Json(ApiResponse::success(collections)))
}

/// GET /api/collections/{id}
///
/// The collection plus its member polishes, newest additions first.
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CollectionDetailDto>>, ApiError> {
    let collection = state
        .store()
        .get_collection(user.id, id)
        .await?
        .ok_or_else(ApiError::collection_not_found)?;

    let polishes = state.store().collection_members(collection.id).await?;

    Ok(Json(ApiResponse::success(CollectionDetailDto::new(
        collection, polishes,
    ))))
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// POST /api/collections
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<custom_collections::Model>>), ApiError> {
    validate_name(&payload.name)?;
    if let Some(description) = &payload.description {
        validate_notes(description)?;
    }
    if let Some(color) = &payload.color {
        validate_color_hex(color)?;
    }

    let collection = state
        .store()
        .create_collection(user.id, payload.name, payload.description, payload.color)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(collection)),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// PUT /api/collections/{id}
pub async fn update_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCollectionRequest>,
) -> Result<Json<ApiResponse<custom_collections::Model>>, ApiError> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(description) = &payload.description {
        validate_notes(description)?;
    }
    if let Some(color) = &payload.color {
        validate_color_hex(color)?;
    }

    let update = CollectionUpdate {
        name: payload.name,
        description: payload.description,
        color: payload.color,
    };

    if update.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let collection = state
        .store()
        .update_collection(user.id, id, update)
        .await?
        .ok_or_else(ApiError::collection_not_found)?;

    Ok(Json(ApiResponse::success(collection)))
}

/// DELETE /api/collections/{id}
///
/// Membership rows go with it; the polishes themselves stay.
pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.store().delete_collection(user.id, id).await? {
        return Err(ApiError::collection_not_found());
    }

    Ok(Json(ApiResponse::message("Collection deleted")))
}

#[derive(Debug, Deserialize)]
pub struct AddPolishRequest {
    pub polish_id: i32,
}

/// POST /api/collections/{id}/polishes
///
/// Both the collection and the polish must belong to the caller.
/// Re-adding an existing member succeeds without creating a duplicate.
pub async fn add_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<AddPolishRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let collection = state
        .store()
        .get_collection(user.id, id)
        .await?
        .ok_or_else(ApiError::collection_not_found)?;

    if !state.store().polish_exists(user.id, payload.polish_id).await? {
        return Err(ApiError::polish_not_found());
    }

    state
        .store()
        .add_polish_to_collection(collection.id, payload.polish_id)
        .await?;

    Ok(Json(ApiResponse::message("Polish added to collection")))
}

/// DELETE /api/collections/{id}/polishes/{polish_id}
pub async fn remove_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path((id, polish_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let collection = state
        .store()
        .get_collection(user.id, id)
        .await?
        .ok_or_else(ApiError::collection_not_found)?;

    if !state
        .store()
        .remove_polish_from_collection(collection.id, polish_id)
        .await?
    {
        return Err(ApiError::NotFound(
            "Polish not in collection".to_string(),
        ));
    }

    Ok(Json(ApiResponse::message("Polish removed from collection")))
}
