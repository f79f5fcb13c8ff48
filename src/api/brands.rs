use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::db::BrandRow;
use crate::entities::brands;

/// GET /api/brands
///
/// All brands, each with the caller's polish count.
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<BrandRow>>>, ApiError> {
    let brands = state.store().list_brands(user.id).await?;
    Ok(Json(ApiResponse::success(brands)))
}

/// GET /api/brands/{id}
pub async fn get_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<brands::Model>>, ApiError> {
    let brand = state
        .store()
        .get_brand(id)
        .await?
        .ok_or_else(ApiError::brand_not_found)?;

    Ok(Json(ApiResponse::success(brand)))
}
