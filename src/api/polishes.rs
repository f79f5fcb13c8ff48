use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    validate_color_hex, validate_finish_type, validate_limit, validate_name, validate_notes,
    validate_price, validate_purchase_date, validate_rating, validate_tags, validate_used_at,
};
use super::{ApiError, ApiResponse, AppState, PaginatedResponse, Pagination, PolishDto};
use crate::db::{NewPolish, NewUsage, PolishFilter, PolishUpdate, SortField, SortOrder};
use crate::entities::polish_usage;

const DEFAULT_LIMIT: u64 = 20;

/// Raw query params. Everything arrives as a string so malformed
/// numbers can be rejected with the uniform 400 envelope instead of a
/// framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub brand_id: Option<String>,
    pub finish_type: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub is_favorite: Option<String>,
    pub has_rating: Option<String>,
    pub rating_min: Option<String>,
    pub custom_tags: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn parse_param<T: FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ApiError::validation(format!("Invalid value for {name}: {value}"))
        }),
    }
}

fn build_filter(params: &ListParams) -> Result<PolishFilter, ApiError> {
    let mut filter = PolishFilter {
        brand_id: parse_param(params.brand_id.as_deref(), "brand_id")?,
        price_min: parse_param(params.price_min.as_deref(), "price_min")?,
        price_max: parse_param(params.price_max.as_deref(), "price_max")?,
        rating_min: parse_param(params.rating_min.as_deref(), "rating_min")?,
        // The boolean toggles only engage on the literal "true".
        favorites_only: params.is_favorite.as_deref() == Some("true"),
        rated_only: params.has_rating.as_deref() == Some("true"),
        ..PolishFilter::default()
    };

    if let Some(finish) = params.finish_type.as_deref().filter(|f| !f.is_empty()) {
        validate_finish_type(finish)?;
        filter.finish_type = Some(finish.to_string());
    }

    if let Some(rating_min) = filter.rating_min {
        validate_rating(rating_min)?;
    }

    if let Some(tags) = params.custom_tags.as_deref() {
        filter.tags = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(search) = params.search.as_deref() {
        let trimmed = search.trim();
        if !trimmed.is_empty() {
            filter.search = Some(trimmed.to_string());
        }
    }

    Ok(filter)
}

/// GET /api/polishes
pub async fn list_polishes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<PolishDto>>, ApiError> {
    let filter = build_filter(&params)?;

    let sort = SortField::parse(params.sort_by.as_deref().unwrap_or_default());
    let order = SortOrder::parse(params.sort_order.as_deref().unwrap_or_default());

    let limit = parse_param(params.limit.as_deref(), "limit")?.unwrap_or(DEFAULT_LIMIT);
    let limit = validate_limit(limit)?;
    let offset = parse_param(params.offset.as_deref(), "offset")?.unwrap_or(0);

    let page = state
        .store()
        .list_polishes(user.id, &filter, sort, order, limit, offset)
        .await?;

    Ok(Json(PaginatedResponse {
        success: true,
        data: page.rows.into_iter().map(PolishDto::from).collect(),
        pagination: Pagination::new(page.total, limit, offset),
    }))
}

/// GET /api/polishes/{id}
pub async fn get_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PolishDto>>, ApiError> {
    let row = state
        .store()
        .get_polish(user.id, id)
        .await?
        .ok_or_else(ApiError::polish_not_found)?;

    Ok(Json(ApiResponse::success(row.into())))
}

#[derive(Debug, Deserialize)]
pub struct CreatePolishRequest {
    pub name: String,
    pub brand_id: Option<i32>,
    pub color_hex: Option<String>,
    pub finish_type: String,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub custom_tags: Vec<String>,
}

/// POST /api/polishes
pub async fn create_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreatePolishRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PolishDto>>), ApiError> {
    validate_name(&payload.name)?;
    validate_finish_type(&payload.finish_type)?;
    if let Some(color) = &payload.color_hex {
        validate_color_hex(color)?;
    }
    if let Some(date) = &payload.purchase_date {
        validate_purchase_date(date)?;
    }
    if let Some(price) = payload.purchase_price {
        validate_price(price)?;
    }
    if let Some(notes) = &payload.notes {
        validate_notes(notes)?;
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }
    validate_tags(&payload.custom_tags)?;

    let row = state
        .store()
        .create_polish(
            user.id,
            NewPolish {
                brand_id: payload.brand_id,
                name: payload.name,
                color_hex: payload.color_hex,
                finish_type: payload.finish_type,
                collection_name: payload.collection_name,
                purchase_date: payload.purchase_date,
                purchase_price: payload.purchase_price,
                purchase_location: payload.purchase_location,
                notes: payload.notes,
                rating: payload.rating,
                is_favorite: payload.is_favorite,
                custom_tags: payload.custom_tags,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(row.into()))))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePolishRequest {
    pub name: Option<String>,
    pub brand_id: Option<i32>,
    pub color_hex: Option<String>,
    pub finish_type: Option<String>,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub is_favorite: Option<bool>,
    pub custom_tags: Option<Vec<String>>,
    pub bottle_image_url: Option<String>,
    pub swatch_image_url: Option<String>,
}

/// PUT /api/polishes/{id}
///
/// Partial update: absent fields keep their stored value.
pub async fn update_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePolishRequest>,
) -> Result<Json<ApiResponse<PolishDto>>, ApiError> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(finish) = &payload.finish_type {
        validate_finish_type(finish)?;
    }
    if let Some(color) = &payload.color_hex {
        validate_color_hex(color)?;
    }
    if let Some(date) = &payload.purchase_date {
        validate_purchase_date(date)?;
    }
    if let Some(price) = payload.purchase_price {
        validate_price(price)?;
    }
    if let Some(notes) = &payload.notes {
        validate_notes(notes)?;
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }
    if let Some(tags) = &payload.custom_tags {
        validate_tags(tags)?;
    }

    let update = PolishUpdate {
        brand_id: payload.brand_id,
        name: payload.name,
        color_hex: payload.color_hex,
        finish_type: payload.finish_type,
        collection_name: payload.collection_name,
        purchase_date: payload.purchase_date,
        purchase_price: payload.purchase_price,
        purchase_location: payload.purchase_location,
        notes: payload.notes,
        rating: payload.rating,
        is_favorite: payload.is_favorite,
        custom_tags: payload.custom_tags,
        bottle_image_url: payload.bottle_image_url,
        swatch_image_url: payload.swatch_image_url,
    };

    if update.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let row = state
        .store()
        .update_polish(user.id, id, update)
        .await?
        .ok_or_else(ApiError::polish_not_found)?;

    Ok(Json(ApiResponse::success(row.into())))
}

/// DELETE /api/polishes/{id}
///
/// Also removes usage history and collection memberships.
pub async fn delete_polish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.store().delete_polish(user.id, id).await? {
        return Err(ApiError::polish_not_found());
    }

    Ok(Json(ApiResponse::message("Polish deleted")))
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageRequest {
    pub used_at: Option<String>,
    pub occasion: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/polishes/{id}/usage
pub async fn record_usage(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UsageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<polish_usage::Model>>), ApiError> {
    if let Some(used_at) = &payload.used_at {
        validate_used_at(used_at)?;
    }
    if let Some(occasion) = &payload.occasion
        && occasion.len() > 255
    {
        return Err(ApiError::validation(
            "Occasion must be 255 characters or less",
        ));
    }
    if let Some(notes) = &payload.notes {
        validate_notes(notes)?;
    }

    let usage = state
        .store()
        .record_usage(
            user.id,
            id,
            NewUsage {
                used_at: payload.used_at,
                occasion: payload.occasion,
                notes: payload.notes,
            },
        )
        .await?
        .ok_or_else(ApiError::polish_not_found)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(usage))))
}

