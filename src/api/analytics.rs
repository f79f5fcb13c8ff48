use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::db::{AnalyticsSummary, CollectionAnalytics};

/// GET /api/analytics
///
/// The full analytics payload: overview totals, brand/finish/color
/// distributions, usage leaders and laggards, and monthly trends.
pub async fn collection_analytics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<CollectionAnalytics>>, ApiError> {
    let analytics = state.store().collection_analytics(user.id).await?;
    Ok(Json(ApiResponse::success(analytics)))
}

/// GET /api/analytics/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>, ApiError> {
    let summary = state.store().analytics_summary(user.id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
