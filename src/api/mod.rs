use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod analytics;
pub mod auth;
mod brands;
mod collections;
mod error;
mod polishes;
mod types;
mod upload;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn images(&self) -> &Arc<crate::services::image::ImageService> {
        &self.shared.images
    }

    #[must_use]
    pub fn oauth(&self) -> &Arc<crate::clients::oauth::OAuthClient> {
        &self.shared.oauth
    }
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (uploads_path, cors_origins, max_body) = {
        let config = state.config().read().await;
        (
            config.uploads.uploads_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.uploads.max_upload_bytes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/dev-login", post(auth::dev_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/google", get(auth::google_authorize))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/github", get(auth::github_authorize))
        .route("/auth/github/callback", get(auth::github_callback));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(uploads_path),
        )
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/brands", get(brands::list_brands))
        .route("/brands/{id}", get(brands::get_brand))
        .route("/polishes", get(polishes::list_polishes))
        .route("/polishes", post(polishes::create_polish))
        .route("/polishes/{id}", get(polishes::get_polish))
        .route("/polishes/{id}", put(polishes::update_polish))
        .route("/polishes/{id}", delete(polishes::delete_polish))
        .route("/polishes/{id}/usage", post(polishes::record_usage))
        .route("/collections", get(collections::list_collections))
        .route("/collections", post(collections::create_collection))
        .route("/collections/{id}", get(collections::get_collection))
        .route("/collections/{id}", put(collections::update_collection))
        .route("/collections/{id}", delete(collections::delete_collection))
        .route("/collections/{id}/polishes", post(collections::add_polish))
        .route(
            "/collections/{id}/polishes/{polish_id}",
            delete(collections::remove_polish),
        )
        .route("/analytics", get(analytics::collection_analytics))
        .route("/analytics/summary", get(analytics::summary))
        .route("/upload/polish-image", post(upload::upload_polish_image))
        .route("/upload/nail-art", post(upload::upload_nail_art))
        .route("/upload/multiple", post(upload::upload_multiple))
        .route("/upload/image", delete(upload::delete_image))
        .route("/upload/user-images", get(upload::list_user_images))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> (axum::http::StatusCode, Json<serde_json::Value>) {
    let (code, status) = if state.store().ping().await.is_ok() {
        (axum::http::StatusCode::OK, "ok")
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
