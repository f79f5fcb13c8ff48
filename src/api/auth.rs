use axum::{
    Json,
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AuthDto, UserDto};
use crate::clients::oauth::Provider;
use crate::db::NewUser;
use crate::services::token;

/// The authenticated user, inserted as a request extension by
/// `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: String,
}

/// Resolves the caller before any protected handler runs. In dev mode
/// everyone is the sentinel dev user; otherwise a Bearer JWT is
/// required and each failure mode gets its own message.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state.config().read().await.auth.clone();

    let user = if auth.dev_mode {
        state
            .store()
            .get_or_create_user(NewUser::dev_sentinel())
            .await?
    } else {
        let raw = bearer_token(&headers)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = token::decode_token(&raw, &auth).map_err(|err| {
            if matches!(
                err.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            ) {
                ApiError::Unauthorized("Token expired".to_string())
            } else {
                ApiError::Unauthorized("Invalid token".to_string())
            }
        })?;

        state
            .store()
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?
    };

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// POST /api/auth/dev-login
///
/// Local-development shortcut: issues a token for the sentinel dev
/// user. Refused outright unless dev mode is on.
pub async fn dev_login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AuthDto>>, ApiError> {
    let auth = state.config().read().await.auth.clone();

    if !auth.dev_mode {
        return Err(ApiError::Forbidden("Dev mode not enabled".to_string()));
    }

    let user = state
        .store()
        .get_or_create_user(NewUser::dev_sentinel())
        .await?;
    let token = token::issue_token(&user, &auth)?;

    Ok(Json(ApiResponse::success(AuthDto {
        token,
        user: user.into(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .find_user(current.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client drops its copy.
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out"))
}

/// GET /api/auth/google
pub async fn google_authorize(
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, ApiError> {
    authorize(state, Provider::Google).await
}

/// GET /api/auth/google/callback
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, ApiError> {
    callback(state, Provider::Google, params).await
}

/// GET /api/auth/github
pub async fn github_authorize(
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, ApiError> {
    authorize(state, Provider::GitHub).await
}

/// GET /api/auth/github/callback
pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, ApiError> {
    callback(state, Provider::GitHub, params).await
}

async fn authorize(state: Arc<AppState>, provider: Provider) -> Result<Redirect, ApiError> {
    let public_url = state.config().read().await.server.public_url.clone();
    let redirect_uri = callback_uri(&public_url, provider);

    let url = state
        .oauth()
        .authorize_url(provider, &redirect_uri)
        .map_err(|err| ApiError::oauth_error(provider.as_str(), err.to_string()))?;

    Ok(Redirect::temporary(&url))
}

async fn callback(
    state: Arc<AppState>,
    provider: Provider,
    params: CallbackParams,
) -> Result<Redirect, ApiError> {
    let (auth, frontend_url, public_url) = {
        let config = state.config().read().await;
        (
            config.auth.clone(),
            config.server.frontend_url.clone(),
            config.server.public_url.clone(),
        )
    };

    let redirect_uri = callback_uri(&public_url, provider);
    let profile = state
        .oauth()
        .exchange_code(provider, &params.code, &redirect_uri)
        .await
        .map_err(|err| ApiError::oauth_error(provider.as_str(), err.to_string()))?;

    let user = state.store().get_or_create_user(profile).await?;
    let token = token::issue_token(&user, &auth)?;

    Ok(Redirect::temporary(&format!(
        "{frontend_url}/auth/callback?token={}",
        urlencoding::encode(&token)
    )))
}

fn callback_uri(public_url: &str, provider: Provider) -> String {
    format!("{public_url}/api/auth/{}/callback", provider.as_str())
}
