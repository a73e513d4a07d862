//! API request handlers for health, sign-in and user profiles.

use crate::api::extract::ApiJson;
use crate::auth::AuthUser;
use crate::db::User;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, HealthResponse, OAuthRequest, OAuthResponse, SessionUser, SyncUserRequest,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, State};
use std::sync::Arc;
use tracing::info;

/// Rejects access to another user's resources.
///
/// The path's user id must equal the authenticated one; a mismatch reads as
/// an absent resource.
pub(crate) fn ensure_own(auth: &AuthUser, user_id: &str) -> Result<(), ApiError> {
    if auth.user_id == user_id {
        Ok(())
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.to_string(),
    })
}

// ============================================================================
// Authentication
// ============================================================================

/// Syncs a user verified by the identity provider and opens a session.
#[utoipa::path(
    post,
    path = "/v1/auth/sync",
    request_body = SyncUserRequest,
    responses(
        (status = 200, description = "User synced", body = AuthResponse),
        (status = 400, description = "Missing fields")
    ),
    tag = "Auth"
)]
pub async fn sync_user(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SyncUserRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.ledger.sync_user(request).await?;
    let (token, expires) = state.sessions.issue(&user)?;

    info!(user_id = %user.id, "Issued session after sync");
    Ok(Json(AuthResponse {
        token,
        expires,
        user: SessionUser::from(&user),
    }))
}

/// Signs in through Google or Apple and opens a session.
#[utoipa::path(
    post,
    path = "/v1/auth/oauth",
    request_body = OAuthRequest,
    responses(
        (status = 200, description = "Signed in", body = OAuthResponse),
        (status = 400, description = "Unknown provider or missing fields")
    ),
    tag = "Auth"
)]
pub async fn oauth_sign_in(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<OAuthRequest>,
) -> Result<Json<OAuthResponse>, ApiError> {
    let (user, is_new_user) = state.ledger.sign_in_oauth(request).await?;
    let (token, expires) = state.sessions.issue(&user)?;

    Ok(Json(OAuthResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        picture: user.picture,
        is_new_user,
        token,
        expires,
    }))
}

// ============================================================================
// Users
// ============================================================================

/// Returns the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/v1/profile",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid session")
    ),
    security(("bearer" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let user = state.ledger.get_user(&auth.user_id).await?;
    Ok(Json(user))
}

/// Returns a user record. Only the caller's own id resolves.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let user = state.ledger.get_user(&user_id).await?;
    Ok(Json(user))
}
