//! API middleware for session authentication and CORS.

use crate::auth::AuthUser;
use crate::config::CorsConfig;
use crate::error::ApiError;
use crate::ledger::LedgerError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

/// Authorization scheme accepted for sessions.
const BEARER_PREFIX: &str = "Bearer ";

/// Session middleware.
///
/// Verifies the bearer token, loads the user it names and attaches an
/// [`AuthUser`] to the request. Every failure is a 401.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.sessions.verify(token).inspect_err(|e| {
        debug!("Rejected session: {}", e);
    })?;

    let user = match state.ledger.get_user(&claims.user_id).await {
        Ok(user) => user,
        Err(LedgerError::NotFound(_)) => {
            warn!(user_id = %claims.user_id, "Session names an unknown user");
            return Err(ApiError::Unauthorized("user not found".to_string()));
        }
        Err(other) => return Err(other.into()),
    };

    request.extensions_mut().insert(AuthUser::from(&user));
    Ok(next.run(request).await)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    match value.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized(
            "malformed authorization header".to_string(),
        )),
    }
}

/// Builds the CORS layer.
///
/// With no configured origins any origin is allowed, without credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}
