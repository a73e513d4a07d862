//! Stock holding handlers.

use crate::api::extract::ApiJson;
use crate::api::handlers::ensure_own;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{CreateStockRequest, MessageResponse, StockResponse, UpdateStockRequest};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use uuid::Uuid;

/// List all of the caller's holdings with their metrics.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/stocks",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Holdings with metrics", body = Vec<StockResponse>)
    ),
    security(("bearer" = [])),
    tag = "Stocks"
)]
pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<StockResponse>>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let stocks = state.ledger.list_stocks(&auth.user_id, None).await?;
    Ok(Json(stocks))
}

/// Add a holding.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/stocks",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = CreateStockRequest,
    responses(
        (status = 201, description = "Holding created", body = StockResponse),
        (status = 400, description = "Invalid basis or shares"),
        (status = 404, description = "Portfolio not found")
    ),
    security(("bearer" = [])),
    tag = "Stocks"
)]
pub async fn create_stock(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ApiJson(request): ApiJson<CreateStockRequest>,
) -> Result<(StatusCode, Json<StockResponse>), ApiError> {
    ensure_own(&auth, &user_id)?;
    let stock = state.ledger.create_stock(&auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// Get a holding with its covered calls and metrics.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/stocks/{stock_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("stock_id" = Uuid, Path, description = "Stock id")
    ),
    responses(
        (status = 200, description = "Holding", body = StockResponse),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Stocks"
)]
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, stock_id)): Path<(String, Uuid)>,
) -> Result<Json<StockResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let stock = state.ledger.get_stock(&auth.user_id, stock_id).await?;
    Ok(Json(stock))
}

/// Update shares and/or basis of a holding.
#[utoipa::path(
    patch,
    path = "/v1/users/{id}/stocks/{stock_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("stock_id" = Uuid, Path, description = "Stock id")
    ),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Holding updated", body = StockResponse),
        (status = 400, description = "Invalid basis or shares"),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Stocks"
)]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, stock_id)): Path<(String, Uuid)>,
    ApiJson(request): ApiJson<UpdateStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let stock = state
        .ledger
        .update_stock(&auth.user_id, stock_id, request)
        .await?;
    Ok(Json(stock))
}

/// Delete a holding and its covered calls.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}/stocks/{stock_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("stock_id" = Uuid, Path, description = "Stock id")
    ),
    responses(
        (status = 200, description = "Holding deleted", body = MessageResponse),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Stocks"
)]
pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, stock_id)): Path<(String, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    state.ledger.delete_stock(&auth.user_id, stock_id).await?;
    Ok(Json(MessageResponse::new("Stock deleted successfully")))
}
