//! Covered call handlers.

use crate::api::extract::ApiJson;
use crate::api::handlers::ensure_own;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    CoveredCallResponse, CoveredCallTerms, CreateCoveredCallRequest, MessageResponse,
    UpdateCoveredCallRequest,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use uuid::Uuid;

/// List the caller's covered calls, newest first.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/covered-calls",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Covered calls", body = Vec<CoveredCallResponse>)
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn list_covered_calls(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CoveredCallResponse>>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let calls = state.ledger.list_covered_calls(&auth.user_id, None).await?;
    Ok(Json(calls))
}

/// Write a covered call against the holding named in the body.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/covered-calls",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = CreateCoveredCallRequest,
    responses(
        (status = 201, description = "Covered call created as pending", body = CoveredCallResponse),
        (status = 400, description = "Invalid terms or insufficient shares"),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn create_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ApiJson(request): ApiJson<CreateCoveredCallRequest>,
) -> Result<(StatusCode, Json<CoveredCallResponse>), ApiError> {
    ensure_own(&auth, &user_id)?;
    let call = state
        .ledger
        .create_covered_call(&auth.user_id, request.stock_id, request.terms)
        .await?;
    Ok((StatusCode::CREATED, Json(call)))
}

/// List the covered calls written against one holding.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/stocks/{stock_id}/covered-calls",
    params(
        ("id" = String, Path, description = "User id"),
        ("stock_id" = Uuid, Path, description = "Stock id")
    ),
    responses(
        (status = 200, description = "Covered calls", body = Vec<CoveredCallResponse>),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn list_stock_covered_calls(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, stock_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<CoveredCallResponse>>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let calls = state
        .ledger
        .list_covered_calls(&auth.user_id, Some(stock_id))
        .await?;
    Ok(Json(calls))
}

/// Write a covered call against the holding in the path.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/stocks/{stock_id}/covered-calls",
    params(
        ("id" = String, Path, description = "User id"),
        ("stock_id" = Uuid, Path, description = "Stock id")
    ),
    request_body = CoveredCallTerms,
    responses(
        (status = 201, description = "Covered call created as pending", body = CoveredCallResponse),
        (status = 400, description = "Invalid terms or insufficient shares"),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn create_stock_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, stock_id)): Path<(String, Uuid)>,
    ApiJson(terms): ApiJson<CoveredCallTerms>,
) -> Result<(StatusCode, Json<CoveredCallResponse>), ApiError> {
    ensure_own(&auth, &user_id)?;
    let call = state
        .ledger
        .create_covered_call(&auth.user_id, stock_id, terms)
        .await?;
    Ok((StatusCode::CREATED, Json(call)))
}

/// Get a covered call.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/covered-calls/{call_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("call_id" = Uuid, Path, description = "Covered call id")
    ),
    responses(
        (status = 200, description = "Covered call", body = CoveredCallResponse),
        (status = 404, description = "Covered call not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn get_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, call_id)): Path<(String, Uuid)>,
) -> Result<Json<CoveredCallResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let call = state.ledger.get_covered_call(&auth.user_id, call_id).await?;
    Ok(Json(call))
}

/// Update status and close fields of a covered call.
#[utoipa::path(
    patch,
    path = "/v1/users/{id}/covered-calls/{call_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("call_id" = Uuid, Path, description = "Covered call id")
    ),
    request_body = UpdateCoveredCallRequest,
    responses(
        (status = 200, description = "Covered call updated", body = CoveredCallResponse),
        (status = 400, description = "Status transition not allowed"),
        (status = 404, description = "Covered call not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn update_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, call_id)): Path<(String, Uuid)>,
    ApiJson(request): ApiJson<UpdateCoveredCallRequest>,
) -> Result<Json<CoveredCallResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let call = state
        .ledger
        .update_covered_call(&auth.user_id, call_id, request)
        .await?;
    Ok(Json(call))
}

/// Activate a pending covered call.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/covered-calls/{call_id}/activate",
    params(
        ("id" = String, Path, description = "User id"),
        ("call_id" = Uuid, Path, description = "Covered call id")
    ),
    responses(
        (status = 200, description = "Covered call activated", body = CoveredCallResponse),
        (status = 400, description = "Call is not pending"),
        (status = 404, description = "Covered call not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn activate_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, call_id)): Path<(String, Uuid)>,
) -> Result<Json<CoveredCallResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let call = state
        .ledger
        .activate_covered_call(&auth.user_id, call_id)
        .await?;
    Ok(Json(call))
}

/// Delete a covered call.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}/covered-calls/{call_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("call_id" = Uuid, Path, description = "Covered call id")
    ),
    responses(
        (status = 200, description = "Covered call deleted", body = MessageResponse),
        (status = 404, description = "Covered call not found")
    ),
    security(("bearer" = [])),
    tag = "Covered Calls"
)]
pub async fn delete_covered_call(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, call_id)): Path<(String, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    state
        .ledger
        .delete_covered_call(&auth.user_id, call_id)
        .await?;
    Ok(Json(MessageResponse::new("Covered call deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Stock;
    use crate::ledger::CallStatus;
    use crate::models::{CreateStockRequest, SyncUserRequest};
    use chrono::{Duration, Utc};

    async fn setup(shares: f64) -> (Arc<AppState>, AuthUser, Stock) {
        let state = Arc::new(AppState::default());
        let user = state
            .ledger
            .sync_user(SyncUserRequest {
                id: "writer".to_string(),
                email: "writer@example.com".to_string(),
                name: "Writer".to_string(),
            })
            .await
            .unwrap();
        let stock = state
            .ledger
            .create_stock(
                &user.id,
                CreateStockRequest {
                    portfolio_id: None,
                    symbol: "KO".to_string(),
                    basis: 50.0,
                    shares,
                },
            )
            .await
            .unwrap()
            .stock;
        (state, AuthUser::from(&user), stock)
    }

    fn terms(contracts: i32) -> CoveredCallTerms {
        CoveredCallTerms {
            strike_price: 65.0,
            premium_received: 3.0,
            contracts,
            expiration_date: Utc::now() + Duration::days(21),
        }
    }

    #[tokio::test]
    async fn test_create_then_activate() {
        let (state, auth, stock) = setup(300.0).await;

        let (status, Json(created)) = create_covered_call(
            State(state.clone()),
            Extension(auth.clone()),
            Path(auth.user_id.clone()),
            ApiJson(CreateCoveredCallRequest {
                stock_id: stock.id,
                terms: terms(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.call.status, CallStatus::Pending);
        assert_eq!(created.symbol, "KO");

        let activated = activate_covered_call(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), created.call.id)),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(activated.call.status, CallStatus::Active);

        let holding = state.ledger.get_stock(&auth.user_id, stock.id).await.unwrap();
        assert_eq!(holding.metrics.adjusted_basis, 48.0);
        assert_eq!(holding.metrics.shares_available, 100);
    }

    #[tokio::test]
    async fn test_nested_create_rejects_uncovered_call() {
        let (state, auth, stock) = setup(100.0).await;

        let result = create_stock_covered_call(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), stock.id)),
            ApiJson(terms(2)),
        )
        .await;
        assert!(
            matches!(result, Err(ApiError::InvalidRequest(ref m)) if m == "Insufficient shares to cover the call")
        );

        let calls = list_stock_covered_calls(
            State(state),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), stock.id)),
        )
        .await
        .unwrap()
        .0;
        assert!(calls.is_empty());
    }

    #[tokio::test]
    async fn test_activate_twice_is_bad_request() {
        let (state, auth, stock) = setup(100.0).await;
        let (_, Json(created)) = create_stock_covered_call(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), stock.id)),
            ApiJson(terms(1)),
        )
        .await
        .unwrap();
        let path = (auth.user_id.clone(), created.call.id);

        activate_covered_call(State(state.clone()), Extension(auth.clone()), Path(path.clone()))
            .await
            .unwrap();
        let second =
            activate_covered_call(State(state), Extension(auth), Path(path)).await;
        assert!(
            matches!(second, Err(ApiError::InvalidRequest(ref m)) if m == "Only pending calls can be activated")
        );
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_transition() {
        let (state, auth, stock) = setup(100.0).await;
        let created = state
            .ledger
            .create_covered_call(&auth.user_id, stock.id, terms(1))
            .await
            .unwrap();

        let result = update_covered_call(
            State(state),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), created.call.id)),
            ApiJson(UpdateCoveredCallRequest {
                status: Some(CallStatus::Assigned),
                ..Default::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let (state, auth, stock) = setup(200.0).await;
        let created = state
            .ledger
            .create_covered_call(&auth.user_id, stock.id, terms(1))
            .await
            .unwrap();

        let listed = list_covered_calls(
            State(state.clone()),
            Extension(auth.clone()),
            Path(auth.user_id.clone()),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(listed.len(), 1);

        let message = delete_covered_call(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), created.call.id)),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(message.message, "Covered call deleted successfully");

        let result = get_covered_call(
            State(state),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), created.call.id)),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
