//! Portfolio handlers.

use crate::api::extract::ApiJson;
use crate::api::handlers::ensure_own;
use crate::auth::AuthUser;
use crate::db::Portfolio;
use crate::error::ApiError;
use crate::models::{
    CreatePortfolioRequest, MessageResponse, PortfolioResponse, StockResponse,
    UpdatePortfolioRequest,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use uuid::Uuid;

/// List the caller's portfolios.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/portfolios",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Portfolios, newest first", body = Vec<Portfolio>)
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn list_portfolios(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Portfolio>>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let portfolios = state.ledger.list_portfolios(&auth.user_id).await?;
    Ok(Json(portfolios))
}

/// Create a portfolio.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/portfolios",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = CreatePortfolioRequest,
    responses(
        (status = 201, description = "Portfolio created", body = Portfolio),
        (status = 400, description = "Blank name")
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn create_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ApiJson(request): ApiJson<CreatePortfolioRequest>,
) -> Result<(StatusCode, Json<Portfolio>), ApiError> {
    ensure_own(&auth, &user_id)?;
    let portfolio = state.ledger.create_portfolio(&auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(portfolio)))
}

/// Get a portfolio with its holdings.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/portfolios/{portfolio_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("portfolio_id" = Uuid, Path, description = "Portfolio id")
    ),
    responses(
        (status = 200, description = "Portfolio with holdings", body = PortfolioResponse),
        (status = 404, description = "Portfolio not found")
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, portfolio_id)): Path<(String, Uuid)>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let portfolio = state
        .ledger
        .get_portfolio(&auth.user_id, portfolio_id)
        .await?;
    Ok(Json(portfolio))
}

/// Rename a portfolio.
#[utoipa::path(
    patch,
    path = "/v1/users/{id}/portfolios/{portfolio_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("portfolio_id" = Uuid, Path, description = "Portfolio id")
    ),
    request_body = UpdatePortfolioRequest,
    responses(
        (status = 200, description = "Portfolio updated", body = Portfolio),
        (status = 404, description = "Portfolio not found")
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn update_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, portfolio_id)): Path<(String, Uuid)>,
    ApiJson(request): ApiJson<UpdatePortfolioRequest>,
) -> Result<Json<Portfolio>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let portfolio = state
        .ledger
        .update_portfolio(&auth.user_id, portfolio_id, request)
        .await?;
    Ok(Json(portfolio))
}

/// Delete a portfolio with its holdings and their covered calls.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}/portfolios/{portfolio_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("portfolio_id" = Uuid, Path, description = "Portfolio id")
    ),
    responses(
        (status = 200, description = "Portfolio deleted", body = MessageResponse),
        (status = 404, description = "Portfolio not found")
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn delete_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, portfolio_id)): Path<(String, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_own(&auth, &user_id)?;
    state
        .ledger
        .delete_portfolio(&auth.user_id, portfolio_id)
        .await?;
    Ok(Json(MessageResponse::new("Portfolio deleted successfully")))
}

/// List the holdings filed under a portfolio.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/portfolios/{portfolio_id}/stocks",
    params(
        ("id" = String, Path, description = "User id"),
        ("portfolio_id" = Uuid, Path, description = "Portfolio id")
    ),
    responses(
        (status = 200, description = "Holdings with metrics", body = Vec<StockResponse>),
        (status = 404, description = "Portfolio not found")
    ),
    security(("bearer" = [])),
    tag = "Portfolios"
)]
pub async fn list_portfolio_stocks(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, portfolio_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<StockResponse>>, ApiError> {
    ensure_own(&auth, &user_id)?;
    let stocks = state
        .ledger
        .list_stocks(&auth.user_id, Some(portfolio_id))
        .await?;
    Ok(Json(stocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateStockRequest, SyncUserRequest};

    async fn setup() -> (Arc<AppState>, AuthUser) {
        let state = Arc::new(AppState::default());
        let user = state
            .ledger
            .sync_user(SyncUserRequest {
                id: "owner".to_string(),
                email: "owner@example.com".to_string(),
                name: "Owner".to_string(),
            })
            .await
            .unwrap();
        (state, AuthUser::from(&user))
    }

    async fn create(state: &Arc<AppState>, auth: &AuthUser, name: &str) -> Portfolio {
        let (status, Json(portfolio)) = create_portfolio(
            State(state.clone()),
            Extension(auth.clone()),
            Path(auth.user_id.clone()),
            ApiJson(CreatePortfolioRequest {
                name: name.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        portfolio
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (state, auth) = setup().await;
        create(&state, &auth, "Income").await;
        create(&state, &auth, "Growth").await;

        let listed = list_portfolios(
            State(state.clone()),
            Extension(auth.clone()),
            Path(auth.user_id.clone()),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_path_user_mismatch_is_not_found() {
        let (state, auth) = setup().await;
        let result = list_portfolios(
            State(state),
            Extension(auth),
            Path("someone-else".to_string()),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (state, auth) = setup().await;
        let portfolio = create(&state, &auth, "Temp").await;
        state
            .ledger
            .create_stock(
                &auth.user_id,
                CreateStockRequest {
                    portfolio_id: Some(portfolio.id),
                    symbol: "VZ".to_string(),
                    basis: 40.0,
                    shares: 100.0,
                },
            )
            .await
            .unwrap();

        let message = delete_portfolio(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), portfolio.id)),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(message.message, "Portfolio deleted successfully");

        let result = get_portfolio(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), portfolio.id)),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let stocks = state.ledger.list_stocks(&auth.user_id, None).await.unwrap();
        assert!(stocks.is_empty());
    }

    #[tokio::test]
    async fn test_list_portfolio_stocks_scoped() {
        let (state, auth) = setup().await;
        let income = create(&state, &auth, "Income").await;
        let growth = create(&state, &auth, "Growth").await;
        for (portfolio, symbol) in [(income.id, "KO"), (growth.id, "NVDA")] {
            state
                .ledger
                .create_stock(
                    &auth.user_id,
                    CreateStockRequest {
                        portfolio_id: Some(portfolio),
                        symbol: symbol.to_string(),
                        basis: 10.0,
                        shares: 100.0,
                    },
                )
                .await
                .unwrap();
        }

        let stocks = list_portfolio_stocks(
            State(state.clone()),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), income.id)),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].stock.symbol, "KO");
    }

    #[tokio::test]
    async fn test_rename() {
        let (state, auth) = setup().await;
        let portfolio = create(&state, &auth, "Old").await;

        let renamed = update_portfolio(
            State(state),
            Extension(auth.clone()),
            Path((auth.user_id.clone(), portfolio.id)),
            ApiJson(UpdatePortfolioRequest {
                name: Some("New".to_string()),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(renamed.name, "New");
    }
}
