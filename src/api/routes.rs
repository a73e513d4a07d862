//! Route configuration.

use crate::api::{covered_calls, handlers, middleware, portfolios, stocks};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Creates the API router.
///
/// Health and sign-in routes are public; everything else sits behind the
/// session middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/v1/auth/sync", post(handlers::sync_user))
        .route("/v1/auth/oauth", post(handlers::oauth_sign_in));

    let protected = Router::new()
        // Users
        .route("/v1/profile", get(handlers::get_profile))
        .route("/v1/users/{id}", get(handlers::get_user))
        // Portfolios
        .route(
            "/v1/users/{id}/portfolios",
            get(portfolios::list_portfolios).post(portfolios::create_portfolio),
        )
        .route(
            "/v1/users/{id}/portfolios/{portfolio_id}",
            get(portfolios::get_portfolio)
                .patch(portfolios::update_portfolio)
                .delete(portfolios::delete_portfolio),
        )
        .route(
            "/v1/users/{id}/portfolios/{portfolio_id}/stocks",
            get(portfolios::list_portfolio_stocks),
        )
        // Stocks
        .route(
            "/v1/users/{id}/stocks",
            get(stocks::list_stocks).post(stocks::create_stock),
        )
        .route(
            "/v1/users/{id}/stocks/{stock_id}",
            get(stocks::get_stock)
                .patch(stocks::update_stock)
                .delete(stocks::delete_stock),
        )
        .route(
            "/v1/users/{id}/stocks/{stock_id}/covered-calls",
            get(covered_calls::list_stock_covered_calls)
                .post(covered_calls::create_stock_covered_call),
        )
        // Covered calls
        .route(
            "/v1/users/{id}/covered-calls",
            get(covered_calls::list_covered_calls).post(covered_calls::create_covered_call),
        )
        .route(
            "/v1/users/{id}/covered-calls/{call_id}",
            get(covered_calls::get_covered_call)
                .patch(covered_calls::update_covered_call)
                .delete(covered_calls::delete_covered_call),
        )
        .route(
            "/v1/users/{id}/covered-calls/{call_id}/activate",
            post(covered_calls::activate_covered_call),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    public.merge(protected).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::models::AuthResponse;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::default());
        (create_router(state.clone()), state)
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn sign_in(router: &Router, id: &str) -> String {
        let response = send(
            router,
            "POST",
            "/v1/auth/sync",
            None,
            Some(json!({"id": id, "email": format!("{}@example.com", id), "name": id})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let auth: AuthResponse = serde_json::from_slice(&bytes).unwrap();
        auth.token
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (router, _) = app();
        let response = send(&router, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let (router, _) = app();
        let response = send(&router, "GET", "/v1/profile", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "UNAUTHORIZED");

        let response = send(&router, "GET", "/v1/profile", Some("garbage"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let (router, state) = app();
        sign_in(&router, "late").await;
        let now = chrono::Utc::now().timestamp();
        let token = state.sessions.sign(&Claims {
            user_id: "late".to_string(),
            email: "late@example.com".to_string(),
            iat: now - 100,
            exp: now - 10,
        });

        let response = send(&router, "GET", "/v1/profile", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_for_unknown_user_rejected() {
        let (router, state) = app();
        let now = chrono::Utc::now().timestamp();
        let token = state.sessions.sign(&Claims {
            user_id: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            iat: now,
            exp: now + 3600,
        });

        let response = send(&router, "GET", "/v1/profile", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_covered_call_flow_over_http() {
        let (router, _) = app();
        let token = sign_in(&router, "flow").await;

        let response = send(
            &router,
            "POST",
            "/v1/users/flow/stocks",
            Some(&token),
            Some(json!({"symbol": "KO", "basis": 50.0, "shares": 300.0})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let stock = json_body(response).await;
        assert_eq!(stock["covered_calls"], json!([]));
        let stock_id = stock["id"].as_str().unwrap().to_string();

        let response = send(
            &router,
            "POST",
            &format!("/v1/users/flow/stocks/{}/covered-calls", stock_id),
            Some(&token),
            Some(json!({
                "strike_price": 55.0,
                "premium_received": 3.0,
                "contracts": 2,
                "expiration_date": "2030-01-18T00:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let call = json_body(response).await;
        assert_eq!(call["status"], "pending");
        assert_eq!(call["symbol"], "KO");
        let call_id = call["id"].as_str().unwrap().to_string();

        let response = send(
            &router,
            "POST",
            &format!("/v1/users/flow/covered-calls/{}/activate", call_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &router,
            "GET",
            &format!("/v1/users/flow/stocks/{}", stock_id),
            Some(&token),
            None,
        )
        .await;
        let holding = json_body(response).await;
        assert_eq!(holding["adjusted_basis"], 48.0);
        assert_eq!(holding["shares_available"], 100);
        assert_eq!(holding["active_calls"], 1);
    }

    #[tokio::test]
    async fn test_other_users_path_is_not_found() {
        let (router, _) = app();
        let token = sign_in(&router, "mallory").await;
        sign_in(&router, "victim").await;

        let response = send(&router, "GET", "/v1/users/victim/stocks", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (router, _) = app();
        let token = sign_in(&router, "sloppy").await;

        let response = send(
            &router,
            "POST",
            "/v1/users/sloppy/stocks",
            Some(&token),
            Some(json!({"symbol": "KO", "basis": "fifty", "shares": 10})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_REQUEST");
    }
}
