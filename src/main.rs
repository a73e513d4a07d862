//! Deltra Backend Server
//!
//! REST API server for tracking stock holdings and the covered calls written
//! against them.

use deltra_backend::api::create_router;
use deltra_backend::api::middleware::cors_layer;
use deltra_backend::config::Config;
use deltra_backend::db::DatabasePool;
use deltra_backend::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use deltra_backend::db::{CoveredCall, Portfolio, Stock, User};
use deltra_backend::error::ErrorResponse;
use deltra_backend::ledger::{CallStatus, StockMetrics};
use deltra_backend::models::{
    AuthResponse, CoveredCallResponse, CoveredCallTerms, CreateCoveredCallRequest,
    CreatePortfolioRequest, CreateStockRequest, HealthResponse, MessageResponse, OAuthRequest,
    OAuthResponse, PortfolioResponse, SessionUser, StockResponse, SyncUserRequest,
    UpdateCoveredCallRequest, UpdatePortfolioRequest, UpdateStockRequest,
};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        deltra_backend::api::handlers::health_check,
        deltra_backend::api::handlers::sync_user,
        deltra_backend::api::handlers::oauth_sign_in,
        deltra_backend::api::handlers::get_profile,
        deltra_backend::api::handlers::get_user,
        deltra_backend::api::portfolios::list_portfolios,
        deltra_backend::api::portfolios::create_portfolio,
        deltra_backend::api::portfolios::get_portfolio,
        deltra_backend::api::portfolios::update_portfolio,
        deltra_backend::api::portfolios::delete_portfolio,
        deltra_backend::api::portfolios::list_portfolio_stocks,
        deltra_backend::api::stocks::list_stocks,
        deltra_backend::api::stocks::create_stock,
        deltra_backend::api::stocks::get_stock,
        deltra_backend::api::stocks::update_stock,
        deltra_backend::api::stocks::delete_stock,
        deltra_backend::api::covered_calls::list_covered_calls,
        deltra_backend::api::covered_calls::create_covered_call,
        deltra_backend::api::covered_calls::list_stock_covered_calls,
        deltra_backend::api::covered_calls::create_stock_covered_call,
        deltra_backend::api::covered_calls::get_covered_call,
        deltra_backend::api::covered_calls::update_covered_call,
        deltra_backend::api::covered_calls::activate_covered_call,
        deltra_backend::api::covered_calls::delete_covered_call,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            ErrorResponse,
            SyncUserRequest,
            OAuthRequest,
            SessionUser,
            AuthResponse,
            OAuthResponse,
            User,
            Portfolio,
            CreatePortfolioRequest,
            UpdatePortfolioRequest,
            PortfolioResponse,
            Stock,
            StockMetrics,
            CreateStockRequest,
            UpdateStockRequest,
            StockResponse,
            CallStatus,
            CoveredCall,
            CoveredCallTerms,
            CreateCoveredCallRequest,
            UpdateCoveredCallRequest,
            CoveredCallResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Sign-in and session issuance"),
        (name = "Users", description = "User profiles"),
        (name = "Portfolios", description = "Portfolio management"),
        (name = "Stocks", description = "Stock holdings and their metrics"),
        (name = "Covered Calls", description = "Covered call lifecycle"),
    ),
    info(
        title = "Deltra API",
        version = "0.1.0",
        description = "REST API for tracking stock holdings and covered calls",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Registers the bearer session scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::from_env(&config_path)?;
    info!("Loaded configuration (file: {})", config_path);

    // Create application state
    let state = match config.database.url.clone() {
        Some(url) => {
            let db = DatabasePool::new(&url, &config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            AppState::with_database(db, config)
        }
        None => AppState::in_memory(config),
    };
    let state = Arc::new(state);

    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let cors = cors_layer(&state.config.cors);

    info!("Starting Deltra Backend on {}:{}", host, port);
    info!(
        "Swagger UI available at http://{}:{}/swagger-ui/",
        host, port
    );

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
