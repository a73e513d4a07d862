//! HTTP client for the Deltra API.

use crate::error::Error;
use crate::types::*;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use uuid::Uuid;


/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Session attached to a client.
#[derive(Debug, Clone)]
struct Session {
    token: String,
    user_id: String,
}

/// HTTP client for the Deltra API.
#[derive(Debug, Clone)]
pub struct DeltraClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl DeltraClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    /// Returns a client that sends `token` and addresses `user_id`'s
    /// resources.
    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.session = Some(Session {
            token: token.into(),
            user_id: user_id.into(),
        });
        self
    }

    /// User id of the attached session.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    /// Base URL with trailing slashes removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `{base}/v1/users/{user_id}{suffix}` for the attached session.
    fn user_url(&self, suffix: &str) -> Result<String, Error> {
        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        Ok(format!(
            "{}/v1/users/{}{}",
            self.base_url, session.user_id, suffix
        ))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => builder.bearer_auth(&session.token),
            None => builder,
        }
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Authentication & Users
    // ========================================================================

    /// Syncs a user and returns a session.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn sync_user(&self, request: &SyncUserRequest) -> Result<AuthResponse, Error> {
        let url = format!("{}/v1/auth/sync", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    /// Signs in through an OAuth provider.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn oauth_sign_in(&self, request: &OAuthRequest) -> Result<OAuthResponse, Error> {
        let url = format!("{}/v1/auth/oauth", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the authenticated user's profile.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_profile(&self) -> Result<User, Error> {
        let url = format!("{}/v1/profile", self.base_url);
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Gets a user by id.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        let url = format!("{}/v1/users/{}", self.base_url, user_id);
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Portfolios
    // ========================================================================

    /// Lists portfolios.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_portfolios(&self) -> Result<Vec<Portfolio>, Error> {
        let url = self.user_url("/portfolios")?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Creates a portfolio.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_portfolio(&self, name: &str) -> Result<Portfolio, Error> {
        let url = self.user_url("/portfolios")?;
        let body = CreatePortfolioRequest {
            name: name.to_string(),
        };
        let resp = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets a portfolio with its holdings.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_portfolio(&self, portfolio_id: Uuid) -> Result<PortfolioResponse, Error> {
        let url = self.user_url(&format!("/portfolios/{}", portfolio_id))?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Renames a portfolio.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_portfolio(
        &self,
        portfolio_id: Uuid,
        request: &UpdatePortfolioRequest,
    ) -> Result<Portfolio, Error> {
        let url = self.user_url(&format!("/portfolios/{}", portfolio_id))?;
        let resp = self
            .authorized(self.client.patch(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Deletes a portfolio with its holdings and covered calls.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_portfolio(&self, portfolio_id: Uuid) -> Result<(), Error> {
        let url = self.user_url(&format!("/portfolios/{}", portfolio_id))?;
        let resp = self.authorized(self.client.delete(&url)).send().await?;
        self.handle_empty_response(resp).await
    }

    /// Lists holdings filed under a portfolio.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_portfolio_stocks(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<StockResponse>, Error> {
        let url = self.user_url(&format!("/portfolios/{}/stocks", portfolio_id))?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Stocks
    // ========================================================================

    /// Lists all holdings.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_stocks(&self) -> Result<Vec<StockResponse>, Error> {
        let url = self.user_url("/stocks")?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Adds a holding.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_stock(&self, request: &CreateStockRequest) -> Result<StockResponse, Error> {
        let url = self.user_url("/stocks")?;
        let resp = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets a holding with its covered calls and metrics.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_stock(&self, stock_id: Uuid) -> Result<StockResponse, Error> {
        let url = self.user_url(&format!("/stocks/{}", stock_id))?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Updates shares and/or basis of a holding.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_stock(
        &self,
        stock_id: Uuid,
        request: &UpdateStockRequest,
    ) -> Result<StockResponse, Error> {
        let url = self.user_url(&format!("/stocks/{}", stock_id))?;
        let resp = self
            .authorized(self.client.patch(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Deletes a holding and its covered calls.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_stock(&self, stock_id: Uuid) -> Result<(), Error> {
        let url = self.user_url(&format!("/stocks/{}", stock_id))?;
        let resp = self.authorized(self.client.delete(&url)).send().await?;
        self.handle_empty_response(resp).await
    }

    // ========================================================================
    // Covered Calls
    // ========================================================================

    /// Lists all covered calls, newest first.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_covered_calls(&self) -> Result<Vec<CoveredCallResponse>, Error> {
        let url = self.user_url("/covered-calls")?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Lists covered calls written against a holding.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_stock_covered_calls(
        &self,
        stock_id: Uuid,
    ) -> Result<Vec<CoveredCallResponse>, Error> {
        let url = self.user_url(&format!("/stocks/{}/covered-calls", stock_id))?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Writes a covered call against a holding.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_covered_call(
        &self,
        stock_id: Uuid,
        terms: &CoveredCallTerms,
    ) -> Result<CoveredCallResponse, Error> {
        let url = self.user_url(&format!("/stocks/{}/covered-calls", stock_id))?;
        let resp = self
            .authorized(self.client.post(&url))
            .json(terms)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets a covered call.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_covered_call(&self, call_id: Uuid) -> Result<CoveredCallResponse, Error> {
        let url = self.user_url(&format!("/covered-calls/{}", call_id))?;
        let resp = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Updates status and close fields of a covered call.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_covered_call(
        &self,
        call_id: Uuid,
        request: &UpdateCoveredCallRequest,
    ) -> Result<CoveredCallResponse, Error> {
        let url = self.user_url(&format!("/covered-calls/{}", call_id))?;
        let resp = self
            .authorized(self.client.patch(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Activates a pending covered call.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn activate_covered_call(&self, call_id: Uuid) -> Result<CoveredCallResponse, Error> {
        let url = self.user_url(&format!("/covered-calls/{}/activate", call_id))?;
        let resp = self.authorized(self.client.post(&url)).send().await?;
        self.handle_response(resp).await
    }

    /// Deletes a covered call.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_covered_call(&self, call_id: Uuid) -> Result<(), Error> {
        let url = self.user_url(&format!("/covered-calls/{}", call_id))?;
        let resp = self.authorized(self.client.delete(&url)).send().await?;
        self.handle_empty_response(resp).await
    }

    // ========================================================================
    // Response handling
    // ========================================================================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::from_status(status.as_u16(), error_message(text)))
        }
    }

    async fn handle_empty_response(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::from_status(status.as_u16(), error_message(text)))
        }
    }
}

/// Extracts `error` from a JSON error body, or returns the raw text.
fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => body,
    }
}
