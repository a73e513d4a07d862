//! Position ledger: users, portfolios, stock holdings and covered calls.
//!
//! Every operation takes the authenticated user id and scopes all lookups by
//! it. A record owned by another user is reported exactly like a missing one.

mod metrics;
mod status;


pub use metrics::{SHARES_PER_CONTRACT, StockMetrics};
pub use status::{CallStatus, InvalidTransition};

use crate::db::{CoveredCall, LedgerStore, Portfolio, Stock, StoreError, User};
use crate::models::{
    CoveredCallResponse, CoveredCallTerms, CreatePortfolioRequest, CreateStockRequest,
    OAuthRequest, PortfolioResponse, StockResponse, SyncUserRequest, UpdateCoveredCallRequest,
    UpdatePortfolioRequest, UpdateStockRequest,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// OAuth providers accepted at sign-in.
pub const OAUTH_PROVIDERS: [&str; 2] = ["google", "apple"];

/// Ledger error types.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Entity absent or owned by someone else.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input or a rule violation.
    #[error("{0}")]
    Validation(String),

    /// Storage failure.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => LedgerError::Validation(msg),
            StoreError::Backend(msg) => {
                error!("Storage failure: {}", msg);
                LedgerError::Internal(msg)
            }
        }
    }
}

impl From<InvalidTransition> for LedgerError {
    fn from(err: InvalidTransition) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

fn not_found(what: &str) -> LedgerError {
    LedgerError::NotFound(format!("{} not found", what))
}

fn require_non_negative(field: &str, value: f64) -> LedgerResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "{} must be a non-negative number",
            field
        )))
    }
}

fn require_non_empty(field: &str, value: &str) -> LedgerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Builds a pending covered call against `stock`.
///
/// # Errors
/// Validation when the terms are malformed or `contracts * 100` exceeds the
/// holding's shares.
pub fn write_covered_call(stock: &Stock, terms: &CoveredCallTerms) -> LedgerResult<CoveredCall> {
    if terms.contracts <= 0 {
        return Err(LedgerError::Validation(
            "contracts must be a positive integer".to_string(),
        ));
    }
    require_non_negative("strike_price", terms.strike_price)?;
    require_non_negative("premium_received", terms.premium_received)?;

    let shares_covered = i64::from(terms.contracts) * SHARES_PER_CONTRACT;
    if shares_covered as f64 > stock.shares {
        return Err(LedgerError::Validation(
            "Insufficient shares to cover the call".to_string(),
        ));
    }

    let now = Utc::now();
    Ok(CoveredCall {
        id: Uuid::new_v4(),
        stock_id: stock.id,
        user_id: stock.user_id.clone(),
        portfolio_id: stock.portfolio_id,
        strike_price: terms.strike_price,
        premium_received: terms.premium_received,
        contracts: terms.contracts,
        expiration_date: terms.expiration_date,
        status: CallStatus::Pending,
        assignment_date: None,
        assignment_price: None,
        buyback_date: None,
        buyback_premium: None,
        total_premium: terms.premium_received * f64::from(terms.contracts) * 100.0,
        shares_covered,
        created_at: now,
        updated_at: now,
    })
}

/// Position ledger over an injected store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    /// Creates a ledger backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Finds or creates the user named by the identity provider, refreshing
    /// name and email when it already exists.
    pub async fn sync_user(&self, req: SyncUserRequest) -> LedgerResult<User> {
        let id = require_non_empty("id", &req.id)?;
        let email = require_non_empty("email", &req.email)?;
        let name = require_non_empty("name", &req.name)?;
        let now = Utc::now();

        match self.store.find_user(&id).await? {
            Some(mut user) => {
                user.name = name;
                user.email = email;
                user.updated_at = now;
                self.store.update_user(&user).await?;
                Ok(user)
            }
            None => {
                let user = User {
                    id,
                    name,
                    email,
                    provider: None,
                    provider_id: None,
                    picture: None,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_user(&user).await?;
                info!(user_id = %user.id, "Created user from sync");
                Ok(user)
            }
        }
    }

    /// Signs in through an OAuth provider. Returns the user and whether the
    /// account was created by this call.
    pub async fn sign_in_oauth(&self, req: OAuthRequest) -> LedgerResult<(User, bool)> {
        if !OAUTH_PROVIDERS.contains(&req.provider.as_str()) {
            return Err(LedgerError::Validation(
                "Invalid provider. Must be 'google' or 'apple'".to_string(),
            ));
        }
        let provider_id = require_non_empty("providerId", &req.provider_id)?;
        let email = require_non_empty("email", &req.email)?;
        let name = require_non_empty("name", &req.name)?;
        let now = Utc::now();

        match self
            .store
            .find_user_by_provider(&req.provider, &provider_id)
            .await?
        {
            Some(mut user) => {
                user.name = name;
                user.email = email;
                user.picture = req.picture;
                user.updated_at = now;
                self.store.update_user(&user).await?;
                Ok((user, false))
            }
            None => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    name,
                    email,
                    provider: Some(req.provider),
                    provider_id: Some(provider_id),
                    picture: req.picture,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_user(&user).await?;
                info!(user_id = %user.id, provider = ?user.provider, "Created user from OAuth sign-in");
                Ok((user, true))
            }
        }
    }

    /// Loads a user record.
    pub async fn get_user(&self, user_id: &str) -> LedgerResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| not_found("User"))
    }

    // ========================================================================
    // Portfolios
    // ========================================================================

    /// Lists the caller's portfolios, newest first.
    pub async fn list_portfolios(&self, user_id: &str) -> LedgerResult<Vec<Portfolio>> {
        Ok(self.store.list_portfolios(user_id).await?)
    }

    /// Creates a portfolio.
    pub async fn create_portfolio(
        &self,
        user_id: &str,
        req: CreatePortfolioRequest,
    ) -> LedgerResult<Portfolio> {
        let name = require_non_empty("name", &req.name)?;
        let now = Utc::now();
        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_portfolio(&portfolio).await?;
        info!(portfolio_id = %portfolio.id, "Created portfolio");
        Ok(portfolio)
    }

    /// Loads a portfolio with its holdings and their metrics.
    pub async fn get_portfolio(&self, user_id: &str, id: Uuid) -> LedgerResult<PortfolioResponse> {
        let portfolio = self
            .store
            .find_portfolio(user_id, id)
            .await?
            .ok_or_else(|| not_found("Portfolio"))?;
        let stocks = self.list_stocks(user_id, Some(id)).await?;
        Ok(PortfolioResponse { portfolio, stocks })
    }

    /// Renames a portfolio.
    pub async fn update_portfolio(
        &self,
        user_id: &str,
        id: Uuid,
        req: UpdatePortfolioRequest,
    ) -> LedgerResult<Portfolio> {
        let mut portfolio = self
            .store
            .find_portfolio(user_id, id)
            .await?
            .ok_or_else(|| not_found("Portfolio"))?;

        if let Some(name) = req.name {
            portfolio.name = require_non_empty("name", &name)?;
        }
        portfolio.updated_at = Utc::now();

        if !self.store.update_portfolio(&portfolio).await? {
            return Err(not_found("Portfolio"));
        }
        Ok(portfolio)
    }

    /// Deletes a portfolio, its holdings and their covered calls.
    pub async fn delete_portfolio(&self, user_id: &str, id: Uuid) -> LedgerResult<()> {
        if !self.store.delete_portfolio(user_id, id).await? {
            return Err(not_found("Portfolio"));
        }
        info!(portfolio_id = %id, "Deleted portfolio");
        Ok(())
    }

    // ========================================================================
    // Stocks
    // ========================================================================

    /// Lists holdings with their covered calls and metrics.
    ///
    /// When `portfolio_id` is given it must name one of the caller's
    /// portfolios.
    pub async fn list_stocks(
        &self,
        user_id: &str,
        portfolio_id: Option<Uuid>,
    ) -> LedgerResult<Vec<StockResponse>> {
        if let Some(id) = portfolio_id
            && self.store.find_portfolio(user_id, id).await?.is_none()
        {
            return Err(not_found("Portfolio"));
        }

        let stocks = self.store.list_stocks(user_id, portfolio_id).await?;
        let mut calls_by_stock: HashMap<Uuid, Vec<CoveredCall>> = HashMap::new();
        for call in self.store.list_covered_calls(user_id, None).await? {
            calls_by_stock.entry(call.stock_id).or_default().push(call);
        }

        Ok(stocks
            .into_iter()
            .map(|stock| {
                let calls = calls_by_stock.remove(&stock.id).unwrap_or_default();
                with_metrics(stock, calls)
            })
            .collect())
    }

    /// Adds a holding.
    pub async fn create_stock(
        &self,
        user_id: &str,
        req: CreateStockRequest,
    ) -> LedgerResult<StockResponse> {
        require_non_negative("basis", req.basis)?;
        require_non_negative("shares", req.shares)?;

        if let Some(portfolio_id) = req.portfolio_id
            && self
                .store
                .find_portfolio(user_id, portfolio_id)
                .await?
                .is_none()
        {
            return Err(not_found("Portfolio"));
        }

        let now = Utc::now();
        let stock = Stock {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            portfolio_id: req.portfolio_id,
            symbol: req.symbol,
            basis: req.basis,
            shares: req.shares,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_stock(&stock).await?;
        info!(stock_id = %stock.id, symbol = %stock.symbol, "Created stock");
        Ok(with_metrics(stock, Vec::new()))
    }

    /// Loads a holding with its covered calls and metrics.
    pub async fn get_stock(&self, user_id: &str, id: Uuid) -> LedgerResult<StockResponse> {
        let stock = self.find_stock(user_id, id).await?;
        let calls = self.store.list_covered_calls(user_id, Some(id)).await?;
        Ok(with_metrics(stock, calls))
    }

    /// Applies a partial update to shares and basis.
    pub async fn update_stock(
        &self,
        user_id: &str,
        id: Uuid,
        req: UpdateStockRequest,
    ) -> LedgerResult<StockResponse> {
        let mut stock = self.find_stock(user_id, id).await?;

        if let Some(shares) = req.shares {
            require_non_negative("shares", shares)?;
            stock.shares = shares;
        }
        if let Some(basis) = req.basis {
            require_non_negative("basis", basis)?;
            stock.basis = basis;
        }
        stock.updated_at = Utc::now();

        if !self.store.update_stock(&stock).await? {
            return Err(not_found("Stock"));
        }
        let calls = self.store.list_covered_calls(user_id, Some(id)).await?;
        Ok(with_metrics(stock, calls))
    }

    /// Deletes a holding and its covered calls.
    pub async fn delete_stock(&self, user_id: &str, id: Uuid) -> LedgerResult<()> {
        if !self.store.delete_stock(user_id, id).await? {
            return Err(not_found("Stock"));
        }
        info!(stock_id = %id, "Deleted stock");
        Ok(())
    }

    async fn find_stock(&self, user_id: &str, id: Uuid) -> LedgerResult<Stock> {
        self.store
            .find_stock(user_id, id)
            .await?
            .ok_or_else(|| not_found("Stock"))
    }

    // ========================================================================
    // Covered Calls
    // ========================================================================

    /// Lists the caller's covered calls, newest first, optionally for one
    /// holding.
    pub async fn list_covered_calls(
        &self,
        user_id: &str,
        stock_id: Option<Uuid>,
    ) -> LedgerResult<Vec<CoveredCallResponse>> {
        let symbols: HashMap<Uuid, String> = match stock_id {
            Some(id) => {
                let stock = self.find_stock(user_id, id).await?;
                HashMap::from([(stock.id, stock.symbol)])
            }
            None => self
                .store
                .list_stocks(user_id, None)
                .await?
                .into_iter()
                .map(|s| (s.id, s.symbol))
                .collect(),
        };

        let calls = self.store.list_covered_calls(user_id, stock_id).await?;
        Ok(calls
            .into_iter()
            .map(|call| {
                let symbol = symbols.get(&call.stock_id).cloned().unwrap_or_default();
                CoveredCallResponse { call, symbol }
            })
            .collect())
    }

    /// Writes a new covered call against one of the caller's holdings. The
    /// call always starts out pending.
    pub async fn create_covered_call(
        &self,
        user_id: &str,
        stock_id: Uuid,
        terms: CoveredCallTerms,
    ) -> LedgerResult<CoveredCallResponse> {
        let stock = self.find_stock(user_id, stock_id).await?;
        let call = write_covered_call(&stock, &terms)?;

        if !self.store.insert_covered_call(&call).await? {
            // The holding shrank or vanished between the read and the insert.
            return match self.store.find_stock(user_id, stock_id).await? {
                Some(_) => Err(LedgerError::Validation(
                    "Insufficient shares to cover the call".to_string(),
                )),
                None => Err(not_found("Stock")),
            };
        }

        info!(
            call_id = %call.id,
            stock_id = %stock.id,
            contracts = call.contracts,
            "Created covered call"
        );
        Ok(CoveredCallResponse {
            call,
            symbol: stock.symbol,
        })
    }

    /// Loads a covered call.
    pub async fn get_covered_call(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> LedgerResult<CoveredCallResponse> {
        let call = self.find_covered_call(user_id, id).await?;
        self.attach_symbol(user_id, call).await
    }

    /// Applies a partial update of status and close fields.
    ///
    /// A status change must follow the transition table; asking for the
    /// current status leaves it unchanged. Close fields are stored as given
    /// whatever the status.
    pub async fn update_covered_call(
        &self,
        user_id: &str,
        id: Uuid,
        req: UpdateCoveredCallRequest,
    ) -> LedgerResult<CoveredCallResponse> {
        let mut call = self.find_covered_call(user_id, id).await?;

        if let Some(next) = req.status
            && next != call.status
        {
            call.status = call.status.transition(next)?;
        }
        if req.assignment_date.is_some() {
            call.assignment_date = req.assignment_date;
        }
        if req.assignment_price.is_some() {
            call.assignment_price = req.assignment_price;
        }
        if req.buyback_date.is_some() {
            call.buyback_date = req.buyback_date;
        }
        if req.buyback_premium.is_some() {
            call.buyback_premium = req.buyback_premium;
        }
        call.updated_at = Utc::now();

        if !self.store.update_covered_call(&call).await? {
            return Err(not_found("Covered call"));
        }
        self.attach_symbol(user_id, call).await
    }

    /// Moves a pending covered call to active.
    pub async fn activate_covered_call(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> LedgerResult<CoveredCallResponse> {
        let mut call = self.find_covered_call(user_id, id).await?;

        if call.status != CallStatus::Pending {
            return Err(LedgerError::Validation(
                "Only pending calls can be activated".to_string(),
            ));
        }
        call.status = call.status.transition(CallStatus::Active)?;
        call.updated_at = Utc::now();

        if !self.store.update_covered_call(&call).await? {
            return Err(not_found("Covered call"));
        }
        info!(call_id = %call.id, "Activated covered call");
        self.attach_symbol(user_id, call).await
    }

    /// Deletes a covered call.
    pub async fn delete_covered_call(&self, user_id: &str, id: Uuid) -> LedgerResult<()> {
        if !self.store.delete_covered_call(user_id, id).await? {
            return Err(not_found("Covered call"));
        }
        Ok(())
    }

    async fn find_covered_call(&self, user_id: &str, id: Uuid) -> LedgerResult<CoveredCall> {
        self.store
            .find_covered_call(user_id, id)
            .await?
            .ok_or_else(|| not_found("Covered call"))
    }

    async fn attach_symbol(
        &self,
        user_id: &str,
        call: CoveredCall,
    ) -> LedgerResult<CoveredCallResponse> {
        let symbol = self
            .store
            .find_stock(user_id, call.stock_id)
            .await?
            .map(|s| s.symbol)
            .unwrap_or_default();
        Ok(CoveredCallResponse { call, symbol })
    }
}

fn with_metrics(stock: Stock, covered_calls: Vec<CoveredCall>) -> StockResponse {
    let metrics = StockMetrics::calculate(&stock, &covered_calls);
    StockResponse {
        stock,
        metrics,
        covered_calls,
    }
}
