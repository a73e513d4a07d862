//! Storage abstraction consumed by the ledger.

use super::schema::{CoveredCall, Portfolio, Stock, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed.
    #[error("storage failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for ledger records.
///
/// Every lookup, update and delete of portfolios, stocks and covered calls is
/// scoped by the owning user id. A record owned by someone else behaves
/// exactly like a missing one: `None` from lookups, `false` from updates and
/// deletes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Finds a user by id.
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Finds a user by OAuth provider and provider subject.
    async fn find_user_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> StoreResult<Option<User>>;

    /// Inserts a new user.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Overwrites the profile fields of an existing user.
    async fn update_user(&self, user: &User) -> StoreResult<bool>;

    /// Lists the portfolios of a user, newest first.
    async fn list_portfolios(&self, user_id: &str) -> StoreResult<Vec<Portfolio>>;

    /// Finds a portfolio owned by `user_id`.
    async fn find_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Portfolio>>;

    /// Inserts a new portfolio.
    async fn insert_portfolio(&self, portfolio: &Portfolio) -> StoreResult<()>;

    /// Overwrites the mutable fields of a portfolio.
    async fn update_portfolio(&self, portfolio: &Portfolio) -> StoreResult<bool>;

    /// Deletes a portfolio together with its stocks and their covered calls.
    async fn delete_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;

    /// Lists the stocks of a user, optionally restricted to one portfolio,
    /// newest first.
    async fn list_stocks(
        &self,
        user_id: &str,
        portfolio_id: Option<Uuid>,
    ) -> StoreResult<Vec<Stock>>;

    /// Finds a stock owned by `user_id`.
    async fn find_stock(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Stock>>;

    /// Inserts a new stock.
    async fn insert_stock(&self, stock: &Stock) -> StoreResult<()>;

    /// Overwrites the mutable fields of a stock.
    async fn update_stock(&self, stock: &Stock) -> StoreResult<bool>;

    /// Deletes a stock together with its covered calls.
    async fn delete_stock(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;

    /// Lists covered calls of a user, optionally restricted to one stock,
    /// newest first.
    async fn list_covered_calls(
        &self,
        user_id: &str,
        stock_id: Option<Uuid>,
    ) -> StoreResult<Vec<CoveredCall>>;

    /// Finds a covered call owned by `user_id`.
    async fn find_covered_call(&self, user_id: &str, id: Uuid)
    -> StoreResult<Option<CoveredCall>>;

    /// Inserts a covered call if its stock still belongs to the same user and
    /// still holds at least `call.shares_covered` shares.
    ///
    /// The check and the insert are atomic. Returns `false`, persisting
    /// nothing, when the guard fails.
    async fn insert_covered_call(&self, call: &CoveredCall) -> StoreResult<bool>;

    /// Overwrites the status and close fields of a covered call.
    async fn update_covered_call(&self, call: &CoveredCall) -> StoreResult<bool>;

    /// Deletes a covered call.
    async fn delete_covered_call(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;
}
