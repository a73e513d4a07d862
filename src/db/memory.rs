//! In-memory implementation of [`LedgerStore`].
//!
//! Used when no database URL is configured and throughout the test suite.
//! All tables sit behind one lock so cascades and guarded inserts are atomic.

use super::schema::{CoveredCall, Portfolio, Stock, User};
use super::store::{LedgerStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    portfolios: HashMap<Uuid, Portfolio>,
    stocks: HashMap<Uuid, Stock>,
    covered_calls: HashMap<Uuid, CoveredCall>,
}

impl Tables {
    fn email_taken(&self, email: &str, except_id: &str) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && u.id != except_id)
    }

    /// Mirrors `UNIQUE (provider, provider_id)`: rows missing either part
    /// never collide.
    fn provider_taken(&self, user: &User) -> bool {
        let (Some(provider), Some(provider_id)) = (&user.provider, &user.provider_id) else {
            return false;
        };
        self.users.values().any(|u| {
            u.id != user.id
                && u.provider.as_ref() == Some(provider)
                && u.provider_id.as_ref() == Some(provider_id)
        })
    }

    fn remove_stock_cascade(&mut self, stock_id: Uuid) {
        self.stocks.remove(&stock_id);
        self.covered_calls.retain(|_, call| call.stock_id != stock_id);
    }
}

/// Volatile store holding every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored stocks across all users.
    #[must_use]
    pub fn stock_count(&self) -> usize {
        self.tables.read().stocks.len()
    }

    /// Number of stored covered calls across all users.
    #[must_use]
    pub fn covered_call_count(&self) -> usize {
        self.tables.read().covered_calls.len()
    }
}

/// Sorts newest first, matching `ORDER BY created_at DESC`.
fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn find_user_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| {
                u.provider.as_deref() == Some(provider)
                    && u.provider_id.as_deref() == Some(provider_id)
            })
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        if tables.email_taken(&user.email, &user.id) {
            return Err(StoreError::Conflict(format!(
                "email {} already in use",
                user.email
            )));
        }
        if tables.provider_taken(user) {
            return Err(StoreError::Conflict(format!(
                "{} account already linked",
                user.provider.as_deref().unwrap_or_default()
            )));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.email_taken(&user.email, &user.id) {
            return Err(StoreError::Conflict(format!(
                "email {} already in use",
                user.email
            )));
        }
        let Some(existing) = tables.users.get_mut(&user.id) else {
            return Ok(false);
        };
        existing.name = user.name.clone();
        existing.email = user.email.clone();
        existing.picture = user.picture.clone();
        existing.updated_at = user.updated_at;
        Ok(true)
    }

    async fn list_portfolios(&self, user_id: &str) -> StoreResult<Vec<Portfolio>> {
        let portfolios = self
            .tables
            .read()
            .portfolios
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(portfolios, |p: &Portfolio| p.created_at))
    }

    async fn find_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Portfolio>> {
        Ok(self
            .tables
            .read()
            .portfolios
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn insert_portfolio(&self, portfolio: &Portfolio) -> StoreResult<()> {
        self.tables
            .write()
            .portfolios
            .insert(portfolio.id, portfolio.clone());
        Ok(())
    }

    async fn update_portfolio(&self, portfolio: &Portfolio) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.portfolios.get_mut(&portfolio.id) {
            Some(existing) if existing.user_id == portfolio.user_id => {
                existing.name = portfolio.name.clone();
                existing.updated_at = portfolio.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if !tables
            .portfolios
            .get(&id)
            .is_some_and(|p| p.user_id == user_id)
        {
            return Ok(false);
        }

        tables.portfolios.remove(&id);
        let stock_ids: Vec<Uuid> = tables
            .stocks
            .values()
            .filter(|s| s.portfolio_id == Some(id))
            .map(|s| s.id)
            .collect();
        for stock_id in stock_ids {
            tables.remove_stock_cascade(stock_id);
        }
        tables
            .covered_calls
            .retain(|_, call| call.portfolio_id != Some(id));
        Ok(true)
    }

    async fn list_stocks(
        &self,
        user_id: &str,
        portfolio_id: Option<Uuid>,
    ) -> StoreResult<Vec<Stock>> {
        let stocks = self
            .tables
            .read()
            .stocks
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| portfolio_id.is_none() || s.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        Ok(newest_first(stocks, |s: &Stock| s.created_at))
    }

    async fn find_stock(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Stock>> {
        Ok(self
            .tables
            .read()
            .stocks
            .get(&id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn insert_stock(&self, stock: &Stock) -> StoreResult<()> {
        self.tables.write().stocks.insert(stock.id, stock.clone());
        Ok(())
    }

    async fn update_stock(&self, stock: &Stock) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.stocks.get_mut(&stock.id) {
            Some(existing) if existing.user_id == stock.user_id => {
                existing.basis = stock.basis;
                existing.shares = stock.shares;
                existing.updated_at = stock.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_stock(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if !tables.stocks.get(&id).is_some_and(|s| s.user_id == user_id) {
            return Ok(false);
        }
        tables.remove_stock_cascade(id);
        Ok(true)
    }

    async fn list_covered_calls(
        &self,
        user_id: &str,
        stock_id: Option<Uuid>,
    ) -> StoreResult<Vec<CoveredCall>> {
        let calls = self
            .tables
            .read()
            .covered_calls
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| stock_id.is_none_or(|id| c.stock_id == id))
            .cloned()
            .collect();
        Ok(newest_first(calls, |c: &CoveredCall| c.created_at))
    }

    async fn find_covered_call(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> StoreResult<Option<CoveredCall>> {
        Ok(self
            .tables
            .read()
            .covered_calls
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn insert_covered_call(&self, call: &CoveredCall) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let covered = tables.stocks.get(&call.stock_id).is_some_and(|s| {
            s.user_id == call.user_id && s.shares >= call.shares_covered as f64
        });
        if !covered {
            return Ok(false);
        }
        tables.covered_calls.insert(call.id, call.clone());
        Ok(true)
    }

    async fn update_covered_call(&self, call: &CoveredCall) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.covered_calls.get_mut(&call.id) {
            Some(existing) if existing.user_id == call.user_id => {
                existing.status = call.status;
                existing.assignment_date = call.assignment_date;
                existing.assignment_price = call.assignment_price;
                existing.buyback_date = call.buyback_date;
                existing.buyback_premium = call.buyback_premium;
                existing.updated_at = call.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_covered_call(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if !tables
            .covered_calls
            .get(&id)
            .is_some_and(|c| c.user_id == user_id)
        {
            return Ok(false);
        }
        tables.covered_calls.remove(&id);
        Ok(true)
    }
}
