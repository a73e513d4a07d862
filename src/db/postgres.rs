//! PostgreSQL implementation of [`LedgerStore`].

use super::pool::DatabasePool;
use super::schema::{CoveredCall, Portfolio, Stock, User};
use super::store::{LedgerStore, StoreResult};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

#[async_trait]
impl LedgerStore for DatabasePool {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE provider = $1 AND provider_id = $2",
        )
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, provider, provider_id, picture, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.provider)
        .bind(&user.provider_id)
        .bind(&user.picture)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool())
        .await?;

        debug!(user_id = %user.id, "Inserted user");
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, picture = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.picture)
        .bind(user.updated_at)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn list_portfolios(&self, user_id: &str) -> StoreResult<Vec<Portfolio>> {
        let portfolios = sqlx::query_as::<_, Portfolio>(
            "SELECT * FROM portfolios WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(portfolios)
    }

    async fn find_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Portfolio>> {
        let portfolio = sqlx::query_as::<_, Portfolio>(
            "SELECT * FROM portfolios WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(portfolio)
    }

    async fn insert_portfolio(&self, portfolio: &Portfolio) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO portfolios (id, user_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(portfolio.id)
        .bind(&portfolio.user_id)
        .bind(&portfolio.name)
        .bind(portfolio.created_at)
        .bind(portfolio.updated_at)
        .execute(self.pool())
        .await?;

        debug!(portfolio_id = %portfolio.id, "Inserted portfolio");
        Ok(())
    }

    async fn update_portfolio(&self, portfolio: &Portfolio) -> StoreResult<bool> {
        let rows = sqlx::query(
            "UPDATE portfolios SET name = $3, updated_at = $4 WHERE id = $1 AND user_id = $2",
        )
        .bind(portfolio.id)
        .bind(&portfolio.user_id)
        .bind(&portfolio.name)
        .bind(portfolio.updated_at)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn delete_portfolio(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        // Stocks and covered calls go with it through ON DELETE CASCADE.
        let rows = sqlx::query("DELETE FROM portfolios WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn list_stocks(
        &self,
        user_id: &str,
        portfolio_id: Option<Uuid>,
    ) -> StoreResult<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(
            r#"
            SELECT * FROM stocks
            WHERE user_id = $1 AND ($2::UUID IS NULL OR portfolio_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(portfolio_id)
        .fetch_all(self.pool())
        .await?;
        Ok(stocks)
    }

    async fn find_stock(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Stock>> {
        let stock =
            sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(stock)
    }

    async fn insert_stock(&self, stock: &Stock) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stocks (id, user_id, portfolio_id, symbol, basis, shares, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(stock.id)
        .bind(&stock.user_id)
        .bind(stock.portfolio_id)
        .bind(&stock.symbol)
        .bind(stock.basis)
        .bind(stock.shares)
        .bind(stock.created_at)
        .bind(stock.updated_at)
        .execute(self.pool())
        .await?;

        debug!(stock_id = %stock.id, symbol = %stock.symbol, "Inserted stock");
        Ok(())
    }

    async fn update_stock(&self, stock: &Stock) -> StoreResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE stocks
            SET basis = $3, shares = $4, updated_at = $5
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(stock.id)
        .bind(&stock.user_id)
        .bind(stock.basis)
        .bind(stock.shares)
        .bind(stock.updated_at)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn delete_stock(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM stocks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn list_covered_calls(
        &self,
        user_id: &str,
        stock_id: Option<Uuid>,
    ) -> StoreResult<Vec<CoveredCall>> {
        let calls = sqlx::query_as::<_, CoveredCall>(
            r#"
            SELECT * FROM covered_calls
            WHERE user_id = $1 AND ($2::UUID IS NULL OR stock_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(stock_id)
        .fetch_all(self.pool())
        .await?;
        Ok(calls)
    }

    async fn find_covered_call(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> StoreResult<Option<CoveredCall>> {
        let call = sqlx::query_as::<_, CoveredCall>(
            "SELECT * FROM covered_calls WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(call)
    }

    async fn insert_covered_call(&self, call: &CoveredCall) -> StoreResult<bool> {
        // The stock row is share-locked while the guard is evaluated, so a
        // concurrent share update cannot slip between the check and the insert.
        let rows = sqlx::query(
            r#"
            INSERT INTO covered_calls (
                id, stock_id, user_id, portfolio_id, strike_price, premium_received,
                contracts, expiration_date, status, assignment_date, assignment_price,
                buyback_date, buyback_premium, total_premium, shares_covered,
                created_at, updated_at
            )
            SELECT $1, s.id, s.user_id, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
            FROM stocks s
            WHERE s.id = $2 AND s.user_id = $3 AND s.shares >= $18
            FOR SHARE
            "#,
        )
        .bind(call.id)
        .bind(call.stock_id)
        .bind(&call.user_id)
        .bind(call.portfolio_id)
        .bind(call.strike_price)
        .bind(call.premium_received)
        .bind(call.contracts)
        .bind(call.expiration_date)
        .bind(call.status)
        .bind(call.assignment_date)
        .bind(call.assignment_price)
        .bind(call.buyback_date)
        .bind(call.buyback_premium)
        .bind(call.total_premium)
        .bind(call.shares_covered)
        .bind(call.created_at)
        .bind(call.updated_at)
        .bind(call.shares_covered as f64)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows > 0 {
            debug!(call_id = %call.id, stock_id = %call.stock_id, "Inserted covered call");
        }
        Ok(rows > 0)
    }

    async fn update_covered_call(&self, call: &CoveredCall) -> StoreResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE covered_calls
            SET status = $3, assignment_date = $4, assignment_price = $5,
                buyback_date = $6, buyback_premium = $7, updated_at = $8
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(call.id)
        .bind(&call.user_id)
        .bind(call.status)
        .bind(call.assignment_date)
        .bind(call.assignment_price)
        .bind(call.buyback_date)
        .bind(call.buyback_premium)
        .bind(call.updated_at)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn delete_covered_call(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM covered_calls WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
