//! Application state management.

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::db::{DatabasePool, LedgerStore, MemoryStore};
use crate::ledger::Ledger;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Position ledger.
    pub ledger: Ledger,
    /// Session token keys.
    pub sessions: SessionKeys,
    /// Application configuration.
    pub config: Config,
    /// Storage backend name reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Creates state over an arbitrary store.
    #[must_use]
    pub fn with_store(store: Arc<dyn LedgerStore>, storage: &'static str, config: Config) -> Self {
        let sessions = SessionKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        Self {
            ledger: Ledger::new(store),
            sessions,
            config,
            storage,
        }
    }

    /// Creates state backed by PostgreSQL.
    #[must_use]
    pub fn with_database(db: DatabasePool, config: Config) -> Self {
        info!("Using PostgreSQL storage");
        Self::with_store(Arc::new(db), "postgres", config)
    }

    /// Creates state backed by the in-memory store.
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        info!("Using in-memory storage; data is lost on restart");
        Self::with_store(Arc::new(MemoryStore::new()), "memory", config)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(Config::default())
    }
}
