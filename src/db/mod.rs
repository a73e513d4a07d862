//! Persistence: PostgreSQL pool, in-memory store and the records they hold.

mod memory;
mod pool;
mod postgres;
mod schema;
mod store;

pub use memory::MemoryStore;
pub use pool::DatabasePool;
pub use schema::*;
pub use store::{LedgerStore, StoreError, StoreResult};
