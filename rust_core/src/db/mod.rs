//! PostgreSQL backing for the alias store.
//!
//! This module provides:
//! - Pool creation with `ALIAS_DB_*` overrides
//! - Retry with exponential backoff for transient failures
//! - `PgAliasStore`, the `AliasStore` adapter over `league_aliases` / `team_aliases`

pub mod alias_store;
pub mod pool;
pub mod retry;

pub use alias_store::PgAliasStore;
pub use pool::{create_pool, DbPoolConfig};
pub use retry::{execute_with_retry, RetryPolicy};
