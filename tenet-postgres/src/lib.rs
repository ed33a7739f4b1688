//! # tenet-postgres
//!
//! PostgreSQL driver for Tenet: connection pooling over `deadpool-postgres`,
//! transactions that bind the row-level security tenant variable with
//! `SET LOCAL`, and tenant-aware repositories that merge the tenant
//! condition into every predicate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tenet_postgres::{PgPool, TenantRepository, TransactionManager};
//! use tenet_postgres::repository::FindOptions;
//!
//! # struct Document;
//! # impl tenet_query::traits::Model for Document { /* ... */ }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPool::builder()
//!         .url("postgresql://app@localhost/tenet")
//!         .max_connections(10)
//!         .build()?;
//!
//!     let manager = Arc::new(TransactionManager::new(pool));
//!     let documents: TenantRepository<Document> = TenantRepository::new(manager);
//!
//!     let all = documents
//!         .find_many("11111111-1111-1111-1111-111111111111", None, FindOptions::new(), None)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod repository;
pub mod transaction;
pub mod types;

pub use config::{PgConfig, PgConfigBuilder, SslMode};
pub use connection::{PgConnection, PgTransaction};
pub use error::{PgError, PgResult};
pub use pool::{PgPool, PgPoolBuilder, PoolConfig, PoolStatus};
pub use repository::{FindOptions, TenantRepository};
pub use transaction::TransactionManager;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{PgConfig, PgConfigBuilder};
    pub use crate::connection::{PgConnection, PgTransaction};
    pub use crate::error::{PgError, PgResult};
    pub use crate::pool::{PgPool, PgPoolBuilder};
    pub use crate::repository::{FindOptions, TenantRepository};
    pub use crate::transaction::TransactionManager;
}
