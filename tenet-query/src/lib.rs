//! # tenet-query
//!
//! Tenant-scoped query primitives for the Tenet data-access layer.
//!
//! This crate provides the driver-agnostic core of a multi-tenant
//! persistence stack:
//! - Typed tenant identity ([`tenant::TenantId`]) with fail-closed parsing
//! - Ambient tenant context over Tokio task-locals ([`tenant::with_context`])
//! - PostgreSQL row-level security statement generation ([`tenant::rls`])
//! - Predicate building ([`Filter`]) and tenant merging ([`scope::scope`])
//! - Generic query operations over the [`traits::QueryEngine`] seam
//!
//! ## Tenant scoping
//!
//! Every repository predicate passes through [`scope::scope`], which merges
//! the tenant condition element-wise — an OR list keeps its length:
//!
//! ```rust
//! use tenet_query::scope::{scope, Where};
//! use tenet_query::{Filter, tenant::TenantId};
//!
//! let tenant = TenantId::parse("11111111-1111-1111-1111-111111111111").unwrap();
//!
//! let scoped = scope(
//!     Some(Where::Any(vec![
//!         Filter::Equals("id".into(), "a".into()),
//!         Filter::Equals("status".into(), "x".into()),
//!     ])),
//!     &tenant,
//!     "tenant_id",
//! );
//!
//! match scoped {
//!     Where::Any(branches) => assert_eq!(branches.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Filters
//!
//! ```rust
//! use tenet_query::{Filter, FilterValue};
//!
//! let filter = Filter::and([
//!     Filter::Equals("status".into(), FilterValue::String("queued".into())),
//!     Filter::Gt("page_count".into(), FilterValue::Int(10)),
//! ]);
//!
//! let (sql, params) = filter.to_sql(0);
//! assert_eq!(sql, "(status = $1 AND page_count > $2)");
//! assert_eq!(params.len(), 2);
//! ```
//!
//! ## Row-level security
//!
//! ```rust
//! use tenet_query::tenant::rls::{RlsConfig, RlsManager};
//!
//! let rls = RlsManager::new(RlsConfig::new("tenant_id").add_tables(["documents"]));
//! let setup = rls.setup_sql();
//! assert!(setup.contains("FORCE ROW LEVEL SECURITY"));
//! ```

pub mod data;
pub mod error;
pub mod filter;
pub mod logging;
pub mod operations;
pub mod scope;
pub mod tenant;
pub mod traits;
pub mod transaction;

pub use data::{Changes, Record};
pub use error::{ErrorCode, QueryError, QueryResult};
pub use filter::{Filter, FilterValue};
pub use operations::{
    CountOperation, DeleteOperation, FindFirstOperation, FindManyOperation, UpdateOperation,
};
pub use scope::{Where, scope};
pub use tenant::{TenantContext, TenantId};
pub use traits::{BoxFuture, Model, QueryEngine};
pub use transaction::{AccessMode, IsolationLevel, TransactionConfig};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::data::{Changes, Record};
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::scope::{Where, scope};
    pub use crate::tenant::{TenantContext, TenantId};
    pub use crate::traits::{Model, QueryEngine};
}
