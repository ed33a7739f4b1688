//! Tenant identity, ambient context, and row-level security.

pub mod context;
pub mod rls;
pub mod task_local;

pub use context::{TenantContext, TenantId};
pub use rls::{RlsConfig, RlsManager};
pub use task_local::{current, current_tenant_id, has_context, require, with_context, with_tenant};
