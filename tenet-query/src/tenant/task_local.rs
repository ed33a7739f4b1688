//! Ambient tenant context propagation over task-local storage.
//!
//! The context set by [`with_context`] is visible for the dynamic extent of
//! the wrapped future, across `.await` suspension points and through nested
//! calls, without being threaded through function arguments. Independent
//! tasks never observe each other's context.
//!
//! # Example
//!
//! ```rust,ignore
//! use tenet_query::tenant::{self, TenantContext, TenantId};
//!
//! let ctx = TenantContext::new(TenantId::parse(&claims.tenant_id)?);
//! tenant::with_context(ctx, async {
//!     // every repository call in here resolves the same tenant
//!     repo.find_many(&claims.tenant_id, None, Default::default(), None).await
//! })
//! .await?;
//! ```

use std::future::Future;

use super::context::{TenantContext, TenantId};
use crate::error::{QueryError, QueryResult};

tokio::task_local! {
    /// Task-local tenant context.
    static TENANT_CONTEXT: TenantContext;
}

/// Execute an async block with the given tenant context.
pub async fn with_context<F, T>(ctx: TenantContext, f: F) -> T
where
    F: Future<Output = T>,
{
    TENANT_CONTEXT.scope(ctx, f).await
}

/// Execute an async block with a plain (non-bypassing) tenant binding.
pub async fn with_tenant<F, T>(tenant_id: impl Into<TenantId>, f: F) -> T
where
    F: Future<Output = T>,
{
    with_context(TenantContext::new(tenant_id), f).await
}

/// Get the current tenant context if set.
#[inline]
pub fn current() -> Option<TenantContext> {
    TENANT_CONTEXT.try_with(|ctx| ctx.clone()).ok()
}

/// Get the current tenant ID if set.
///
/// Cheaper than [`current`] when only the ID is needed.
#[inline]
pub fn current_tenant_id() -> Option<TenantId> {
    TENANT_CONTEXT.try_with(|ctx| ctx.tenant_id).ok()
}

/// Check if a tenant context is currently active.
#[inline]
pub fn has_context() -> bool {
    TENANT_CONTEXT.try_with(|_| ()).is_ok()
}

/// Require a tenant context, failing with `TenantNotSet` when absent.
#[inline]
pub fn require() -> QueryResult<TenantContext> {
    current().ok_or_else(QueryError::tenant_not_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use uuid::Uuid;

    fn tid(n: u128) -> TenantId {
        TenantId::new(Uuid::from_u128(n))
    }

    #[tokio::test]
    async fn test_with_context() {
        let result = with_context(TenantContext::new(tid(1)), async { current_tenant_id() }).await;
        assert_eq!(result, Some(tid(1)));
    }

    #[tokio::test]
    async fn test_no_context() {
        assert!(current().is_none());
        assert!(!has_context());
        let err = require().unwrap_err();
        assert_eq!(err.code, ErrorCode::TenantNotSet);
    }

    #[tokio::test]
    async fn test_context_survives_await() {
        with_tenant(tid(7), async {
            tokio::task::yield_now().await;
            assert_eq!(current_tenant_id(), Some(tid(7)));
        })
        .await;
    }

    #[tokio::test]
    async fn test_nested_context_shadows() {
        with_tenant(tid(1), async {
            assert_eq!(current_tenant_id(), Some(tid(1)));

            with_tenant(tid(2), async {
                assert_eq!(current_tenant_id(), Some(tid(2)));
            })
            .await;

            // Back to the outer binding after the inner scope ends.
            assert_eq!(current_tenant_id(), Some(tid(1)));
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_isolated() {
        let a = tokio::spawn(with_tenant(tid(10), async {
            for _ in 0..50 {
                assert_eq!(current_tenant_id(), Some(tid(10)));
                tokio::task::yield_now().await;
            }
        }));
        let b = tokio::spawn(with_tenant(tid(20), async {
            for _ in 0..50 {
                assert_eq!(current_tenant_id(), Some(tid(20)));
                tokio::task::yield_now().await;
            }
        }));

        a.await.unwrap();
        b.await.unwrap();
    }

    #[tokio::test]
    async fn test_spawned_task_does_not_inherit() {
        with_tenant(tid(3), async {
            let handle = tokio::spawn(async { current_tenant_id() });
            assert_eq!(handle.await.unwrap(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_bypass_flag_visible() {
        with_context(TenantContext::bypass(tid(5)), async {
            let ctx = require().unwrap();
            assert!(ctx.should_bypass());
        })
        .await;
    }
}
