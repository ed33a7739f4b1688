//! Tenant-bound transaction management.
//!
//! Every unit of work runs inside a single database transaction on one
//! pooled connection. When a tenant applies, the manager programs the RLS
//! session variable with `SET LOCAL` as the first thing inside that
//! transaction, so the binding can never outlive it; session-level `SET`
//! is deliberately not offered because a pooled connection would carry it
//! into a later checkout.

use tenet_query::error::{QueryError, QueryResult};
use tenet_query::tenant::{RlsManager, TenantContext, TenantId, current};
use tenet_query::traits::BoxFuture;
use tenet_query::transaction::TransactionConfig;
use tracing::{debug, warn};

use crate::connection::PgTransaction;
use crate::pool::PgPool;

/// Opens transactions and binds the tenant isolation variable for their
/// duration.
///
/// Two distinctly named entry points exist instead of one polymorphic
/// `run`: [`TransactionManager::run_with_tenant`] for an explicit tenant
/// and [`TransactionManager::run_from_context`] for the ambient one.
pub struct TransactionManager {
    pool: PgPool,
    rls: RlsManager,
    config: TransactionConfig,
}

impl TransactionManager {
    /// Create a manager with default RLS and transaction configuration.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            rls: RlsManager::default(),
            config: TransactionConfig::default(),
        }
    }

    /// Replace the RLS manager (variable names, policy layout).
    pub fn with_rls(mut self, rls: RlsManager) -> Self {
        self.rls = rls;
        self
    }

    /// Replace the transaction configuration.
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The RLS manager in use.
    pub fn rls(&self) -> &RlsManager {
        &self.rls
    }

    /// Run `f` inside a transaction bound to an explicit tenant.
    ///
    /// The explicit tenant always wins, even when an ambient context for a
    /// different tenant (or a bypass context) is active.
    pub async fn run_with_tenant<F, T>(&self, tenant_id: &TenantId, f: F) -> QueryResult<T>
    where
        F: for<'a, 'b> FnOnce(&'a PgTransaction<'b>) -> BoxFuture<'a, QueryResult<T>>,
    {
        self.run_bound(Some(*tenant_id), f).await
    }

    /// Run `f` inside a transaction bound from the ambient tenant context.
    ///
    /// A present, non-bypassing context binds its tenant id. A bypassing or
    /// absent context binds nothing: the transaction still runs, and with
    /// the isolation variable unset the row-level policies expose no
    /// tenant-owned rows.
    pub async fn run_from_context<F, T>(&self, f: F) -> QueryResult<T>
    where
        F: for<'a, 'b> FnOnce(&'a PgTransaction<'b>) -> BoxFuture<'a, QueryResult<T>>,
    {
        self.run_bound(binding_from(None, current().as_ref()), f).await
    }

    async fn run_bound<F, T>(&self, binding: Option<TenantId>, f: F) -> QueryResult<T>
    where
        F: for<'a, 'b> FnOnce(&'a PgTransaction<'b>) -> BoxFuture<'a, QueryResult<T>>,
    {
        let mut conn = self.pool.get().await.map_err(QueryError::from)?;
        let txn = conn.transaction().await.map_err(QueryError::from)?;

        match binding {
            Some(tenant_id) => debug!(tenant_id = %tenant_id, "binding tenant for transaction"),
            None => debug!("transaction opened without tenant binding"),
        }
        for sql in self.setup_sql(binding.as_ref()) {
            txn.batch_execute(&sql).await.map_err(QueryError::from)?;
        }

        match f(&txn).await {
            Ok(value) => {
                txn.commit().await.map_err(QueryError::from)?;
                Ok(value)
            }
            Err(err) => {
                // Propagate the delegate's error; a rollback failure only
                // gets logged, the connection is discarded either way.
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after query error");
                }
                Err(err)
            }
        }
    }

    /// Statements run at the start of a fresh transaction, in order.
    ///
    /// A binding contributes exactly one `SET LOCAL` of the isolation
    /// variable; no binding contributes none, the transaction itself still
    /// proceeds.
    fn setup_sql(&self, binding: Option<&TenantId>) -> Vec<String> {
        let mut statements = Vec::new();
        if self.config != TransactionConfig::default() {
            statements.push(set_transaction_sql(&self.config));
        }
        if let Some(tenant_id) = binding {
            statements.push(self.rls.set_tenant_local_sql(tenant_id));
        }
        statements
    }
}

/// Decide which tenant, if any, to bind for a transaction.
///
/// Explicit beats ambient; an ambient bypass context or no context at all
/// yields no binding.
pub fn binding_from(
    explicit: Option<&TenantId>,
    ambient: Option<&TenantContext>,
) -> Option<TenantId> {
    if let Some(id) = explicit {
        return Some(*id);
    }
    match ambient {
        Some(ctx) if ctx.should_bypass() => None,
        Some(ctx) => Some(ctx.tenant_id),
        None => None,
    }
}

fn set_transaction_sql(config: &TransactionConfig) -> String {
    format!(
        "SET TRANSACTION ISOLATION LEVEL {} {};",
        config.isolation.as_sql(),
        config.access_mode.as_sql()
    )
}
