//! Tenant-aware repository over a [`TransactionManager`].
//!
//! The repository holds no per-request state: the tenant id is a parameter
//! of every call, validated synchronously before any I/O, and the merged
//! tenant predicate is handed to the delegate exactly once. One instance
//! serves concurrent requests for any number of tenants.

use std::marker::PhantomData;
use std::sync::Arc;

use tenet_query::data::Changes;
use tenet_query::error::{QueryError, QueryResult};
use tenet_query::filter::Filter;
use tenet_query::operations::{
    CountOperation, DeleteOperation, FindFirstOperation, FindManyOperation, UpdateOperation,
};
use tenet_query::scope::{Where, scope};
use tenet_query::tenant::TenantId;
use tenet_query::traits::{Model, QueryEngine};
use tracing::debug;

use crate::connection::PgTransaction;
use crate::transaction::TransactionManager;

/// Options for find operations.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// LIMIT.
    pub take: Option<i64>,
    /// OFFSET.
    pub skip: Option<i64>,
    /// Raw ORDER BY expression.
    pub order_by: Option<String>,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
}

impl FindOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of rows returned.
    pub fn take(mut self, n: i64) -> Self {
        self.take = Some(n);
        self
    }

    /// Skip rows before returning.
    pub fn skip(mut self, n: i64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Order by a raw column expression.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Include rows marked soft-deleted.
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// A repository whose every operation is scoped to one tenant.
///
/// Each call accepts the tenant id as a string, the operation's normal
/// arguments, and an optional open transaction handle. With a handle the
/// call delegates directly on it; without one, a single transaction is
/// opened around the call.
pub struct TenantRepository<M: Model> {
    manager: Arc<TransactionManager>,
    _model: PhantomData<M>,
}

impl<M: Model> Clone for TenantRepository<M> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> TenantRepository<M> {
    /// Create a repository over a transaction manager.
    pub fn new(manager: Arc<TransactionManager>) -> Self {
        Self {
            manager,
            _model: PhantomData,
        }
    }

    /// Find all records matching `filter` within the tenant.
    pub async fn find_many(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        options: FindOptions,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<Vec<M>> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = self.scoped(filter, &tenant, options.include_deleted);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "find_many");

        match txn {
            Some(txn) => Self::exec_find_many(txn, scoped, &options).await,
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move { Self::exec_find_many(txn, scoped, &options).await })
                    })
                    .await
            }
        }
    }

    /// Find the first record matching `filter` within the tenant.
    pub async fn find_first(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        options: FindOptions,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<Option<M>> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = self.scoped(filter, &tenant, options.include_deleted);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "find_first");

        match txn {
            Some(txn) => Self::exec_find_first(txn, scoped, &options).await,
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move { Self::exec_find_first(txn, scoped, &options).await })
                    })
                    .await
            }
        }
    }

    /// Find matching records and the total matching count in one unit.
    ///
    /// Without a handle, both queries run inside the same transaction.
    pub async fn find_and_count(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        options: FindOptions,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<(Vec<M>, u64)> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = self.scoped(filter, &tenant, options.include_deleted);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "find_and_count");

        match txn {
            Some(txn) => {
                let rows = Self::exec_find_many(txn, scoped.clone(), &options).await?;
                let total = CountOperation::<_, M>::new(txn, scoped).exec().await?;
                Ok((rows, total))
            }
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move {
                            let rows = Self::exec_find_many(txn, scoped.clone(), &options).await?;
                            let total = CountOperation::<_, M>::new(txn, scoped).exec().await?;
                            Ok((rows, total))
                        })
                    })
                    .await
            }
        }
    }

    /// Count records matching `filter` within the tenant.
    pub async fn count(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        options: FindOptions,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<u64> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = self.scoped(filter, &tenant, options.include_deleted);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "count");

        match txn {
            Some(txn) => CountOperation::<_, M>::new(txn, scoped).exec().await,
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move {
                            CountOperation::<_, M>::new(txn, scoped).exec().await
                        })
                    })
                    .await
            }
        }
    }

    /// Apply `changes` to all records matching `filter` within the tenant.
    pub async fn update(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        changes: Changes,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<u64> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = scope(filter, &tenant, M::TENANT_COLUMN);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "update");

        match txn {
            Some(txn) => {
                UpdateOperation::<_, M>::new(txn, scoped, changes)
                    .exec()
                    .await
            }
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move {
                            UpdateOperation::<_, M>::new(txn, scoped, changes)
                                .exec()
                                .await
                        })
                    })
                    .await
            }
        }
    }

    /// Permanently delete all records matching `filter` within the tenant.
    pub async fn delete(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<u64> {
        let tenant = TenantId::parse(tenant_id)?;
        let scoped = scope(filter, &tenant, M::TENANT_COLUMN);
        debug!(model = M::MODEL_NAME, tenant_id = %tenant, "delete");

        match txn {
            Some(txn) => DeleteOperation::<_, M>::new(txn, scoped).exec().await,
            None => {
                self.manager
                    .run_with_tenant(&tenant, move |txn| {
                        Box::pin(async move {
                            DeleteOperation::<_, M>::new(txn, scoped).exec().await
                        })
                    })
                    .await
            }
        }
    }

    /// Mark matching records as deleted by setting the soft-delete column.
    ///
    /// Errors when the model declares no soft-delete column.
    pub async fn soft_delete(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<u64> {
        let column = Self::soft_delete_column()?;
        self.update(tenant_id, filter, Changes::new().set_now(column), txn)
            .await
    }

    /// Clear the soft-delete column on matching records.
    pub async fn restore(
        &self,
        tenant_id: &str,
        filter: Option<Where>,
        txn: Option<&PgTransaction<'_>>,
    ) -> QueryResult<u64> {
        let column = Self::soft_delete_column()?;
        self.update(tenant_id, filter, Changes::new().set_null(column), txn)
            .await
    }

    /// Merge the tenant condition, and the live-rows condition when the
    /// model soft-deletes, into the caller's predicate.
    fn scoped(&self, filter: Option<Where>, tenant: &TenantId, include_deleted: bool) -> Where {
        let scoped = scope(filter, tenant, M::TENANT_COLUMN);
        match M::SOFT_DELETE_COLUMN {
            Some(column) if !include_deleted => {
                scoped.and_each(Filter::IsNull(column.to_string()))
            }
            _ => scoped,
        }
    }

    fn soft_delete_column() -> QueryResult<&'static str> {
        M::SOFT_DELETE_COLUMN.ok_or_else(|| {
            QueryError::invalid_parameter("soft_delete", "model has no soft-delete column")
                .with_model(M::MODEL_NAME)
        })
    }

    async fn exec_find_many<E: QueryEngine>(
        engine: &E,
        filter: Where,
        options: &FindOptions,
    ) -> QueryResult<Vec<M>> {
        let mut op = FindManyOperation::<E, M>::new(engine, filter);
        if let Some(take) = options.take {
            op = op.take(take);
        }
        if let Some(skip) = options.skip {
            op = op.skip(skip);
        }
        if let Some(ref order) = options.order_by {
            op = op.order_by(order.clone());
        }
        op.exec().await
    }

    async fn exec_find_first<E: QueryEngine>(
        engine: &E,
        filter: Where,
        options: &FindOptions,
    ) -> QueryResult<Option<M>> {
        let mut op = FindFirstOperation::<E, M>::new(engine, filter);
        if let Some(ref order) = options.order_by {
            op = op.order_by(order.clone());
        }
        op.exec().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PgPool;
    use pretty_assertions::assert_eq;
    use tenet_query::ErrorCode;
    use tenet_query::data::Record;
    use uuid::Uuid;

    #[derive(Debug)]
    struct Document {
        #[allow(dead_code)]
        id: Uuid,
    }

    impl Model for Document {
        const MODEL_NAME: &'static str = "Document";
        const TABLE_NAME: &'static str = "documents";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const COLUMNS: &'static [&'static str] = &["id", "tenant_id", "name", "deleted_at"];
        const SOFT_DELETE_COLUMN: Option<&'static str> = Some("deleted_at");

        fn from_record(record: &Record) -> QueryResult<Self> {
            Ok(Self {
                id: record.require_uuid("id")?,
            })
        }
    }

    struct Plan;

    impl Model for Plan {
        const MODEL_NAME: &'static str = "Plan";
        const TABLE_NAME: &'static str = "plans";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const COLUMNS: &'static [&'static str] = &["id", "tenant_id", "name"];

        fn from_record(_record: &Record) -> QueryResult<Self> {
            Ok(Self)
        }
    }

    // Pool construction is lazy, so a repository over an unreachable host
    // exercises every pre-I/O code path offline.
    fn offline_repo<M: Model>() -> TenantRepository<M> {
        let pool = PgPool::builder()
            .url("postgresql://nobody@127.0.0.1:1/unreachable")
            .build()
            .unwrap();
        TenantRepository::new(Arc::new(TransactionManager::new(pool)))
    }

    #[tokio::test]
    async fn test_malformed_tenant_fails_before_io() {
        let repo = offline_repo::<Document>();

        let err = repo
            .find_many("not-a-uuid", None, FindOptions::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTenantId);
    }

    #[tokio::test]
    async fn test_empty_tenant_fails_before_io() {
        let repo = offline_repo::<Document>();

        let err = repo.count("", None, FindOptions::new(), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTenantId);
    }

    #[tokio::test]
    async fn test_malformed_tenant_fails_for_writes() {
        let repo = offline_repo::<Document>();

        let err = repo
            .update(
                "11111111",
                None,
                Changes::new().set("name", "renamed"),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTenantId);

        let err = repo.delete("11111111", None, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTenantId);
    }

    #[tokio::test]
    async fn test_soft_delete_requires_column() {
        let repo = offline_repo::<Plan>();

        let err = repo
            .soft_delete("11111111-1111-1111-1111-111111111111", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);

        let err = repo
            .restore("11111111-1111-1111-1111-111111111111", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_scoped_merges_tenant_and_live_rows() {
        let repo = offline_repo::<Document>();
        let tenant = TenantId::new(Uuid::from_u128(1));

        let scoped = repo.scoped(
            Some(Where::Any(vec![
                Filter::Equals("id".into(), "a".into()),
                Filter::Equals("status".into(), "x".into()),
            ])),
            &tenant,
            false,
        );

        // Element-wise merge keeps the OR list's length.
        match scoped {
            Where::Any(branches) => assert_eq!(branches.len(), 2),
            other => panic!("expected Any, got {other:?}"),
        }
    }

    #[test]
    fn test_scoped_with_deleted_skips_live_rows_filter() {
        let repo = offline_repo::<Document>();
        let tenant = TenantId::new(Uuid::from_u128(1));

        let scoped = repo.scoped(None, &tenant, true);
        let (sql, params) = scoped.to_sql(0);
        assert_eq!(sql, "tenant_id = $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_scoped_excludes_soft_deleted_by_default() {
        let repo = offline_repo::<Document>();
        let tenant = TenantId::new(Uuid::from_u128(1));

        let scoped = repo.scoped(None, &tenant, false);
        let (sql, _) = scoped.to_sql(0);
        assert_eq!(sql, "(tenant_id = $1 AND deleted_at IS NULL)");
    }
}
