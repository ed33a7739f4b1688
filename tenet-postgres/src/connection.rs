//! PostgreSQL connection and transaction wrappers.

use deadpool_postgres::Object;
use tenet_query::data::Record;
use tenet_query::error::QueryResult;
use tenet_query::filter::FilterValue;
use tenet_query::traits::{BoxFuture, QueryEngine};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::debug;

use crate::error::PgResult;
use crate::types::{filter_values_to_params, row_to_record};

/// A pooled PostgreSQL connection.
pub struct PgConnection {
    client: Object,
}

impl PgConnection {
    pub(crate) fn new(client: Object) -> Self {
        Self { client }
    }

    /// Execute a query and return all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "executing query");
        Ok(self.client.query(sql, params).await?)
    }

    /// Execute a query and return exactly one row.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Row> {
        debug!(sql = %sql, "executing query_one");
        Ok(self.client.query_one(sql, params).await?)
    }

    /// Execute a query and return zero or one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Option<Row>> {
        debug!(sql = %sql, "executing query_opt");
        Ok(self.client.query_opt(sql, params).await?)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<u64> {
        debug!(sql = %sql, "executing statement");
        Ok(self.client.execute(sql, params).await?)
    }

    /// Execute a batch of statements in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "executing batch");
        Ok(self.client.batch_execute(sql).await?)
    }

    /// Begin a transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction { txn })
    }

    /// Get the underlying pooled client for operations not covered here.
    pub fn inner(&self) -> &Object {
        &self.client
    }
}

/// A PostgreSQL transaction.
///
/// Dropping the transaction without calling [`PgTransaction::commit`] rolls
/// it back, which also discards any `SET LOCAL` state before the connection
/// returns to the pool.
pub struct PgTransaction<'a> {
    txn: deadpool_postgres::Transaction<'a>,
}

impl PgTransaction<'_> {
    /// Execute a query and return all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "executing query in transaction");
        Ok(self.txn.query(sql, params).await?)
    }

    /// Execute a query and return exactly one row.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Row> {
        Ok(self.txn.query_one(sql, params).await?)
    }

    /// Execute a query and return zero or one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Option<Row>> {
        Ok(self.txn.query_opt(sql, params).await?)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<u64> {
        Ok(self.txn.execute(sql, params).await?)
    }

    /// Execute a batch of statements in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "executing batch in transaction");
        Ok(self.txn.batch_execute(sql).await?)
    }

    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("committing transaction");
        Ok(self.txn.commit().await?)
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("rolling back transaction");
        Ok(self.txn.rollback().await?)
    }
}

fn param_refs(boxed: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    boxed.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect()
}

fn rows_to_records(rows: &[Row]) -> QueryResult<Vec<Record>> {
    rows.iter()
        .map(|row| row_to_record(row).map_err(Into::into))
        .collect()
}

fn count_from_row(row: &Row) -> QueryResult<u64> {
    let count: i64 = row
        .try_get(0)
        .map_err(|e| crate::error::PgError::deserialization(e.to_string()))?;
    Ok(count.max(0) as u64)
}

macro_rules! impl_query_engine {
    ($target:ty) => {
        impl QueryEngine for $target {
            fn fetch(
                &self,
                sql: &str,
                params: Vec<FilterValue>,
            ) -> BoxFuture<'_, QueryResult<Vec<Record>>> {
                let sql = sql.to_string();
                Box::pin(async move {
                    let boxed = filter_values_to_params(&params)?;
                    let rows = self.query(&sql, &param_refs(&boxed)).await?;
                    rows_to_records(&rows)
                })
            }

            fn fetch_optional(
                &self,
                sql: &str,
                params: Vec<FilterValue>,
            ) -> BoxFuture<'_, QueryResult<Option<Record>>> {
                let sql = sql.to_string();
                Box::pin(async move {
                    let boxed = filter_values_to_params(&params)?;
                    let row = self.query_opt(&sql, &param_refs(&boxed)).await?;
                    match row {
                        Some(row) => Ok(Some(row_to_record(&row)?)),
                        None => Ok(None),
                    }
                })
            }

            fn execute(
                &self,
                sql: &str,
                params: Vec<FilterValue>,
            ) -> BoxFuture<'_, QueryResult<u64>> {
                let sql = sql.to_string();
                Box::pin(async move {
                    let boxed = filter_values_to_params(&params)?;
                    Ok(self.execute(&sql, &param_refs(&boxed)).await?)
                })
            }

            fn count(
                &self,
                sql: &str,
                params: Vec<FilterValue>,
            ) -> BoxFuture<'_, QueryResult<u64>> {
                let sql = sql.to_string();
                Box::pin(async move {
                    let boxed = filter_values_to_params(&params)?;
                    let row = self.query_one(&sql, &param_refs(&boxed)).await?;
                    count_from_row(&row)
                })
            }
        }
    };
}

impl_query_engine!(PgConnection);
impl_query_engine!(PgTransaction<'_>);
