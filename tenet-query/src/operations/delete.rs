//! Delete operation for removing matching records.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::scope::Where;
use crate::traits::{Model, QueryEngine};

/// Deletes all records matching a scoped predicate.
pub struct DeleteOperation<'e, E: QueryEngine, M: Model> {
    engine: &'e E,
    filter: Where,
    _model: PhantomData<M>,
}

impl<'e, E: QueryEngine, M: Model> DeleteOperation<'e, E, M> {
    /// Create a new delete operation over an already-scoped predicate.
    pub fn new(engine: &'e E, filter: Where) -> Self {
        Self {
            engine,
            filter,
            _model: PhantomData,
        }
    }

    /// Build the SQL statement.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        let (where_sql, params) = self.filter.to_sql(0);

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(M::TABLE_NAME);

        if !self.filter.is_trivial() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        (sql, params)
    }

    /// Execute and return the number of deleted rows.
    pub async fn exec(self) -> QueryResult<u64> {
        let (sql, params) = self.build_sql();
        debug!(model = M::MODEL_NAME, sql = %sql, "delete");

        self.engine.execute(&sql, params).await
    }
}
