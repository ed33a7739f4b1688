//! Update operation for modifying matching records.

use std::marker::PhantomData;

use tracing::debug;

use crate::data::Changes;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::scope::Where;
use crate::traits::{Model, QueryEngine};

/// Applies a change set to all records matching a scoped predicate.
pub struct UpdateOperation<'e, E: QueryEngine, M: Model> {
    engine: &'e E,
    filter: Where,
    changes: Changes,
    _model: PhantomData<M>,
}

impl<'e, E: QueryEngine, M: Model> UpdateOperation<'e, E, M> {
    /// Create a new update operation over an already-scoped predicate.
    pub fn new(engine: &'e E, filter: Where, changes: Changes) -> Self {
        Self {
            engine,
            filter,
            changes,
            _model: PhantomData,
        }
    }

    /// Build the SQL statement.
    ///
    /// SET parameters bind first; WHERE placeholders continue after them.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<FilterValue>)> {
        if self.changes.is_empty() {
            return Err(QueryError::invalid_parameter("changes", "empty change set")
                .with_model(M::MODEL_NAME));
        }

        let (set_sql, mut params) = self.changes.to_set_sql();
        let (where_sql, where_params) = self.filter.to_sql(params.len());
        params.extend(where_params);

        let mut sql = String::from("UPDATE ");
        sql.push_str(M::TABLE_NAME);
        sql.push_str(" SET ");
        sql.push_str(&set_sql);

        if !self.filter.is_trivial() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        Ok((sql, params))
    }

    /// Execute and return the number of updated rows.
    pub async fn exec(self) -> QueryResult<u64> {
        let (sql, params) = self.build_sql()?;
        debug!(model = M::MODEL_NAME, sql = %sql, "update");

        self.engine.execute(&sql, params).await
    }
}
