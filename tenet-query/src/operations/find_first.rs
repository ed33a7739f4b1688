//! Find-first operation for selecting a single record.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::scope::Where;
use crate::traits::{Model, QueryEngine};

/// Selects the first record matching a scoped predicate, or `None`.
pub struct FindFirstOperation<'e, E: QueryEngine, M: Model> {
    engine: &'e E,
    filter: Where,
    order_by: Option<String>,
    _model: PhantomData<M>,
}

impl<'e, E: QueryEngine, M: Model> FindFirstOperation<'e, E, M> {
    /// Create a new find-first operation over an already-scoped predicate.
    pub fn new(engine: &'e E, filter: Where) -> Self {
        Self {
            engine,
            filter,
            order_by: None,
            _model: PhantomData,
        }
    }

    /// Order by a raw column expression before taking the first row.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        let (where_sql, params) = self.filter.to_sql(0);

        let mut sql = String::from("SELECT ");
        sql.push_str(&M::COLUMNS.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(M::TABLE_NAME);

        if !self.filter.is_trivial() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if let Some(ref order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        sql.push_str(" LIMIT 1");

        (sql, params)
    }

    /// Execute and deserialize the first matching row, if any.
    pub async fn exec(self) -> QueryResult<Option<M>> {
        let (sql, params) = self.build_sql();
        debug!(model = M::MODEL_NAME, sql = %sql, "find_first");

        match self.engine.fetch_optional(&sql, params).await? {
            Some(record) => Ok(Some(M::from_record(&record)?)),
            None => Ok(None),
        }
    }
}
