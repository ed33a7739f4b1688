//! Find-many operation for selecting multiple records.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::scope::Where;
use crate::traits::{Model, QueryEngine};

/// Selects all records matching a scoped predicate.
pub struct FindManyOperation<'e, E: QueryEngine, M: Model> {
    engine: &'e E,
    filter: Where,
    take: Option<i64>,
    skip: Option<i64>,
    order_by: Option<String>,
    _model: PhantomData<M>,
}

impl<'e, E: QueryEngine, M: Model> FindManyOperation<'e, E, M> {
    /// Create a new find-many operation over an already-scoped predicate.
    pub fn new(engine: &'e E, filter: Where) -> Self {
        Self {
            engine,
            filter,
            take: None,
            skip: None,
            order_by: None,
            _model: PhantomData,
        }
    }

    /// Limit the number of returned rows.
    pub fn take(mut self, n: i64) -> Self {
        self.take = Some(n);
        self
    }

    /// Skip the first `n` rows.
    pub fn skip(mut self, n: i64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Order by a raw column expression, e.g. `"created_at DESC"`.
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
        if let Some(take) = self.take {
            sql.push_str(&format!(" LIMIT {}", take));
        }
        if let Some(skip) = self.skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }

        (sql, params)
    }

    /// Execute and deserialize the matching rows.
    pub async fn exec(self) -> QueryResult<Vec<M>> {
        let (sql, params) = self.build_sql();
        debug!(model = M::MODEL_NAME, sql = %sql, "find_many");

        let rows = self.engine.fetch(&sql, params).await?;
        rows.iter().map(M::from_record).collect()
    }
}
