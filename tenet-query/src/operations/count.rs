//! Count operation for counting records.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::scope::Where;
use crate::traits::{Model, QueryEngine};

/// Counts records matching a scoped predicate.
pub struct CountOperation<'e, E: QueryEngine, M: Model> {
    engine: &'e E,
    filter: Where,
    _model: PhantomData<M>,
}

impl<'e, E: QueryEngine, M: Model> CountOperation<'e, E, M> {
    /// Create a new count operation over an already-scoped predicate.
    pub fn new(engine: &'e E, filter: Where) -> Self {
        Self {
            engine,
            filter,
            _model: PhantomData,
        }
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        let (where_sql, params) = self.filter.to_sql(0);

        let mut sql = String::from("SELECT COUNT(*) FROM ");
        sql.push_str(M::TABLE_NAME);

        if !self.filter.is_trivial() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        (sql, params)
    }

    /// Execute the count query.
    pub async fn exec(self) -> QueryResult<u64> {
        let (sql, params) = self.build_sql();
        debug!(model = M::MODEL_NAME, sql = %sql, "count");

        self.engine.count(&sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::operations::testing::{MockEngine, TestModel};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn test_build_sql_basic() {
        let engine = MockEngine::new();
        let op = CountOperation::<_, TestModel>::new(&engine, Where::all());

        let (sql, params) = op.build_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM test_models");
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_sql_with_filter() {
        let engine = MockEngine::new();
        let op = CountOperation::<_, TestModel>::new(
            &engine,
            Where::One(
                Filter::Equals("status".into(), "queued".into())
                    .and_then(Filter::Equals("tenant_id".into(), Uuid::nil().into())),
            ),
        );

        let (sql, params) = op.build_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM test_models WHERE (status = $1 AND tenant_id = $2)"
        );
        assert_eq!(params.len(), 2);
    }

    #[tokio::test]
    async fn test_exec() {
        let engine = MockEngine::with_count(42);
        let count = CountOperation::<_, TestModel>::new(&engine, Where::all())
            .exec()
            .await
            .unwrap();

        assert_eq!(count, 42);
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exec_zero() {
        let engine = MockEngine::new();
        let count = CountOperation::<_, TestModel>::new(&engine, Where::all())
            .exec()
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
