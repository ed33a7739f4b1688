//! Tenant-scoped query operations.
//!
//! Operations are thin builders over an already-scoped [`Where`] predicate:
//! the repository layer validates the tenant and merges its condition before
//! an operation is constructed, so everything here renders and executes
//! exactly what it is given.
//!
//! - `FindManyOperation` - Select multiple records
//! - `FindFirstOperation` - Select the first matching record
//! - `CountOperation` - Count matching records
//! - `UpdateOperation` - Update matching records
//! - `DeleteOperation` - Delete matching records
//!
//! [`Where`]: crate::scope::Where

mod count;
mod delete;
mod find_first;
mod find_many;
mod update;

pub use count::CountOperation;
pub use delete::DeleteOperation;
pub use find_first::FindFirstOperation;
pub use find_many::FindManyOperation;
pub use update::UpdateOperation;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared mock engine for operation tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::data::Record;
    use crate::error::QueryResult;
    use crate::filter::FilterValue;
    use crate::traits::{BoxFuture, Model, QueryEngine};

    pub(crate) struct TestModel {
        pub id: uuid::Uuid,
        pub name: String,
    }

    impl Model for TestModel {
        const MODEL_NAME: &'static str = "TestModel";
        const TABLE_NAME: &'static str = "test_models";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const COLUMNS: &'static [&'static str] = &["id", "tenant_id", "name"];
        const SOFT_DELETE_COLUMN: Option<&'static str> = Some("deleted_at");

        fn from_record(record: &Record) -> QueryResult<Self> {
            Ok(Self {
                id: record.require_uuid("id")?,
                name: record.require_string("name")?,
            })
        }
    }

    /// Records every call and returns canned results.
    #[derive(Default)]
    pub(crate) struct MockEngine {
        pub calls: AtomicUsize,
        pub statements: Mutex<Vec<(String, Vec<FilterValue>)>>,
        pub rows: Vec<Record>,
        pub affected: u64,
        pub count_result: u64,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rows(rows: Vec<Record>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        pub fn with_count(count: u64) -> Self {
            Self {
                count_result: count,
                ..Self::default()
            }
        }

        pub fn with_affected(affected: u64) -> Self {
            Self {
                affected,
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_statement(&self) -> (String, Vec<FilterValue>) {
            self.statements
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("no statement recorded")
        }

        fn record(&self, sql: &str, params: &[FilterValue]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
        }
    }

    impl QueryEngine for MockEngine {
        fn fetch(
            &self,
            sql: &str,
            params: Vec<FilterValue>,
        ) -> BoxFuture<'_, QueryResult<Vec<Record>>> {
            self.record(sql, &params);
            let rows = self.rows.clone();
            Box::pin(async move { Ok(rows) })
        }

        fn fetch_optional(
            &self,
            sql: &str,
            params: Vec<FilterValue>,
        ) -> BoxFuture<'_, QueryResult<Option<Record>>> {
            self.record(sql, &params);
            let row = self.rows.first().cloned();
            Box::pin(async move { Ok(row) })
        }

        fn execute(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>> {
            self.record(sql, &params);
            let affected = self.affected;
            Box::pin(async move { Ok(affected) })
        }

        fn count(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>> {
            self.record(sql, &params);
            let count = self.count_result;
            Box::pin(async move { Ok(count) })
        }
    }
}
