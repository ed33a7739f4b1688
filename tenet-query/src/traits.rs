//! Core traits connecting models, operations, and database engines.

use crate::data::Record;
use crate::error::QueryResult;
use crate::filter::FilterValue;

/// A boxed, sendable future, as returned by [`QueryEngine`] methods.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

/// Static description of a persisted entity.
///
/// ```rust
/// use tenet_query::traits::Model;
/// use tenet_query::data::Record;
/// use tenet_query::QueryResult;
///
/// struct Document {
///     id: uuid::Uuid,
///     name: String,
/// }
///
/// impl Model for Document {
///     const MODEL_NAME: &'static str = "Document";
///     const TABLE_NAME: &'static str = "documents";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///     const COLUMNS: &'static [&'static str] = &["id", "tenant_id", "name"];
///
///     fn from_record(record: &Record) -> QueryResult<Self> {
///         Ok(Self {
///             id: record.require_uuid("id")?,
///             name: record.require_string("name")?,
///         })
///     }
/// }
/// ```
pub trait Model: Sized + Send {
    /// The model name, used in error messages.
    const MODEL_NAME: &'static str;
    /// The table name.
    const TABLE_NAME: &'static str;
    /// Primary key column(s).
    const PRIMARY_KEY: &'static [&'static str];
    /// All columns, in SELECT order.
    const COLUMNS: &'static [&'static str];
    /// Column holding the owning tenant.
    const TENANT_COLUMN: &'static str = "tenant_id";
    /// Soft-delete timestamp column, when the table supports it.
    const SOFT_DELETE_COLUMN: Option<&'static str> = None;

    /// Deserialize a row into the model.
    fn from_record(record: &Record) -> QueryResult<Self>;
}

/// Execution seam between query operations and a database driver.
///
/// Implemented by connection and transaction wrappers in driver crates, and
/// by mock engines in tests.
pub trait QueryEngine: Send + Sync {
    /// Run a SELECT and return all rows.
    fn fetch(&self, sql: &str, params: Vec<FilterValue>)
    -> BoxFuture<'_, QueryResult<Vec<Record>>>;

    /// Run a SELECT expected to return zero or one row.
    fn fetch_optional(
        &self,
        sql: &str,
        params: Vec<FilterValue>,
    ) -> BoxFuture<'_, QueryResult<Option<Record>>>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>>;

    /// Run a single-row COUNT query.
    fn count(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>>;
}
