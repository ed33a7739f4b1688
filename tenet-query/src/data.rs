//! Dynamic row data passed between engines and models.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// A single row as an ordered column-to-value map.
///
/// Engines produce records; models deserialize themselves from them via
/// [`crate::traits::Model::from_record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: IndexMap<String, FilterValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column value, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FilterValue>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&FilterValue> {
        self.columns.get(column)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get a required column or a deserialization error naming it.
    pub fn require(&self, column: &str) -> QueryResult<&FilterValue> {
        self.get(column).ok_or_else(|| {
            QueryError::deserialization(format!("missing column '{}'", column)).with_field(column)
        })
    }

    /// Get a required string column.
    pub fn require_string(&self, column: &str) -> QueryResult<String> {
        match self.require(column)? {
            FilterValue::String(s) => Ok(s.clone()),
            FilterValue::Uuid(u) => Ok(u.to_string()),
            other => Err(type_error(column, "string", other)),
        }
    }

    /// Get a required UUID column.
    pub fn require_uuid(&self, column: &str) -> QueryResult<Uuid> {
        match self.require(column)? {
            FilterValue::Uuid(u) => Ok(*u),
            FilterValue::String(s) => Uuid::parse_str(s).map_err(|_| {
                type_error(column, "uuid", &FilterValue::String(s.clone()))
            }),
            other => Err(type_error(column, "uuid", other)),
        }
    }

    /// Get a required integer column.
    pub fn require_int(&self, column: &str) -> QueryResult<i64> {
        match self.require(column)? {
            FilterValue::Int(i) => Ok(*i),
            other => Err(type_error(column, "integer", other)),
        }
    }

    /// Get a required boolean column.
    pub fn require_bool(&self, column: &str) -> QueryResult<bool> {
        match self.require(column)? {
            FilterValue::Bool(b) => Ok(*b),
            other => Err(type_error(column, "boolean", other)),
        }
    }

    /// Get an optional string column (`None` for SQL NULL or absent).
    pub fn opt_string(&self, column: &str) -> QueryResult<Option<String>> {
        match self.get(column) {
            None | Some(FilterValue::Null) => Ok(None),
            Some(FilterValue::String(s)) => Ok(Some(s.clone())),
            Some(FilterValue::Uuid(u)) => Ok(Some(u.to_string())),
            Some(other) => Err(type_error(column, "string", other)),
        }
    }
}

fn type_error(column: &str, expected: &str, got: &FilterValue) -> QueryError {
    QueryError::deserialization(format!(
        "column '{}' expected {}, got {:?}",
        column, expected, got
    ))
    .with_field(column)
}

impl FromIterator<(String, FilterValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A single column assignment in an UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Bind a value parameter (or inline NULL).
    Value(FilterValue),
    /// Assign the database clock, `now()`.
    Now,
}

/// An ordered set of column assignments for UPDATE statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    assignments: IndexMap<String, Change>,
}

impl Changes {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column to a value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.assignments
            .insert(column.into(), Change::Value(value.into()));
        self
    }

    /// Set a column to SQL NULL.
    pub fn set_null(mut self, column: impl Into<String>) -> Self {
        self.assignments
            .insert(column.into(), Change::Value(FilterValue::Null));
        self
    }

    /// Set a column to the database clock, `now()`.
    pub fn set_now(mut self, column: impl Into<String>) -> Self {
        self.assignments.insert(column.into(), Change::Now);
        self
    }

    /// Whether the change set is empty.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Render the SET clause.
    ///
    /// Returns (sql, params); placeholders start at `$1`, so any WHERE
    /// rendering that follows must offset by `params.len()`.
    pub fn to_set_sql(&self) -> (String, Vec<FilterValue>) {
        let mut params = Vec::new();
        let parts: Vec<String> = self
            .assignments
            .iter()
            .map(|(col, change)| match change {
                Change::Value(FilterValue::Null) => format!("{} = NULL", col),
                Change::Value(v) => {
                    params.push(v.clone());
                    format!("{} = ${}", col, params.len())
                }
                Change::Now => format!("{} = now()", col),
            })
            .collect();
        (parts.join(", "), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_accessors() {
        let id = Uuid::new_v4();
        let record = Record::new()
            .with("id", id)
            .with("name", "invoice.pdf")
            .with("pages", 12i64)
            .with("archived", false);

        assert_eq!(record.require_uuid("id").unwrap(), id);
        assert_eq!(record.require_string("name").unwrap(), "invoice.pdf");
        assert_eq!(record.require_int("pages").unwrap(), 12);
        assert!(!record.require_bool("archived").unwrap());
    }

    #[test]
    fn test_record_missing_column() {
        let record = Record::new().with("id", 1i64);
        let err = record.require_string("name").unwrap_err();
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_record_null_optional() {
        let mut record = Record::new();
        record.insert("deleted_at", FilterValue::Null);
        assert_eq!(record.opt_string("deleted_at").unwrap(), None);
        assert_eq!(record.opt_string("missing").unwrap(), None);
    }

    #[test]
    fn test_changes_set_sql() {
        let changes = Changes::new()
            .set("status", "processed")
            .set("page_count", 3i64);

        let (sql, params) = changes.to_set_sql();
        assert_eq!(sql, "status = $1, page_count = $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_changes_now_and_null() {
        let changes = Changes::new()
            .set_now("deleted_at")
            .set_null("deleted_by")
            .set("status", "archived");

        let (sql, params) = changes.to_set_sql();
        assert_eq!(sql, "deleted_at = now(), deleted_by = NULL, status = $1");
        assert_eq!(params.len(), 1);
    }
}
