//! Filter types for building WHERE clauses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// UUID value.
    Uuid(Uuid),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A complete filter that can be converted to SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// No filter (always true).
    None,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Less than comparison.
    Lt(String, FilterValue),
    /// Less than or equal comparison.
    Lte(String, FilterValue),
    /// Greater than comparison.
    Gt(String, FilterValue),
    /// Greater than or equal comparison.
    Gte(String, FilterValue),

    /// In a list of values.
    In(String, Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(String, Vec<FilterValue>),

    /// Contains (LIKE %value%).
    Contains(String, FilterValue),
    /// Starts with (LIKE value%).
    StartsWith(String, FilterValue),
    /// Ends with (LIKE %value).
    EndsWith(String, FilterValue),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.into_iter().next().unwrap(),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.into_iter().next().unwrap(),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combine with another filter using OR.
    pub fn or_else(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Generate SQL for this filter with parameter placeholders.
    ///
    /// `param_offset` is the number of parameters already bound by the
    /// surrounding statement; placeholders start at `$offset + 1`.
    /// Returns (sql, params) where params are the values to bind.
    pub fn to_sql(&self, param_offset: usize) -> (String, Vec<FilterValue>) {
        let mut params = Vec::new();
        let sql = self.to_sql_with_params(param_offset, &mut params);
        (sql, params)
    }

    pub(crate) fn to_sql_with_params(
        &self,
        offset: usize,
        params: &mut Vec<FilterValue>,
    ) -> String {
        // Placeholder index for the value just pushed.
        fn bind(offset: usize, params: &mut Vec<FilterValue>, val: FilterValue) -> usize {
            params.push(val);
            offset + params.len()
        }

        match self {
            Self::None => "TRUE".to_string(),

            Self::Equals(col, val) => {
                if val.is_null() {
                    format!("{} IS NULL", col)
                } else {
                    let idx = bind(offset, params, val.clone());
                    format!("{} = ${}", col, idx)
                }
            }
            Self::NotEquals(col, val) => {
                if val.is_null() {
                    format!("{} IS NOT NULL", col)
                } else {
                    let idx = bind(offset, params, val.clone());
                    format!("{} != ${}", col, idx)
                }
            }

            Self::Lt(col, val) => {
                let idx = bind(offset, params, val.clone());
                format!("{} < ${}", col, idx)
            }
            Self::Lte(col, val) => {
                let idx = bind(offset, params, val.clone());
                format!("{} <= ${}", col, idx)
            }
            Self::Gt(col, val) => {
                let idx = bind(offset, params, val.clone());
                format!("{} > ${}", col, idx)
            }
            Self::Gte(col, val) => {
                let idx = bind(offset, params, val.clone());
                format!("{} >= ${}", col, idx)
            }

            Self::In(col, values) => {
                if values.is_empty() {
                    return "FALSE".to_string();
                }
                let placeholders: Vec<_> = values
                    .iter()
                    .map(|v| format!("${}", bind(offset, params, v.clone())))
                    .collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Self::NotIn(col, values) => {
                if values.is_empty() {
                    return "TRUE".to_string();
                }
                let placeholders: Vec<_> = values
                    .iter()
                    .map(|v| format!("${}", bind(offset, params, v.clone())))
                    .collect();
                format!("{} NOT IN ({})", col, placeholders.join(", "))
            }

            Self::Contains(col, val) => {
                let pattern = match val {
                    FilterValue::String(s) => FilterValue::String(format!("%{}%", s)),
                    other => other.clone(),
                };
                let idx = bind(offset, params, pattern);
                format!("{} LIKE ${}", col, idx)
            }
            Self::StartsWith(col, val) => {
                let pattern = match val {
                    FilterValue::String(s) => FilterValue::String(format!("{}%", s)),
                    other => other.clone(),
                };
                let idx = bind(offset, params, pattern);
                format!("{} LIKE ${}", col, idx)
            }
            Self::EndsWith(col, val) => {
                let pattern = match val {
                    FilterValue::String(s) => FilterValue::String(format!("%{}", s)),
                    other => other.clone(),
                };
                let idx = bind(offset, params, pattern);
                format!("{} LIKE ${}", col, idx)
            }

            Self::IsNull(col) => format!("{} IS NULL", col),
            Self::IsNotNull(col) => format!("{} IS NOT NULL", col),

            Self::And(filters) => {
                if filters.is_empty() {
                    return "TRUE".to_string();
                }
                let parts: Vec<_> = filters
                    .iter()
                    .map(|f| f.to_sql_with_params(offset, params))
                    .collect();
                format!("({})", parts.join(" AND "))
            }
            Self::Or(filters) => {
                if filters.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<_> = filters
                    .iter()
                    .map(|f| f.to_sql_with_params(offset, params))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Self::Not(filter) => {
                let inner = filter.to_sql_with_params(offset, params);
                format!("NOT ({})", inner)
            }
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(
            FilterValue::from("hello"),
            FilterValue::String("hello".to_string())
        );
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));

        let id = Uuid::nil();
        assert_eq!(FilterValue::from(id), FilterValue::Uuid(id));
    }

    #[test]
    fn test_filter_equals() {
        let filter = Filter::Equals("email".into(), "test@example.com".into());
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "email = $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_filter_equals_with_offset() {
        let filter = Filter::Equals("email".into(), "test@example.com".into());
        let (sql, params) = filter.to_sql(2);
        assert_eq!(sql, "email = $3");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_filter_and_placeholder_sequence() {
        let combined = Filter::and([
            Filter::Equals("name".into(), "Alice".into()),
            Filter::Gt("age".into(), FilterValue::Int(18)),
            Filter::Lte("age".into(), FilterValue::Int(65)),
        ]);

        let (sql, params) = combined.to_sql(0);
        assert_eq!(sql, "(name = $1 AND age > $2 AND age <= $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_filter_or_placeholder_sequence() {
        let combined = Filter::or([
            Filter::Equals("status".into(), "active".into()),
            Filter::Equals("status".into(), "pending".into()),
        ]);

        let (sql, params) = combined.to_sql(0);
        assert_eq!(sql, "(status = $1 OR status = $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_nested_or_inside_and() {
        let filter = Filter::and([
            Filter::Equals("tenant_id".into(), Uuid::nil().into()),
            Filter::or([
                Filter::Equals("status".into(), "queued".into()),
                Filter::Equals("status".into(), "running".into()),
            ]),
        ]);

        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "(tenant_id = $1 AND (status = $2 OR status = $3))");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_filter_in() {
        let filter = Filter::In("status".into(), vec!["active".into(), "pending".into()]);
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "status IN ($1, $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_filter_in_empty() {
        let filter = Filter::In("status".into(), vec![]);
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "FALSE");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_is_null() {
        let filter = Filter::IsNull("deleted_at".into());
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "deleted_at IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_equals_null_renders_is_null() {
        let filter = Filter::Equals("deleted_at".into(), FilterValue::Null);
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "deleted_at IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_contains() {
        let filter = Filter::Contains("email".into(), "example".into());
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "email LIKE $1");
        assert_eq!(params, vec![FilterValue::String("%example%".to_string())]);
    }

    #[test]
    fn test_filter_not() {
        let filter = Filter::not(Filter::Equals("archived".into(), true.into()));
        let (sql, params) = filter.to_sql(0);
        assert_eq!(sql, "NOT (archived = $1)");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_and_then_flattens() {
        let filter = Filter::Equals("a".into(), FilterValue::Int(1))
            .and_then(Filter::Equals("b".into(), FilterValue::Int(2)))
            .and_then(Filter::Equals("c".into(), FilterValue::Int(3)));

        match &filter {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_and_with_none_collapses() {
        let filter = Filter::and([Filter::None, Filter::Equals("a".into(), FilterValue::Int(1))]);
        assert!(matches!(filter, Filter::Equals(_, _)));
    }
}
