//! Type conversions between `FilterValue` records and PostgreSQL rows.

use chrono::{DateTime, Utc};
use tenet_query::data::Record;
use tenet_query::filter::FilterValue;
use tokio_postgres::Row;
use tokio_postgres::types::{ToSql, Type};
use uuid::Uuid;

use crate::error::{PgError, PgResult};

/// Convert a `FilterValue` to a boxed PostgreSQL parameter.
///
/// `Null` and `List` never reach the driver as bound parameters: null
/// comparisons render as `IS NULL` and list membership expands element-wise
/// during SQL generation.
pub fn filter_value_to_sql(value: &FilterValue) -> PgResult<Box<dyn ToSql + Sync + Send>> {
    match value {
        FilterValue::Bool(b) => Ok(Box::new(*b)),
        FilterValue::Int(i) => Ok(Box::new(*i)),
        FilterValue::Float(f) => Ok(Box::new(*f)),
        FilterValue::String(s) => Ok(Box::new(s.clone())),
        FilterValue::Uuid(u) => Ok(Box::new(*u)),
        FilterValue::Json(j) => Ok(Box::new(j.clone())),
        FilterValue::Null => Err(PgError::type_conversion(
            "null is rendered as IS NULL, never bound as a parameter",
        )),
        FilterValue::List(_) => Err(PgError::type_conversion(
            "lists are expanded element-wise, never bound as a parameter",
        )),
    }
}

/// Convert a slice of filter values to boxed PostgreSQL parameters.
pub fn filter_values_to_params(
    values: &[FilterValue],
) -> PgResult<Vec<Box<dyn ToSql + Sync + Send>>> {
    values.iter().map(filter_value_to_sql).collect()
}

/// Deserialize a PostgreSQL row into a column-ordered [`Record`].
pub fn row_to_record(row: &Row) -> PgResult<Record> {
    let mut record = Record::new();

    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let value = column_to_value(row, idx, column.type_())?;
        record.insert(name, value);
    }

    Ok(record)
}

fn column_to_value(row: &Row, idx: usize, ty: &Type) -> PgResult<FilterValue> {
    // Type constants are not usable as match patterns, hence the chain.
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)
            .map_err(deser)?
            .map(FilterValue::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(deser)?
            .map(|v| FilterValue::Int(v as i64))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(deser)?
            .map(|v| FilterValue::Int(v as i64))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .map_err(deser)?
            .map(FilterValue::Int)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(deser)?
            .map(|v| FilterValue::Float(v as f64))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)
            .map_err(deser)?
            .map(FilterValue::Float)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx)
            .map_err(deser)?
            .map(FilterValue::String)
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)
            .map_err(deser)?
            .map(FilterValue::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(deser)?
            .map(FilterValue::Json)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(deser)?
            .map(|ts| FilterValue::String(ts.to_rfc3339()))
    } else {
        return Err(PgError::type_conversion(format!(
            "unsupported column type '{ty}' at index {idx}"
        )));
    };

    Ok(value.unwrap_or(FilterValue::Null))
}

fn deser(e: tokio_postgres::Error) -> PgError {
    PgError::deserialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindable_values_convert() {
        assert!(filter_value_to_sql(&FilterValue::Bool(true)).is_ok());
        assert!(filter_value_to_sql(&FilterValue::Int(42)).is_ok());
        assert!(filter_value_to_sql(&FilterValue::Float(1.5)).is_ok());
        assert!(filter_value_to_sql(&FilterValue::String("x".into())).is_ok());
        assert!(filter_value_to_sql(&FilterValue::Uuid(Uuid::nil())).is_ok());
        assert!(filter_value_to_sql(&FilterValue::Json(serde_json::json!({"a": 1}))).is_ok());
    }

    #[test]
    fn test_null_and_list_are_rejected() {
        assert!(filter_value_to_sql(&FilterValue::Null).is_err());
        assert!(filter_value_to_sql(&FilterValue::List(vec![])).is_err());
    }

    #[test]
    fn test_params_roundtrip_count() {
        let values = vec![FilterValue::Int(1), FilterValue::String("a".into())];
        let params = filter_values_to_params(&values).unwrap();
        assert_eq!(params.len(), 2);
    }
}
