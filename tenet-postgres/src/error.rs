//! Error types for PostgreSQL operations.

use tenet_query::QueryError;
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Row deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Type conversion error.
    #[error("type conversion error: {0}")]
    TypeConversion(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Connection(_))
    }
}

impl From<PgError> for QueryError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Pool(e) => QueryError::connection(e.to_string()),
            PgError::Postgres(e) => {
                let message = e.to_string();
                match e.code().map(|c| c.code()) {
                    // Constraint violations carry their SQLSTATE through for callers.
                    Some(code @ ("23505" | "23503" | "23502" | "23514")) => {
                        QueryError::database(message)
                            .with_suggestion(format!("constraint violation (SQLSTATE {code})"))
                    }
                    // insufficient_privilege, the usual symptom of an RLS denial
                    Some("42501") => QueryError::database(message).with_help(
                        "row-level security rejected the statement; verify the tenant \
                         session variable is set for this transaction",
                    ),
                    _ => QueryError::database(message),
                }
            }
            PgError::Config(msg) => QueryError::configuration(msg),
            PgError::Connection(msg) => QueryError::connection(msg),
            PgError::Query(msg) => QueryError::database(msg),
            PgError::Transaction(msg) => QueryError::transaction(msg),
            PgError::Deserialization(msg) => QueryError::deserialization(msg),
            PgError::TypeConversion(msg) => QueryError::deserialization(msg),
            PgError::Internal(msg) => QueryError::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_query::ErrorCode;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));

        let err = PgError::connection("connection refused");
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_into_query_error() {
        let err: QueryError = PgError::config("bad url").into();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);

        let err: QueryError = PgError::transaction("already closed").into();
        assert_eq!(err.code, ErrorCode::TransactionFailed);

        let err: QueryError = PgError::deserialization("bad column").into();
        assert_eq!(err.code, ErrorCode::DeserializationError);
    }
}
