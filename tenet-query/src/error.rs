//! Error types for tenant-scoped query operations.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Query errors (not found, invalid filter)
//! - 3xxx: Connection errors (pool, timeout, auth)
//! - 4xxx: Transaction errors
//! - 5xxx: Execution errors
//! - 6xxx: Data errors (type, deserialization)
//! - 7xxx: Configuration errors
//! - 9xxx: Tenant errors
//!
//! ```rust
//! use tenet_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::invalid_tenant_id("not-a-uuid");
//! assert_eq!(err.code, ErrorCode::InvalidTenantId);
//! assert_eq!(err.code.code(), "T9001");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// Record not found (T1001).
    RecordNotFound = 1001,
    /// Invalid filter or where clause (T1002).
    InvalidFilter = 1002,

    // Connection errors (3xxx)
    /// Database connection failed (T3001).
    ConnectionFailed = 3001,
    /// Connection pool exhausted (T3002).
    PoolExhausted = 3002,
    /// Connection timeout (T3003).
    ConnectionTimeout = 3003,
    /// Authentication failed (T3004).
    AuthenticationFailed = 3004,

    // Transaction errors (4xxx)
    /// Transaction failed (T4001).
    TransactionFailed = 4001,
    /// Transaction already committed/rolled back (T4002).
    TransactionClosed = 4002,

    // Query execution errors (5xxx)
    /// Invalid parameter (T5001).
    InvalidParameter = 5001,
    /// General database error (T5002).
    DatabaseError = 5002,

    // Data errors (6xxx)
    /// Invalid data type (T6001).
    InvalidDataType = 6001,
    /// Deserialization error (T6002).
    DeserializationError = 6002,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,
    /// Invalid connection string (T7002).
    InvalidConnectionString = 7002,

    // Tenant errors (9xxx)
    /// Tenant identifier is empty or not a canonical UUID (T9001).
    InvalidTenantId = 9001,
    /// Tenant context required but not set (T9002).
    TenantNotSet = 9002,

    // Internal errors
    /// Internal error (T9901).
    Internal = 9901,
    /// Unknown error (T9999).
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T9001").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::InvalidFilter => "Invalid filter condition",
            Self::ConnectionFailed => "Database connection failed",
            Self::PoolExhausted => "Connection pool exhausted",
            Self::ConnectionTimeout => "Connection timeout",
            Self::AuthenticationFailed => "Authentication failed",
            Self::TransactionFailed => "Transaction failed",
            Self::TransactionClosed => "Transaction already closed",
            Self::InvalidParameter => "Invalid parameter",
            Self::DatabaseError => "Database error",
            Self::InvalidDataType => "Invalid data type",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::InvalidConnectionString => "Invalid connection string",
            Self::InvalidTenantId => "Invalid tenant identifier",
            Self::TenantNotSet => "Tenant context not set",
            Self::Internal => "Internal error",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The SQL query (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Create new empty context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL query.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a not found error.
    pub fn not_found(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("No {} record found matching the query", model),
        )
        .with_model(&model)
    }

    /// Create an invalid tenant ID error.
    ///
    /// Raised before any I/O when a caller-supplied tenant identifier is
    /// empty or not a canonical UUID.
    pub fn invalid_tenant_id(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let shown = if raw.is_empty() { "<empty>" } else { raw.as_str() };
        Self::new(
            ErrorCode::InvalidTenantId,
            format!("Invalid tenant identifier: {}", shown),
        )
        .with_suggestion("Tenant identifiers must be canonical UUIDs")
    }

    /// Create a tenant-not-set error.
    pub fn tenant_not_set() -> Self {
        Self::new(
            ErrorCode::TenantNotSet,
            "Tenant context required but not set",
        )
        .with_suggestion("Wrap the call in tenant::with_context(..) or pass an explicit tenant id")
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message),
        )
        .with_suggestion("Check that the database server is running")
        .with_suggestion("Verify the connection URL is correct")
    }

    /// Create a pool exhausted error.
    pub fn pool_exhausted(max_connections: usize) -> Self {
        Self::new(
            ErrorCode::PoolExhausted,
            format!("Connection pool exhausted (max {} connections)", max_connections),
        )
        .with_suggestion("Increase max_connections in pool configuration")
        .with_suggestion("Ensure transaction handles are not held longer than needed")
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::TransactionFailed,
            format!("Transaction error: {}", message),
        )
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid parameter for {}: {}", field, message),
        )
        .with_field(&field)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message),
        )
        .with_suggestion("Check that the model matches the database schema")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check if this is a tenant error.
    pub fn is_tenant_error(&self) -> bool {
        matches!(self.code, ErrorCode::InvalidTenantId | ErrorCode::TenantNotSet)
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed
                | ErrorCode::PoolExhausted
                | ErrorCode::ConnectionTimeout
                | ErrorCode::AuthenticationFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::RecordNotFound.code(), "T1001");
        assert_eq!(ErrorCode::InvalidTenantId.code(), "T9001");
        assert_eq!(ErrorCode::TenantNotSet.code(), "T9002");
    }

    #[test]
    fn test_invalid_tenant_id_error() {
        let err = QueryError::invalid_tenant_id("garbage");
        assert!(err.is_tenant_error());
        assert!(err.message.contains("garbage"));

        let err = QueryError::invalid_tenant_id("");
        assert!(err.message.contains("<empty>"));
    }

    #[test]
    fn test_tenant_not_set_error() {
        let err = QueryError::tenant_not_set();
        assert_eq!(err.code, ErrorCode::TenantNotSet);
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_not_found_error() {
        let err = QueryError::not_found("Document");
        assert!(err.is_not_found());
        assert!(err.message.contains("Document"));
        assert_eq!(err.context.model, Some("Document".to_string()));
    }

    #[test]
    fn test_connection_errors() {
        assert!(QueryError::connection("refused").is_connection_error());
        assert!(QueryError::pool_exhausted(10).is_connection_error());
        assert!(!QueryError::not_found("Document").is_connection_error());
    }

    #[test]
    fn test_error_with_context() {
        let err = QueryError::database("boom")
            .with_operation("find_many")
            .with_model("Document")
            .with_sql("SELECT 1");

        assert_eq!(err.context.operation, Some("find_many".to_string()));
        assert_eq!(err.context.model, Some("Document".to_string()));
        assert_eq!(err.context.sql, Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_display_includes_code() {
        let err = QueryError::tenant_not_set();
        let shown = err.to_string();
        assert!(shown.contains("T9002"));
    }
}
