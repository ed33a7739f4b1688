//! Tenant identity and per-request tenant context.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};

/// A validated tenant identifier.
///
/// Tenant identifiers are canonical UUIDs. [`TenantId::parse`] is the single
/// validation gate: it is synchronous, performs no I/O, and fails closed on
/// empty or malformed input with [`crate::ErrorCode::InvalidTenantId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Create a tenant ID from an already-validated UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse and validate a caller-supplied tenant identifier.
    ///
    /// ```rust
    /// use tenet_query::tenant::TenantId;
    ///
    /// assert!(TenantId::parse("11111111-1111-1111-1111-111111111111").is_ok());
    /// assert!(TenantId::parse("").is_err());
    /// assert!(TenantId::parse("not-a-uuid").is_err());
    /// ```
    pub fn parse(raw: &str) -> QueryResult<Self> {
        if raw.is_empty() {
            return Err(QueryError::invalid_tenant_id(raw));
        }
        Uuid::try_parse(raw)
            .map(Self)
            .map_err(|_| QueryError::invalid_tenant_id(raw))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TenantId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

/// Context for the current tenant.
///
/// Built once per inbound request by the authentication layer and carried
/// ambiently for the request's async call graph. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// The tenant identifier.
    pub tenant_id: TenantId,
    /// When set, transactions opened from this context do not program the
    /// database isolation variable, so row-level security policies see no
    /// tenant binding.
    pub bypass_isolation: bool,
}

impl TenantContext {
    /// Create a normal, isolated tenant context.
    pub fn new(tenant_id: impl Into<TenantId>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            bypass_isolation: false,
        }
    }

    /// Create a context for administrative cross-tenant operations.
    ///
    /// Whether a caller is allowed to bypass isolation is decided by the
    /// authentication layer that constructs the context, not here.
    pub fn bypass(tenant_id: impl Into<TenantId>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            bypass_isolation: true,
        }
    }

    /// Check if this context should skip tenant isolation.
    pub fn should_bypass(&self) -> bool {
        self.bypass_isolation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_tenant_id_parse_valid() {
        let id = TenantId::parse("11111111-1111-1111-1111-111111111111").unwrap();
        assert_eq!(id.to_string(), "11111111-1111-1111-1111-111111111111");
    }

    #[test]
    fn test_tenant_id_parse_empty() {
        let err = TenantId::parse("").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTenantId);
    }

    #[test]
    fn test_tenant_id_parse_malformed() {
        for raw in ["tenant-123", "1111", "11111111-1111-1111-1111-11111111111Z"] {
            let err = TenantId::parse(raw).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidTenantId, "input: {}", raw);
        }
    }

    #[test]
    fn test_tenant_context() {
        let id = TenantId::new(Uuid::new_v4());
        let ctx = TenantContext::new(id);
        assert_eq!(ctx.tenant_id, id);
        assert!(!ctx.should_bypass());
    }

    #[test]
    fn test_bypass_context() {
        let ctx = TenantContext::bypass(Uuid::new_v4());
        assert!(ctx.should_bypass());
    }
}
