//! Tenant scoping of query predicates.
//!
//! Repository predicates come in two shapes: a single conjunctive filter, or
//! a list with OR semantics across its elements. [`scope`] merges the tenant
//! equality into either shape without changing it — in particular the tenant
//! condition is merged into *each* element of an OR list, never appended as
//! an extra element, which would create a branch matching every row of the
//! tenant.
//!
//! ```rust
//! use tenet_query::scope::{scope, Where};
//! use tenet_query::{Filter, tenant::TenantId};
//!
//! let t = TenantId::parse("11111111-1111-1111-1111-111111111111").unwrap();
//! let input = Where::Any(vec![
//!     Filter::Equals("id".into(), "a".into()),
//!     Filter::Equals("status".into(), "x".into()),
//! ]);
//!
//! match scope(Some(input), &t, "tenant_id") {
//!     Where::Any(branches) => assert_eq!(branches.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```

use crate::filter::{Filter, FilterValue};
use crate::tenant::TenantId;

/// A repository predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// A single conjunctive filter.
    One(Filter),
    /// A list of alternatives combined with OR.
    Any(Vec<Filter>),
}

impl Where {
    /// A predicate matching everything.
    pub fn all() -> Self {
        Self::One(Filter::None)
    }

    /// AND the given filter into the predicate, element-wise for OR lists.
    ///
    /// Preserves shape: `One` stays `One`, `Any` keeps its length.
    pub fn and_each(self, extra: Filter) -> Self {
        match self {
            Self::One(f) => Self::One(f.and_then(extra)),
            Self::Any(branches) => Self::Any(
                branches
                    .into_iter()
                    .map(|f| f.and_then(extra.clone()))
                    .collect(),
            ),
        }
    }

    /// Render to SQL with parameter placeholders starting at `$offset + 1`.
    ///
    /// An empty OR list renders as `FALSE`: a disjunction of nothing
    /// matches nothing.
    pub fn to_sql(&self, param_offset: usize) -> (String, Vec<FilterValue>) {
        match self {
            Self::One(f) => f.to_sql(param_offset),
            Self::Any(branches) => {
                if branches.is_empty() {
                    return ("FALSE".to_string(), Vec::new());
                }
                // Composite filters parenthesize themselves, bare comparisons
                // bind tighter than OR either way.
                let mut params = Vec::new();
                let parts: Vec<_> = branches
                    .iter()
                    .map(|f| f.to_sql_with_params(param_offset, &mut params))
                    .collect();
                (parts.join(" OR "), params)
            }
        }
    }

    /// Whether the predicate is the trivial match-everything `One(None)`.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Self::One(Filter::None))
    }
}

impl From<Filter> for Where {
    fn from(f: Filter) -> Self {
        Self::One(f)
    }
}

/// The tenant equality filter for a column.
pub fn tenant_filter(tenant: &TenantId, column: &str) -> Filter {
    Filter::Equals(column.to_string(), FilterValue::Uuid(tenant.as_uuid()))
}

/// Merge the tenant condition into a caller predicate.
///
/// Pure: same inputs give identical outputs, and the caller's filters are
/// embedded unchanged.
///
/// - `None` becomes the bare tenant equality.
/// - `One(f)` becomes `f AND tenant = id`.
/// - `Any([f1, .., fn])` becomes `Any([f1 AND t, .., fn AND t])` with the
///   same number of branches.
pub fn scope(filter: Option<Where>, tenant: &TenantId, column: &str) -> Where {
    let tenant_eq = tenant_filter(tenant, column);
    match filter {
        None => Where::One(tenant_eq),
        Some(w) => w.and_each(tenant_eq),
    }
}
