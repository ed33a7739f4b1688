//! PostgreSQL Row-Level Security (RLS) statement generation.
//!
//! Isolation is enforced in the database: every tenant-owned table carries a
//! policy comparing its tenant column to a session variable, and the
//! transaction manager programs that variable with `SET LOCAL` so the
//! binding can never outlive the transaction on a pooled connection.
//!
//! Policies read the variable with `current_setting(name, true)`, which
//! yields NULL when the variable is unset. NULL never compares equal, so a
//! connection without a tenant binding sees no rows at all — the scheme
//! fails closed.
//!
//! # Example
//!
//! ```rust
//! use tenet_query::tenant::rls::RlsManager;
//!
//! let rls = RlsManager::default();
//! let sql = rls.create_policy_sql("documents");
//! assert!(sql.contains("current_setting('app.tenant_id', true)::uuid"));
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;

use super::context::TenantId;

/// Configuration for PostgreSQL RLS.
#[derive(Debug, Clone)]
pub struct RlsConfig {
    /// The tenant ID column name.
    pub tenant_column: String,
    /// Session variable holding the current tenant (e.g. "app.tenant_id").
    pub tenant_variable: String,
    /// Session variable for the administrative bypass flag.
    pub bypass_variable: String,
    /// Role to apply policies to.
    pub application_role: Option<String>,
    /// Tables to enable RLS on.
    pub tables: BTreeSet<String>,
    /// Tables excluded from RLS (e.g. shared lookup tables).
    pub excluded_tables: BTreeSet<String>,
    /// Whether to emit the bypass policy alongside the isolation policy.
    pub allow_bypass: bool,
    /// Policy name prefix.
    pub policy_prefix: String,
}

impl Default for RlsConfig {
    fn default() -> Self {
        Self {
            tenant_column: "tenant_id".to_string(),
            tenant_variable: "app.tenant_id".to_string(),
            bypass_variable: "app.bypass_rls".to_string(),
            application_role: None,
            tables: BTreeSet::new(),
            excluded_tables: BTreeSet::new(),
            allow_bypass: true,
            policy_prefix: "tenant_isolation".to_string(),
        }
    }
}

impl RlsConfig {
    /// Create a new RLS config with the given tenant column.
    pub fn new(tenant_column: impl Into<String>) -> Self {
        Self {
            tenant_column: tenant_column.into(),
            ..Default::default()
        }
    }

    /// Set the tenant session variable name.
    pub fn with_tenant_variable(mut self, var: impl Into<String>) -> Self {
        self.tenant_variable = var.into();
        self
    }

    /// Set the bypass session variable name.
    pub fn with_bypass_variable(mut self, var: impl Into<String>) -> Self {
        self.bypass_variable = var.into();
        self
    }

    /// Set the application role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.application_role = Some(role.into());
        self
    }

    /// Add tables for RLS.
    pub fn add_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Exclude a table from RLS.
    pub fn exclude_table(mut self, table: impl Into<String>) -> Self {
        self.excluded_tables.insert(table.into());
        self
    }

    /// Disable the bypass policy.
    pub fn without_bypass(mut self) -> Self {
        self.allow_bypass = false;
        self
    }
}

/// Manager for PostgreSQL RLS operations.
#[derive(Debug, Clone, Default)]
pub struct RlsManager {
    config: RlsConfig,
}

impl RlsManager {
    /// Create a new RLS manager with the given config.
    pub fn new(config: RlsConfig) -> Self {
        Self { config }
    }

    /// Get the config.
    pub fn config(&self) -> &RlsConfig {
        &self.config
    }

    /// Generate SQL to enable RLS on a table.
    pub fn enable_rls_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;",
            quote_ident(table)
        )
    }

    /// Generate SQL to force RLS even for table owners.
    pub fn force_rls_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE {} FORCE ROW LEVEL SECURITY;",
            quote_ident(table)
        )
    }

    /// Generate the tenant isolation policy for a table.
    ///
    /// Uses `current_setting(var, true)` so an unset variable yields NULL
    /// and the table exposes no rows.
    pub fn create_policy_sql(&self, table: &str) -> String {
        let policy_name = format!("{}_{}", self.config.policy_prefix, table);
        let role = self.config.application_role.as_deref().unwrap_or("PUBLIC");

        format!(
            r#"CREATE POLICY {} ON {}
    AS PERMISSIVE
    FOR ALL
    TO {}
    USING ({} = current_setting('{}', true)::uuid)
    WITH CHECK ({} = current_setting('{}', true)::uuid);"#,
            quote_ident(&policy_name),
            quote_ident(table),
            role,
            quote_ident(&self.config.tenant_column),
            self.config.tenant_variable,
            quote_ident(&self.config.tenant_column),
            self.config.tenant_variable,
        )
    }

    /// Generate the administrative bypass policy for a table.
    ///
    /// Permissive alongside the isolation policy: rows become visible when
    /// the bypass variable is set to true for the transaction.
    pub fn create_bypass_policy_sql(&self, table: &str) -> String {
        let policy_name = format!("{}_{}_bypass", self.config.policy_prefix, table);
        let role = self.config.application_role.as_deref().unwrap_or("PUBLIC");

        format!(
            r#"CREATE POLICY {} ON {}
    AS PERMISSIVE
    FOR ALL
    TO {}
    USING (current_setting('{}', true)::boolean)
    WITH CHECK (current_setting('{}', true)::boolean);"#,
            quote_ident(&policy_name),
            quote_ident(table),
            role,
            self.config.bypass_variable,
            self.config.bypass_variable,
        )
    }

    /// Generate SQL to drop the policies for a table.
    pub fn drop_policy_sql(&self, table: &str) -> String {
        let policy_name = format!("{}_{}", self.config.policy_prefix, table);
        let mut sql = format!(
            "DROP POLICY IF EXISTS {} ON {};",
            quote_ident(&policy_name),
            quote_ident(table)
        );
        if self.config.allow_bypass {
            let bypass_name = format!("{}_bypass", policy_name);
            write!(
                sql,
                "\nDROP POLICY IF EXISTS {} ON {};",
                quote_ident(&bypass_name),
                quote_ident(table)
            )
            .unwrap();
        }
        sql
    }

    /// Generate SQL to bind the tenant for the current transaction only.
    ///
    /// `SET LOCAL` reverts at transaction end, so a pooled connection never
    /// carries a binding into its next checkout. There is deliberately no
    /// session-scoped variant.
    pub fn set_tenant_local_sql(&self, tenant_id: &TenantId) -> String {
        format!(
            "SET LOCAL {} = '{}';",
            self.config.tenant_variable, tenant_id
        )
    }

    /// Generate SQL to enable the bypass flag for the current transaction.
    pub fn set_bypass_local_sql(&self) -> String {
        format!("SET LOCAL {} = 'true';", self.config.bypass_variable)
    }

    /// Generate SQL to reset the tenant variable.
    pub fn reset_tenant_sql(&self) -> String {
        format!("RESET {};", self.config.tenant_variable)
    }

    /// Generate SQL to read back the current tenant binding.
    pub fn current_tenant_sql(&self) -> String {
        format!(
            "SELECT current_setting('{}', true);",
            self.config.tenant_variable
        )
    }

    /// Generate complete setup SQL for all configured tables.
    pub fn setup_sql(&self) -> String {
        let mut sql = String::with_capacity(4096);

        writeln!(sql, "-- Tenet multi-tenant RLS setup").unwrap();
        writeln!(sql, "-- Tenant column: {}", self.config.tenant_column).unwrap();
        writeln!(sql, "-- Tenant variable: {}", self.config.tenant_variable).unwrap();
        writeln!(sql, "-- Bypass variable: {}", self.config.bypass_variable).unwrap();
        writeln!(sql).unwrap();

        for table in &self.config.tables {
            if self.config.excluded_tables.contains(table) {
                continue;
            }

            writeln!(sql, "-- Table: {}", table).unwrap();
            writeln!(sql, "{}", self.enable_rls_sql(table)).unwrap();
            writeln!(sql, "{}", self.force_rls_sql(table)).unwrap();
            writeln!(sql, "{}", self.drop_policy_sql(table)).unwrap();
            writeln!(sql, "{}", self.create_policy_sql(table)).unwrap();
            if self.config.allow_bypass {
                writeln!(sql, "{}", self.create_bypass_policy_sql(table)).unwrap();
            }
            writeln!(sql).unwrap();
        }

        sql
    }

    /// Generate migration SQL to add RLS to a new table.
    pub fn migration_up_sql(&self, table: &str) -> String {
        let mut sql = String::with_capacity(512);

        writeln!(sql, "-- Enable RLS on {}", table).unwrap();
        writeln!(sql, "{}", self.enable_rls_sql(table)).unwrap();
        writeln!(sql, "{}", self.force_rls_sql(table)).unwrap();
        writeln!(sql, "{}", self.create_policy_sql(table)).unwrap();
        if self.config.allow_bypass {
            writeln!(sql, "{}", self.create_bypass_policy_sql(table)).unwrap();
        }

        sql
    }

    /// Generate migration SQL to remove RLS from a table.
    pub fn migration_down_sql(&self, table: &str) -> String {
        let mut sql = String::with_capacity(256);

        writeln!(sql, "-- Disable RLS on {}", table).unwrap();
        writeln!(sql, "{}", self.drop_policy_sql(table)).unwrap();
        writeln!(
            sql,
            "ALTER TABLE {} DISABLE ROW LEVEL SECURITY;",
            quote_ident(table)
        )
        .unwrap();

        sql
    }
}

/// Quote a PostgreSQL identifier when it is not a plain lowercase name.
fn quote_ident(name: &str) -> String {
    if !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.chars().next().unwrap().is_ascii_digit()
    {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn test_rls_config_defaults() {
        let config = RlsConfig::default();
        assert_eq!(config.tenant_column, "tenant_id");
        assert_eq!(config.tenant_variable, "app.tenant_id");
        assert_eq!(config.bypass_variable, "app.bypass_rls");
        assert!(config.allow_bypass);
    }

    #[test]
    fn test_set_tenant_local_sql() {
        let manager = RlsManager::default();
        let id = TenantId::new(Uuid::from_u128(1));

        let sql = manager.set_tenant_local_sql(&id);
        assert_eq!(
            sql,
            "SET LOCAL app.tenant_id = '00000000-0000-0000-0000-000000000001';"
        );
        assert!(sql.starts_with("SET LOCAL"));
    }

    #[test]
    fn test_create_policy_fails_closed() {
        let manager = RlsManager::default();

        let sql = manager.create_policy_sql("documents");
        assert!(sql.contains("CREATE POLICY"));
        // Missing-ok lookup: unset variable gives NULL, which matches no rows.
        assert!(sql.contains("tenant_id = current_setting('app.tenant_id', true)::uuid"));
        assert!(sql.contains("WITH CHECK"));
    }

    #[test]
    fn test_bypass_policy() {
        let manager = RlsManager::default();

        let sql = manager.create_bypass_policy_sql("documents");
        assert!(sql.contains("current_setting('app.bypass_rls', true)::boolean"));
        assert!(sql.contains("tenant_isolation_documents_bypass"));
    }

    #[test]
    fn test_setup_sql() {
        let config = RlsConfig::new("tenant_id").add_tables(["documents", "analyses"]);
        let manager = RlsManager::new(config);

        let sql = manager.setup_sql();
        assert!(sql.contains("ENABLE ROW LEVEL SECURITY"));
        assert!(sql.contains("FORCE ROW LEVEL SECURITY"));
        assert!(sql.contains("-- Table: documents"));
        assert!(sql.contains("-- Table: analyses"));
    }

    #[test]
    fn test_excluded_table_skipped() {
        let config = RlsConfig::new("tenant_id")
            .add_tables(["documents", "plans"])
            .exclude_table("plans");
        let manager = RlsManager::new(config);

        let sql = manager.setup_sql();
        assert!(sql.contains("-- Table: documents"));
        assert!(!sql.contains("-- Table: plans"));
    }

    #[test]
    fn test_migration_sql() {
        let manager = RlsManager::default();

        let up = manager.migration_up_sql("workflows");
        assert!(up.contains("ENABLE ROW LEVEL SECURITY"));
        assert!(up.contains("CREATE POLICY"));

        let down = manager.migration_down_sql("workflows");
        assert!(down.contains("DROP POLICY"));
        assert!(down.contains("DISABLE ROW LEVEL SECURITY"));
    }

    #[test]
    fn test_without_bypass() {
        let manager = RlsManager::new(RlsConfig::default().without_bypass().add_tables(["t"]));
        let sql = manager.setup_sql();
        assert!(!sql.contains("bypass"));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("documents"), "documents");
        assert_eq!(quote_ident("user-data"), "\"user-data\"");
        assert_eq!(quote_ident("Documents"), "\"Documents\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
