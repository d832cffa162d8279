//! Tenant isolation guard.
//!
//! Every cross-table reference between tenant-scoped tables is a composite
//! foreign key `(ref_id, tenant_id) → parent(id, tenant_id)`. A dependent row
//! can therefore only point at a parent row carrying the same `tenant_id`; the
//! database rejects anything else.
//!
//! [`apply_tenant_constraints`] is re-runnable. Each statement runs under its
//! own savepoint: "already exists" and "does not exist" failures roll back to
//! the savepoint and are logged, anything else aborts the caller's transaction.

use sea_orm::{ConnectionTrait, DbErr, Statement};
use tracing::{error, info, warn};

use crate::error::sqlstate;

/// SQLSTATE codes treated as non-critical while applying constraints.
///
/// - `42710` duplicate_object (constraint already exists)
/// - `42P07` duplicate_table (backing index already exists)
/// - `42704` undefined_object (constraint to drop does not exist)
/// - `42P01` undefined_table (table not present in this environment)
pub const NON_CRITICAL_SQLSTATES: [&str; 4] = ["42710", "42P07", "42704", "42P01"];

/// Tables referenced by composite keys; each gets `UNIQUE (id, tenant_id)`.
pub const TENANT_PARENTS: [&str; 4] = ["users", "clients", "shifts", "invoices"];

/// What happens to the dependent row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete the dependent row.
    Cascade,
    /// Clear the reference column only; `tenant_id` is left intact.
    SetNull,
}

/// A tenant-scoped foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantReference {
    /// Dependent table.
    pub table: &'static str,
    /// Referencing column on the dependent table.
    pub column: &'static str,
    /// Referenced table (one of [`TENANT_PARENTS`]).
    pub parent: &'static str,
    /// Delete behaviour.
    pub on_delete: OnDelete,
}

/// Every cross-table reference that must stay within one tenant.
pub const TENANT_REFERENCES: [TenantReference; 16] = [
    TenantReference {
        table: "shifts",
        column: "client_id",
        parent: "clients",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "shifts",
        column: "assigned_user_id",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "shifts",
        column: "invoice_id",
        parent: "invoices",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "case_notes",
        column: "client_id",
        parent: "clients",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "case_notes",
        column: "shift_id",
        parent: "shifts",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "medication_records",
        column: "client_id",
        parent: "clients",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "care_plans",
        column: "client_id",
        parent: "clients",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "invoices",
        column: "client_id",
        parent: "clients",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "invoice_line_items",
        column: "invoice_id",
        parent: "invoices",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "invoice_line_items",
        column: "shift_id",
        parent: "shifts",
        on_delete: OnDelete::Cascade,
    },
    TenantReference {
        table: "shifts",
        column: "created_by",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "case_notes",
        column: "author_id",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "care_plans",
        column: "author_id",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "medication_records",
        column: "recorded_by",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    TenantReference {
        table: "invoices",
        column: "created_by",
        parent: "users",
        on_delete: OnDelete::SetNull,
    },
    // Created by a later migration; skipped as undefined_table until it exists.
    TenantReference {
        table: "sessions",
        column: "user_id",
        parent: "users",
        on_delete: OnDelete::Cascade,
    },
];

impl TenantReference {
    /// Name of the composite constraint, e.g. `fk_shifts_client_id_tenant`.
    #[must_use]
    pub fn constraint_name(&self) -> String {
        format!("fk_{}_{}_tenant", self.table, self.column)
    }

    /// Name `PostgreSQL` gives the single-column key from the initial schema.
    #[must_use]
    pub fn legacy_constraint_name(&self) -> String {
        format!("{}_{}_fkey", self.table, self.column)
    }

    fn on_delete_clause(&self) -> String {
        match self.on_delete {
            OnDelete::Cascade => "ON DELETE CASCADE".to_string(),
            // Column-list form (PostgreSQL 15+) keeps tenant_id NOT NULL intact.
            OnDelete::SetNull => format!("ON DELETE SET NULL ({})", self.column),
        }
    }

    /// `ALTER TABLE ... ADD CONSTRAINT` for the composite key.
    #[must_use]
    pub fn add_sql(&self) -> String {
        format!(
            "ALTER TABLE {table} ADD CONSTRAINT {name} FOREIGN KEY ({column}, tenant_id) \
             REFERENCES {parent} (id, tenant_id) {on_delete}",
            table = self.table,
            name = self.constraint_name(),
            column = self.column,
            parent = self.parent,
            on_delete = self.on_delete_clause(),
        )
    }

    /// `ALTER TABLE ... DROP CONSTRAINT` for the composite key.
    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table,
            self.constraint_name()
        )
    }

    fn drop_if_exists_sql(&self) -> String {
        format!(
            "ALTER TABLE IF EXISTS {} DROP CONSTRAINT IF EXISTS {}",
            self.table,
            self.constraint_name()
        )
    }

    fn drop_legacy_sql(&self) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table,
            self.legacy_constraint_name()
        )
    }

    fn restore_legacy_sql(&self) -> String {
        let on_delete = match self.on_delete {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        };
        format!(
            "ALTER TABLE IF EXISTS {table} ADD CONSTRAINT {name} FOREIGN KEY ({column}) \
             REFERENCES {parent} (id) ON DELETE {on_delete}",
            table = self.table,
            name = self.legacy_constraint_name(),
            column = self.column,
            parent = self.parent,
        )
    }
}

fn unique_constraint_name(parent: &str) -> String {
    format!("uq_{parent}_id_tenant")
}

/// One DDL statement of the constraint plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintStatement {
    /// Short label for logs.
    pub label: String,
    /// SQL to execute.
    pub sql: String,
}

impl ConstraintStatement {
    fn new(label: impl Into<String>, sql: String) -> Self {
        Self {
            label: label.into(),
            sql,
        }
    }
}

/// Statements applied by [`apply_tenant_constraints`], in order.
///
/// 1. drop existing composite keys (they depend on the unique constraints)
/// 2. drop the single-column keys from the initial schema
/// 3. drop and re-create `UNIQUE (id, tenant_id)` on each parent
/// 4. create the composite keys
#[must_use]
pub fn constraint_plan() -> Vec<ConstraintStatement> {
    let mut plan = Vec::new();

    for reference in &TENANT_REFERENCES {
        plan.push(ConstraintStatement::new(
            format!("drop {}", reference.constraint_name()),
            reference.drop_sql(),
        ));
    }

    for reference in &TENANT_REFERENCES {
        plan.push(ConstraintStatement::new(
            format!("drop {}", reference.legacy_constraint_name()),
            reference.drop_legacy_sql(),
        ));
    }

    for parent in TENANT_PARENTS {
        let name = unique_constraint_name(parent);
        plan.push(ConstraintStatement::new(
            format!("drop {name}"),
            format!("ALTER TABLE {parent} DROP CONSTRAINT {name}"),
        ));
        plan.push(ConstraintStatement::new(
            format!("add {name}"),
            format!("ALTER TABLE {parent} ADD CONSTRAINT {name} UNIQUE (id, tenant_id)"),
        ));
    }

    for reference in &TENANT_REFERENCES {
        plan.push(ConstraintStatement::new(
            format!("add {}", reference.constraint_name()),
            reference.add_sql(),
        ));
    }

    plan
}

/// Returns true if a failure with this SQLSTATE may be skipped.
#[must_use]
pub fn is_non_critical(code: &str) -> bool {
    NON_CRITICAL_SQLSTATES.contains(&code)
}

/// A statement that failed with a non-critical error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    /// Statement label.
    pub label: String,
    /// SQLSTATE returned by the server.
    pub sqlstate: String,
    /// Server message.
    pub message: String,
}

/// Outcome of [`apply_tenant_constraints`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Statements that succeeded.
    pub applied: usize,
    /// Statements skipped as non-critical.
    pub skipped: Vec<SkippedStatement>,
}

/// Applies the composite tenant keys.
///
/// Must run inside a transaction (migrations already do). On a critical
/// error the error is returned and the caller's transaction is expected to
/// roll back.
///
/// # Errors
///
/// Returns the first error whose SQLSTATE is not in [`NON_CRITICAL_SQLSTATES`].
pub async fn apply_tenant_constraints<C>(db: &C) -> Result<ApplyReport, DbErr>
where
    C: ConnectionTrait,
{
    let mut report = ApplyReport::default();

    for (index, statement) in constraint_plan().into_iter().enumerate() {
        let savepoint = format!("tenant_guard_{index}");
        db.execute_unprepared(&format!("SAVEPOINT {savepoint}"))
            .await?;

        match db.execute_unprepared(&statement.sql).await {
            Ok(_) => {
                db.execute_unprepared(&format!("RELEASE SAVEPOINT {savepoint}"))
                    .await?;
                report.applied += 1;
            }
            Err(err) => match sqlstate(&err) {
                Some(code) if is_non_critical(&code) => {
                    db.execute_unprepared(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
                        .await?;
                    db.execute_unprepared(&format!("RELEASE SAVEPOINT {savepoint}"))
                        .await?;
                    warn!(
                        statement = %statement.label,
                        sqlstate = %code,
                        error = %err,
                        "Skipping non-critical tenant constraint error"
                    );
                    report.skipped.push(SkippedStatement {
                        label: statement.label,
                        sqlstate: code,
                        message: err.to_string(),
                    });
                }
                code => {
                    error!(
                        statement = %statement.label,
                        sqlstate = code.as_deref().unwrap_or("unknown"),
                        error = %err,
                        "Tenant constraint migration failed"
                    );
                    return Err(err);
                }
            },
        }
    }

    Ok(report)
}

/// Removes the composite keys and restores the single-column ones.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn drop_tenant_constraints<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for reference in &TENANT_REFERENCES {
        restore_legacy_key(db, reference).await?;
    }

    for parent in TENANT_PARENTS {
        db.execute_unprepared(&format!(
            "ALTER TABLE {parent} DROP CONSTRAINT IF EXISTS {}",
            unique_constraint_name(parent)
        ))
        .await?;
    }

    Ok(())
}

/// Replaces the composite keys of one table with single-column ones.
///
/// A missing table is a no-op.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn drop_table_constraints<C>(db: &C, table: &str) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for reference in TENANT_REFERENCES.iter().filter(|r| r.table == table) {
        restore_legacy_key(db, reference).await?;
    }
    Ok(())
}

async fn restore_legacy_key<C>(db: &C, reference: &TenantReference) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    db.execute_unprepared(&reference.drop_if_exists_sql()).await?;
    db.execute_unprepared(&reference.restore_legacy_sql()).await?;
    Ok(())
}

const VERIFY_SQL: &str = r"
SELECT
    con.conname::text AS constraint_name,
    rel.relname::text AS table_name,
    ref.relname::text AS referenced_table,
    pg_get_constraintdef(con.oid) AS definition
FROM pg_constraint con
JOIN pg_class rel ON rel.oid = con.conrelid
JOIN pg_class ref ON ref.oid = con.confrelid
JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
WHERE con.contype = 'f'
  AND nsp.nspname = current_schema()
  AND array_length(con.conkey, 1) > 1
  AND EXISTS (
      SELECT 1
      FROM unnest(con.conkey) AS k(attnum)
      JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
      WHERE a.attname = 'tenant_id'
  )
ORDER BY rel.relname, con.conname
";

/// A composite foreign key found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantForeignKey {
    /// Constraint name.
    pub constraint_name: String,
    /// Dependent table.
    pub table_name: String,
    /// Referenced table.
    pub referenced_table: String,
    /// `pg_get_constraintdef` output.
    pub definition: String,
}

/// Lists every composite foreign key that includes `tenant_id`.
///
/// Each key is logged. Finding none logs a warning instead of failing, since
/// older environments may have applied the guard only partially.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub async fn verify_tenant_constraints<C>(db: &C) -> Result<Vec<TenantForeignKey>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            VERIFY_SQL.to_owned(),
        ))
        .await?;

    let mut keys = Vec::with_capacity(rows.len());
    for row in rows {
        keys.push(TenantForeignKey {
            constraint_name: row.try_get("", "constraint_name")?,
            table_name: row.try_get("", "table_name")?,
            referenced_table: row.try_get("", "referenced_table")?,
            definition: row.try_get("", "definition")?,
        });
    }

    if keys.is_empty() {
        warn!("No tenant-scoped foreign keys found; tenant isolation is not enforced by the database");
    }
    for key in &keys {
        info!(
            constraint = %key.constraint_name,
            table = %key.table_name,
            references = %key.referenced_table,
            definition = %key.definition,
            "Tenant foreign key"
        );
    }

    Ok(keys)
}
