//! Widening the value set of an enumerated column.
//!
//! The algorithm depends on how the dialect represents enumerations:
//!
//! - native enum types get one `ALTER TYPE ... ADD VALUE` per missing value,
//!   each autocommitted on its own;
//! - ordinal `ENUM(...)` columns are restated in full with the union of the
//!   current and requested values;
//! - string columns guarded by a `CHECK` (SQLite) are rebuilt through a
//!   shadow table (see [`crate::rebuild`]).
//!
//! Values are only ever added. Existing rows keep their values.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::MigrationContext;
use crate::ddl::Applied;
use crate::dialect::{Dialect, MigrationDialect};
use crate::error::{MigrateError, Result};
use crate::introspect::{parse_enum_type, ColumnDescriptor};
use crate::schema::EnumType;

/// A request to widen an enumerated column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumExtension {
    /// Table holding the column.
    pub table: String,
    /// The enumerated column.
    pub column: String,
    /// Name of the enum type.
    pub enum_name: String,
    /// Target value set, in the desired order.
    pub values: Vec<String>,
    /// Value written into existing NULL rows. The column becomes NOT NULL
    /// when a backfill is given, on every dialect.
    pub backfill: Option<String>,
}

impl EnumExtension {
    /// Creates an extension without backfill.
    #[must_use]
    pub fn new<I, S>(
        table: impl Into<String>,
        column: impl Into<String>,
        enum_name: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            column: column.into(),
            enum_name: enum_name.into(),
            values: values.into_iter().map(Into::into).collect(),
            backfill: None,
        }
    }

    /// Sets the value written into existing NULL rows.
    #[must_use]
    pub fn backfill(mut self, value: impl Into<String>) -> Self {
        self.backfill = Some(value.into());
        self
    }

    /// Returns the requested value set as an enum type.
    #[must_use]
    pub fn target(&self) -> EnumType {
        EnumType::new(self.enum_name.clone(), self.values.iter().cloned())
    }

    /// The backfill value, when `column` still accepts NULL.
    fn pending_backfill(&self, column: &ColumnDescriptor) -> Option<&str> {
        self.backfill.as_deref().filter(|_| column.nullable)
    }

    /// Plans the statements widening a native enum type from `current`,
    /// in execution order. Empty when there is nothing left to do.
    pub fn native_statements(
        &self,
        dialect: &dyn MigrationDialect,
        column: &ColumnDescriptor,
        current: &EnumType,
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        // One statement per value: a value added in a transaction cannot be
        // used until that transaction commits.
        for value in current.missing(&self.values) {
            statements.push(
                dialect
                    .add_enum_value_sql(&self.enum_name, value)
                    .ok_or_else(|| unsupported(dialect, "add_enum_value"))?,
            );
        }
        if let Some(value) = self.pending_backfill(column) {
            statements.push(dialect.backfill_nulls_sql(&self.table, &self.column, value));
            statements.push(
                dialect
                    .set_not_null_sql(&self.table, &self.column)
                    .ok_or_else(|| unsupported(dialect, "set_not_null"))?,
            );
        }
        Ok(statements)
    }

    /// Plans the statements restating an ordinal `ENUM(...)` column whose
    /// values are `current`, in execution order. Empty when there is
    /// nothing left to do.
    ///
    /// Rows can only be backfilled with a value the column already accepts.
    /// When the backfill value is new, the column is first widened with its
    /// nullability unchanged, then backfilled, then restated NOT NULL.
    pub fn ordinal_statements(
        &self,
        dialect: &dyn MigrationDialect,
        column: &ColumnDescriptor,
        current: &EnumType,
    ) -> Result<Vec<String>> {
        let missing = !current.is_superset_of(&self.target());
        let widened = if missing {
            current.extended_with(&self.values)
        } else {
            current.clone()
        };
        let redefine = |nullable: bool| {
            dialect
                .redefine_enum_column_sql(&self.table, column, &widened, nullable)
                .ok_or_else(|| unsupported(dialect, "redefine_enum_column"))
        };

        let mut statements = Vec::new();
        if let Some(value) = self.pending_backfill(column) {
            if missing && !current.contains(value) {
                statements.push(redefine(true)?);
            }
            statements.push(dialect.backfill_nulls_sql(&self.table, &self.column, value));
            statements.push(redefine(false)?);
        } else if missing {
            statements.push(redefine(column.nullable)?);
        }
        Ok(statements)
    }
}

fn unsupported(dialect: &dyn MigrationDialect, operation: &'static str) -> MigrateError {
    MigrateError::UnsupportedDialectOperation {
        dialect: dialect.name(),
        operation,
    }
}

impl MigrationContext {
    /// Widens an enumerated column so that it accepts every requested value.
    ///
    /// Skipped when every value is already accepted and no NULL row needs a
    /// backfill. Fails with [`MigrateError::InvalidState`] when the column is
    /// missing, when the backfill is not one of the requested values, or
    /// when a native enum type does not exist. The generic dialect has no
    /// way to widen a column and fails with
    /// [`MigrateError::UnsupportedDialectOperation`].
    pub async fn extend_enum(&mut self, extension: &EnumExtension) -> Result<Applied> {
        if let Some(backfill) = &extension.backfill {
            if !extension.values.contains(backfill) {
                return Err(MigrateError::InvalidState(format!(
                    "Backfill value '{}' is not one of the values of enum '{}'",
                    backfill, extension.enum_name
                )));
            }
        }

        if !self.column_exists(&extension.table, &extension.column).await? {
            if self.is_dry_run() {
                info!(
                    table = %extension.table,
                    column = %extension.column,
                    "Column not present in dry run, enum extension deferred"
                );
                return Ok(Applied::Skipped);
            }
            return Err(MigrateError::InvalidState(format!(
                "Cannot extend enum '{}': column '{}.{}' does not exist",
                extension.enum_name, extension.table, extension.column
            )));
        }

        let applied = match self.dialect() {
            Dialect::NativeEnum => self.extend_native_enum(extension).await?,
            Dialect::OrdinalEnum => self.extend_ordinal_enum(extension).await?,
            Dialect::ConstrainedString | Dialect::Generic => {
                self.rebuild_for_enum(extension).await?
            }
        };

        if applied.is_executed() {
            info!(
                table = %extension.table,
                column = %extension.column,
                values = %extension.values.join(", "),
                "Extended enum"
            );
        }
        Ok(applied)
    }

    async fn extend_native_enum(&mut self, extension: &EnumExtension) -> Result<Applied> {
        let current = self
            .introspector()
            .enum_values(&extension.table, &extension.column, &extension.enum_name)
            .await?
            .ok_or_else(|| {
                MigrateError::InvalidState(format!(
                    "Enum type '{}' does not exist",
                    extension.enum_name
                ))
            })?;
        let column = self.enum_column(extension).await?;
        let statements = extension.native_statements(self.strategy(), &column, &current)?;
        self.execute_all(&statements).await
    }

    async fn extend_ordinal_enum(&mut self, extension: &EnumExtension) -> Result<Applied> {
        let column = self.enum_column(extension).await?;
        let values = parse_enum_type(&column.type_name).ok_or_else(|| {
            MigrateError::InvalidState(format!(
                "Column '{}.{}' is not an ENUM column (found {})",
                extension.table, extension.column, column.type_name
            ))
        })?;
        let current = EnumType::new(extension.enum_name.clone(), values);
        let statements = extension.ordinal_statements(self.strategy(), &column, &current)?;
        self.execute_all(&statements).await
    }

    async fn enum_column(&mut self, extension: &EnumExtension) -> Result<ColumnDescriptor> {
        self.introspector()
            .list_columns(&extension.table)
            .await?
            .into_iter()
            .find(|c| c.name == extension.column)
            .ok_or_else(|| {
                MigrateError::InvalidState(format!(
                    "Column '{}.{}' disappeared during enum extension",
                    extension.table, extension.column
                ))
            })
    }

    async fn execute_all(&mut self, statements: &[String]) -> Result<Applied> {
        for sql in statements {
            self.execute(sql).await?;
        }
        Ok(if statements.is_empty() {
            Applied::Skipped
        } else {
            Applied::Executed
        })
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Executor;

    use super::*;

    fn role_extension() -> EnumExtension {
        EnumExtension::new(
            "admins",
            "role",
            "adminrole",
            ["standard", "reseller", "sudo", "full_access"],
        )
        .backfill("standard")
    }

    async fn sqlite_with_admins() -> MigrationContext {
        let mut ctx = MigrationContext::connect("sqlite::memory:").await.unwrap();
        ctx.connection()
            .execute(
                "CREATE TABLE admins (
                     id INTEGER PRIMARY KEY,
                     username VARCHAR(32) NOT NULL,
                     role TEXT NOT NULL CHECK (role IN ('standard', 'sudo', 'full_access'))
                 );
                 INSERT INTO admins (username, role) VALUES ('root', 'sudo');",
            )
            .await
            .unwrap();
        ctx
    }

    fn role_column(type_name: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: "role".to_string(),
            type_name: type_name.to_string(),
            nullable,
            default: None,
            primary_key: 0,
            generated: false,
        }
    }

    fn ordinal(values: &[&str], nullable: bool) -> Vec<String> {
        let current = EnumType::new("adminrole", values.iter().copied());
        let column = role_column("enum(..)", nullable);
        role_extension()
            .ordinal_statements(Dialect::OrdinalEnum.strategy(), &column, &current)
            .unwrap()
    }

    fn native(values: &[&str], nullable: bool) -> Vec<String> {
        let current = EnumType::new("adminrole", values.iter().copied());
        let column = role_column("adminrole", nullable);
        role_extension()
            .native_statements(Dialect::NativeEnum.strategy(), &column, &current)
            .unwrap()
    }

    const MODIFY: &str = "ALTER TABLE `admins` MODIFY COLUMN `role` \
                          ENUM('standard', 'reseller', 'sudo', 'full_access')";
    const ORDINAL_BACKFILL: &str = "UPDATE `admins` SET `role` = 'standard' WHERE `role` IS NULL";

    #[test]
    fn test_ordinal_backfill_already_accepted() {
        assert_eq!(
            ordinal(&["standard", "sudo", "full_access"], true),
            vec![ORDINAL_BACKFILL.to_string(), format!("{MODIFY} NOT NULL")]
        );
    }

    #[test]
    fn test_ordinal_backfill_not_yet_accepted() {
        assert_eq!(
            ordinal(&["sudo", "full_access"], true),
            vec![
                MODIFY.to_string(),
                ORDINAL_BACKFILL.to_string(),
                format!("{MODIFY} NOT NULL"),
            ]
        );
    }

    #[test]
    fn test_ordinal_nullable_column_tightened() {
        assert_eq!(
            ordinal(&["standard", "reseller", "sudo", "full_access"], true),
            vec![ORDINAL_BACKFILL.to_string(), format!("{MODIFY} NOT NULL")]
        );
    }

    #[test]
    fn test_ordinal_widened_only() {
        assert_eq!(
            ordinal(&["sudo", "full_access"], false),
            vec![format!("{MODIFY} NOT NULL")]
        );
    }

    #[test]
    fn test_ordinal_nothing_left_to_do() {
        assert!(ordinal(&["standard", "reseller", "sudo", "full_access"], false).is_empty());
        assert!(ordinal(&["full_access", "sudo", "reseller", "standard"], false).is_empty());
    }

    #[test]
    fn test_native_adds_only_missing_values() {
        assert_eq!(
            native(&["standard", "sudo", "full_access"], false),
            vec!["ALTER TYPE \"adminrole\" ADD VALUE IF NOT EXISTS 'reseller'"]
        );
    }

    #[test]
    fn test_native_nullable_column_tightened() {
        assert_eq!(
            native(&["standard", "reseller", "sudo", "full_access"], true),
            vec![
                "UPDATE \"admins\" SET \"role\" = 'standard' WHERE \"role\" IS NULL",
                "ALTER TABLE \"admins\" ALTER COLUMN \"role\" SET NOT NULL",
            ]
        );
    }

    #[test]
    fn test_native_nothing_left_to_do() {
        assert!(native(&["standard", "reseller", "sudo", "full_access"], false).is_empty());
    }

    #[test]
    fn test_ordinal_needs_an_ordinal_dialect() {
        let current = EnumType::new("adminrole", ["standard"]);
        let err = role_extension()
            .ordinal_statements(
                Dialect::NativeEnum.strategy(),
                &role_column("adminrole", false),
                &current,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::UnsupportedDialectOperation {
                operation: "redefine_enum_column",
                ..
            }
        ));
    }

    #[test]
    fn test_target() {
        let ext = role_extension();
        assert_eq!(ext.target().values.len(), 4);
        assert_eq!(ext.backfill.as_deref(), Some("standard"));
    }

    #[tokio::test]
    async fn test_backfill_must_be_a_requested_value() {
        let mut ctx = sqlite_with_admins().await;
        let ext = EnumExtension::new("admins", "role", "adminrole", ["standard"]).backfill("bogus");
        let err = ctx.extend_enum(&ext).await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_missing_column_is_invalid_state() {
        let mut ctx = sqlite_with_admins().await;
        let ext = EnumExtension::new("admins", "kind", "kind", ["a"]);
        let err = ctx.extend_enum(&ext).await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));
        assert!(ctx.journal().is_empty());
    }

    #[tokio::test]
    async fn test_extend_then_skip() {
        let mut ctx = sqlite_with_admins().await;
        assert_eq!(
            ctx.extend_enum(&role_extension()).await.unwrap(),
            Applied::Executed
        );
        ctx.take_journal();

        assert_eq!(
            ctx.extend_enum(&role_extension()).await.unwrap(),
            Applied::Skipped
        );
        assert!(ctx.journal().is_empty());

        ctx.connection()
            .execute("INSERT INTO admins (username, role) VALUES ('bob', 'reseller')")
            .await
            .unwrap();
        let (role,): (String,) = sqlx::query_as("SELECT role FROM admins WHERE username = 'root'")
            .fetch_one(ctx.connection())
            .await
            .unwrap();
        assert_eq!(role, "sudo");
    }
}
