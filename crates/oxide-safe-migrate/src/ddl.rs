//! Conditional DDL.
//!
//! Every structural change is preceded by an existence check, and skipped
//! when the target state already holds. Errors raised by the database itself
//! are never caught here: a duplicate-object error reaching the caller means
//! a guard is missing.

use tracing::{debug, info, warn};

use crate::context::MigrationContext;
use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};
use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, EnumType, IndexSchema};

/// Outcome of a guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// At least one statement was issued.
    Executed,
    /// The target state already held; nothing was issued.
    Skipped,
}

impl Applied {
    /// Returns true if a statement was issued.
    #[must_use]
    pub fn is_executed(self) -> bool {
        self == Self::Executed
    }

    /// Combines two outcomes; executed wins.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        if self.is_executed() || other.is_executed() {
            Self::Executed
        } else {
            Self::Skipped
        }
    }
}

impl MigrationContext {
    /// Applies one operation, unless its target state already holds.
    pub async fn apply(&mut self, operation: &MigrationOperation) -> Result<Applied> {
        debug!(operation = %operation.description(), "Applying operation");
        let applied = match operation {
            MigrationOperation::CreateTable {
                name,
                columns,
                primary_key,
            } => self.create_table_if_absent(name, columns, primary_key).await?,
            MigrationOperation::DropTable { name } => self.drop_table_if_present(name).await?,
            MigrationOperation::AddColumn { table, column } => {
                self.add_column_if_absent(table, column).await?
            }
            MigrationOperation::DropColumn { table, column_name } => {
                self.drop_column_if_present(table, column_name).await?
            }
            MigrationOperation::CreateIndex(index) => self.create_index_if_absent(index).await?,
            MigrationOperation::DropIndex { name, table } => {
                self.drop_index_if_present(table, name).await?
            }
            MigrationOperation::CreateEnumType(enum_type) => {
                self.create_enum_type_if_absent(enum_type).await?
            }
            MigrationOperation::DropEnumType { name } => {
                self.drop_enum_type_if_present(name).await?
            }
            MigrationOperation::ExtendEnum(extension) => self.extend_enum(extension).await?,
            MigrationOperation::SeedRows { table, rows, key } => {
                self.seed_if_absent(table, rows, key).await?
            }
            MigrationOperation::RunSql { forward, .. } => {
                self.execute(forward).await?;
                Applied::Executed
            }
        };

        if applied == Applied::Skipped {
            info!(operation = %operation.description(), "Target state already holds, skipping");
        }
        Ok(applied)
    }

    /// Creates `name` unless it exists. Enum types used by the columns are
    /// created first where enums are catalog objects.
    pub async fn create_table_if_absent(
        &mut self,
        name: &str,
        columns: &[ColumnSchema],
        primary_key: &[String],
    ) -> Result<Applied> {
        if self.table_exists(name).await? {
            return Ok(Applied::Skipped);
        }
        for column in columns {
            if let Some(enum_type) = column.sql_type.as_enum() {
                self.ensure_enum_type(enum_type).await?;
            }
        }
        let sql = self.strategy().create_table_sql(name, columns, primary_key);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Adds `column` to `table` unless it exists.
    ///
    /// Fails with [`MigrateError::InvalidState`] if the table is missing.
    pub async fn add_column_if_absent(
        &mut self,
        table: &str,
        column: &ColumnSchema,
    ) -> Result<Applied> {
        self.require_table(table, "add column").await?;
        if self.column_exists(table, &column.name).await? {
            return Ok(Applied::Skipped);
        }
        if let Some(enum_type) = column.sql_type.as_enum() {
            self.ensure_enum_type(enum_type).await?;
        }
        let sql = self.strategy().add_column_sql(table, column);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Creates `index` unless an index of that name exists on its table.
    ///
    /// Fails with [`MigrateError::InvalidState`] if the table is missing.
    pub async fn create_index_if_absent(&mut self, index: &IndexSchema) -> Result<Applied> {
        self.require_table(&index.table, "create index").await?;
        if self.index_exists(&index.table, &index.name).await? {
            return Ok(Applied::Skipped);
        }
        let sql = self.strategy().create_index_sql(index);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Drops `column` from `table` if it exists.
    pub async fn drop_column_if_present(&mut self, table: &str, column: &str) -> Result<Applied> {
        if !self.column_exists(table, column).await? {
            return Ok(Applied::Skipped);
        }
        let sql = self.strategy().drop_column_sql(table, column);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Drops index `name` of `table` if it exists.
    pub async fn drop_index_if_present(&mut self, table: &str, name: &str) -> Result<Applied> {
        if !self.index_exists(table, name).await? {
            return Ok(Applied::Skipped);
        }
        let sql = self.strategy().drop_index_sql(table, name);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Drops `name` if it exists.
    pub async fn drop_table_if_present(&mut self, name: &str) -> Result<Applied> {
        if !self.table_exists(name).await? {
            return Ok(Applied::Skipped);
        }
        let sql = self.strategy().drop_table_sql(name);
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Creates a standalone enum type unless it exists. A no-op where enums
    /// are not catalog objects.
    pub async fn create_enum_type_if_absent(&mut self, enum_type: &EnumType) -> Result<Applied> {
        let Some(sql) = self.strategy().create_enum_type_sql(enum_type) else {
            return Ok(Applied::Skipped);
        };
        if self.enum_type_exists(&enum_type.name).await? {
            return Ok(Applied::Skipped);
        }
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    /// Drops a standalone enum type if it exists.
    pub async fn drop_enum_type_if_present(&mut self, name: &str) -> Result<Applied> {
        let Some(sql) = self.strategy().drop_enum_type_sql(name) else {
            return Ok(Applied::Skipped);
        };
        if !self.enum_type_exists(name).await? {
            return Ok(Applied::Skipped);
        }
        self.execute(&sql).await?;
        Ok(Applied::Executed)
    }

    async fn ensure_enum_type(&mut self, enum_type: &EnumType) -> Result<()> {
        if self.dialect() == Dialect::NativeEnum {
            self.create_enum_type_if_absent(enum_type).await?;
        }
        Ok(())
    }

    /// Fails unless `table` exists. In dry run a missing table is tolerated,
    /// since it may be created by a statement that was only journaled.
    pub(crate) async fn require_table(&mut self, table: &str, action: &str) -> Result<()> {
        if self.table_exists(table).await? {
            return Ok(());
        }
        if self.is_dry_run() {
            warn!(table = %table, "Table not present in dry run, assuming it is planned");
            return Ok(());
        }
        Err(MigrateError::InvalidState(format!(
            "Cannot {}: table '{}' does not exist",
            action, table
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DefaultValue, SqlType};

    async fn context() -> MigrationContext {
        MigrationContext::connect("sqlite::memory:").await.unwrap()
    }

    fn system_columns() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::new("id", SqlType::Integer).primary_key(),
            ColumnSchema::new("uplink", SqlType::BigInt),
        ]
    }

    #[tokio::test]
    async fn test_create_table_twice_skips_second() {
        let mut ctx = context().await;
        let op = MigrationOperation::create_table("system", system_columns(), vec![]);

        assert_eq!(ctx.apply(&op).await.unwrap(), Applied::Executed);
        assert_eq!(ctx.apply(&op).await.unwrap(), Applied::Skipped);
        assert_eq!(ctx.journal().len(), 1);
    }

    #[tokio::test]
    async fn test_add_column_guarded() {
        let mut ctx = context().await;
        ctx.create_table_if_absent("panel_settings", &[ColumnSchema::new("id", SqlType::Integer).primary_key()], &[])
            .await
            .unwrap();
        let column = ColumnSchema::new("backup_enabled", SqlType::Boolean)
            .not_null()
            .default(DefaultValue::Bool(false));

        assert_eq!(
            ctx.add_column_if_absent("panel_settings", &column).await.unwrap(),
            Applied::Executed
        );
        assert_eq!(
            ctx.add_column_if_absent("panel_settings", &column).await.unwrap(),
            Applied::Skipped
        );
        assert!(ctx.column_exists("panel_settings", "backup_enabled").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_column_to_missing_table_is_invalid_state() {
        let mut ctx = context().await;
        let err = ctx
            .add_column_if_absent("missing", &ColumnSchema::new("x", SqlType::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));
        assert!(ctx.journal().is_empty());
    }

    #[tokio::test]
    async fn test_create_index_guarded() {
        let mut ctx = context().await;
        ctx.create_table_if_absent("system", &system_columns(), &[])
            .await
            .unwrap();
        let index = IndexSchema::new("ix_system_id", "system", ["id"]).unique();

        assert_eq!(ctx.create_index_if_absent(&index).await.unwrap(), Applied::Executed);
        assert_eq!(ctx.create_index_if_absent(&index).await.unwrap(), Applied::Skipped);
    }

    #[tokio::test]
    async fn test_drops_are_guarded() {
        let mut ctx = context().await;
        ctx.create_table_if_absent("system", &system_columns(), &[])
            .await
            .unwrap();
        ctx.create_index_if_absent(&IndexSchema::new("ix_uplink", "system", ["uplink"]))
            .await
            .unwrap();
        ctx.take_journal();

        assert_eq!(
            ctx.drop_index_if_present("system", "ix_uplink").await.unwrap(),
            Applied::Executed
        );
        assert_eq!(
            ctx.drop_index_if_present("system", "ix_uplink").await.unwrap(),
            Applied::Skipped
        );
        assert_eq!(
            ctx.drop_column_if_present("system", "uplink").await.unwrap(),
            Applied::Executed
        );
        assert_eq!(
            ctx.drop_column_if_present("system", "uplink").await.unwrap(),
            Applied::Skipped
        );
        assert_eq!(ctx.drop_table_if_present("system").await.unwrap(), Applied::Executed);
        assert_eq!(ctx.drop_table_if_present("system").await.unwrap(), Applied::Skipped);
        assert_eq!(ctx.journal().len(), 3);
    }

    #[tokio::test]
    async fn test_enum_type_operations_are_noops_without_native_enums() {
        let mut ctx = context().await;
        let roles = EnumType::new("adminrole", ["standard", "sudo"]);
        assert_eq!(
            ctx.apply(&MigrationOperation::create_enum_type(roles)).await.unwrap(),
            Applied::Skipped
        );
        assert_eq!(
            ctx.apply(&MigrationOperation::drop_enum_type("adminrole")).await.unwrap(),
            Applied::Skipped
        );
        assert!(ctx.journal().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_tolerates_planned_table() {
        let mut ctx = context().await.dry_run(true);
        ctx.apply(&MigrationOperation::create_table("system", system_columns(), vec![]))
            .await
            .unwrap();
        let applied = ctx
            .apply(&MigrationOperation::create_index(IndexSchema::new(
                "ix_system_id",
                "system",
                ["id"],
            )))
            .await
            .unwrap();
        assert_eq!(applied, Applied::Executed);
        assert_eq!(ctx.journal().len(), 2);
        assert!(!ctx.table_exists("system").await.unwrap());
    }

    #[test]
    fn test_applied_or() {
        assert_eq!(Applied::Skipped.or(Applied::Executed), Applied::Executed);
        assert_eq!(Applied::Skipped.or(Applied::Skipped), Applied::Skipped);
    }
}
