//! SQLite dialect for migrations.
//!
//! SQLite has limited ALTER TABLE support: a column's type or constraints
//! cannot be changed in place, so widening an enumerated column goes through
//! the shadow-table rebuild in [`crate::rebuild`]. Enumerations are stored as
//! `TEXT` guarded by a `CHECK (col IN (...))` constraint.

use crate::schema::SqlType;

use super::MigrationDialect;

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer | SqlType::SmallInt | SqlType::BigInt => "INTEGER".to_string(),
            SqlType::Text | SqlType::Varchar(_) | SqlType::Enum(_) => "TEXT".to_string(),
            SqlType::Boolean => "INTEGER".to_string(),
            SqlType::Timestamp => "TEXT".to_string(),
            SqlType::Double => "REAL".to_string(),
        }
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, DefaultValue, EnumType, IndexSchema};

    fn dialect() -> SqliteDialect {
        SqliteDialect::new()
    }

    #[test]
    fn test_create_table_simple() {
        let sql = dialect().create_table_sql(
            "users",
            &[
                ColumnSchema::new("id", SqlType::BigInt)
                    .primary_key()
                    .auto_increment(),
                ColumnSchema::new("name", SqlType::Varchar(255)).not_null(),
            ],
            &["id".to_string()],
        );

        assert!(sql.starts_with("CREATE TABLE \"users\""));
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"name\" TEXT NOT NULL"));
        assert!(!sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_create_table_composite_key() {
        let sql = dialect().create_table_sql(
            "memberships",
            &[
                ColumnSchema::new("user_id", SqlType::BigInt).not_null(),
                ColumnSchema::new("group_id", SqlType::BigInt).not_null(),
            ],
            &["user_id".to_string(), "group_id".to_string()],
        );
        assert!(sql.contains("PRIMARY KEY (\"user_id\", \"group_id\")"));
    }

    #[test]
    fn test_enum_column_gets_check_constraint() {
        let role = ColumnSchema::new(
            "role",
            SqlType::Enum(EnumType::new("adminrole", ["standard", "sudo"])),
        )
        .not_null();

        assert_eq!(
            dialect().column_definition(&role),
            "\"role\" TEXT NOT NULL CHECK (\"role\" IN ('standard', 'sudo'))"
        );
    }

    #[test]
    fn test_add_column_with_default() {
        let sql = dialect().add_column_sql(
            "panel_settings",
            &ColumnSchema::new("backup_enabled", SqlType::Boolean)
                .not_null()
                .default(DefaultValue::Bool(false)),
        );
        assert_eq!(
            sql,
            "ALTER TABLE \"panel_settings\" ADD COLUMN \"backup_enabled\" INTEGER NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn test_drop_column() {
        assert_eq!(
            dialect().drop_column_sql("services", "flow"),
            "ALTER TABLE \"services\" DROP COLUMN \"flow\""
        );
    }

    #[test]
    fn test_rename_table() {
        assert_eq!(
            dialect().rename_table_sql("_shadow_admins", "admins"),
            "ALTER TABLE \"_shadow_admins\" RENAME TO \"admins\""
        );
    }

    #[test]
    fn test_create_and_drop_index() {
        let index = IndexSchema::new("ix_system_id", "system", ["id"]).unique();
        assert_eq!(
            dialect().create_index_sql(&index),
            "CREATE UNIQUE INDEX \"ix_system_id\" ON \"system\" (\"id\")"
        );
        assert_eq!(
            dialect().drop_index_sql("system", "ix_system_id"),
            "DROP INDEX \"ix_system_id\""
        );
    }

    #[test]
    fn test_no_native_enum_statements() {
        let e = EnumType::new("adminrole", ["standard"]);
        assert!(dialect().create_enum_type_sql(&e).is_none());
        assert!(dialect().add_enum_value_sql("adminrole", "x").is_none());
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(dialect().quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_backfill_nulls() {
        assert_eq!(
            dialect().backfill_nulls_sql("admins", "role", "standard"),
            "UPDATE \"admins\" SET \"role\" = 'standard' WHERE \"role\" IS NULL"
        );
    }
}
