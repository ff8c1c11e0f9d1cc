//! Database dialect resolution and SQL rendering.
//!
//! [`Dialect`] identifies the backend behind a live connection. Each variant
//! maps to a [`MigrationDialect`] strategy that knows how to render DDL for
//! that family of databases, including how enumerated types are represented.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::AnyConnection;

use crate::introspect::ColumnDescriptor;
use crate::schema::{quote_literal, ColumnSchema, DefaultValue, EnumType, IndexSchema, SqlType};

static SQLITE: SqliteDialect = SqliteDialect;
static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static GENERIC: GenericDialect = GenericDialect;

/// The dialect family of the connected database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// No native enums; enumerations are strings guarded by `CHECK` (SQLite).
    ConstrainedString,
    /// Enums are ordinal lists attached to a column (MySQL, MariaDB).
    OrdinalEnum,
    /// Enums are standalone catalog types (PostgreSQL).
    NativeEnum,
    /// Anything else; ANSI catalog only.
    ///
    /// The drivers `sqlx::any` ships report `SQLite`, `MySQL` and
    /// `PostgreSQL`, so a connection never resolves to this variant. It is
    /// reached only by naming it, and index listing, foreign key listing and
    /// the shadow rebuild are unsupported on it.
    Generic,
}

impl Dialect {
    /// Identifies the dialect of a live connection.
    #[must_use]
    pub fn resolve(conn: &AnyConnection) -> Self {
        Self::from_backend_name(conn.backend_name())
    }

    /// Maps an `sqlx` backend name to a dialect.
    #[must_use]
    pub fn from_backend_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" => Self::ConstrainedString,
            "mysql" | "mariadb" => Self::OrdinalEnum,
            "postgresql" | "postgres" => Self::NativeEnum,
            _ => Self::Generic,
        }
    }

    /// Returns the SQL rendering strategy for this dialect.
    #[must_use]
    pub fn strategy(self) -> &'static dyn MigrationDialect {
        match self {
            Self::ConstrainedString => &SQLITE,
            Self::OrdinalEnum => &MYSQL,
            Self::NativeEnum => &POSTGRES,
            Self::Generic => &GENERIC,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.strategy().name()
    }

    /// Returns whether DDL statements can be rolled back on this dialect.
    #[must_use]
    pub fn transactional_ddl(self) -> bool {
        self.strategy().supports_transactional_ddl()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for database-specific SQL generation.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String;

    /// Returns the auto-increment keyword placed after `PRIMARY KEY`.
    fn auto_increment_keyword(&self) -> &'static str;

    /// Returns whether DDL participates in transactions.
    fn supports_transactional_ddl(&self) -> bool;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> Option<String> {
        default.to_sql()
    }

    /// Returns the type used for a column, which may depend on more than
    /// its [`SqlType`] (e.g. serial types).
    fn column_type(&self, column: &ColumnSchema) -> String {
        self.type_name(&column.sql_type)
    }

    /// Returns the `CHECK` expression that restricts a string column to the
    /// values of `enum_type`, or `None` when the type system enforces it.
    fn enum_check(&self, column: &str, enum_type: &EnumType) -> Option<String> {
        Some(format!(
            "{} IN ({})",
            self.quote_identifier(column),
            enum_type.sql_literals()
        ))
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &ColumnSchema) -> String {
        let mut parts = vec![
            self.quote_identifier(&column.name),
            self.column_type(column),
        ];

        if column.primary_key {
            parts.push("PRIMARY KEY".to_string());
            if column.auto_increment && !self.auto_increment_keyword().is_empty() {
                parts.push(self.auto_increment_keyword().to_string());
            }
        }

        if !column.nullable && !column.primary_key {
            parts.push("NOT NULL".to_string());
        }

        if column.unique && !column.primary_key {
            parts.push("UNIQUE".to_string());
        }

        if let Some(default_sql) = self.render_default(&column.default) {
            parts.push(format!("DEFAULT {}", default_sql));
        }

        if let Some(check) = column
            .sql_type
            .as_enum()
            .and_then(|e| self.enum_check(&column.name, e))
        {
            parts.push(format!("CHECK ({})", check));
        }

        parts.join(" ")
    }

    /// Generates SQL for creating a table.
    fn create_table_sql(
        &self,
        name: &str,
        columns: &[ColumnSchema],
        primary_key: &[String],
    ) -> String {
        let mut sql = format!("CREATE TABLE {} (\n  ", self.quote_identifier(name));
        let col_defs: Vec<String> = columns.iter().map(|c| self.column_definition(c)).collect();
        sql.push_str(&col_defs.join(",\n  "));

        // Table-level key only when it is not already declared inline.
        let inline_pk = columns.iter().any(|c| c.primary_key);
        if !inline_pk && !primary_key.is_empty() {
            let quoted: Vec<String> = primary_key
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect();
            sql.push_str(&format!(",\n  PRIMARY KEY ({})", quoted.join(", ")));
        }

        sql.push_str("\n)");
        sql
    }

    /// Generates SQL for dropping a table.
    fn drop_table_sql(&self, name: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(name))
    }

    /// Generates SQL for renaming a table.
    fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(old_name),
            self.quote_identifier(new_name)
        )
    }

    /// Generates SQL for adding a column.
    fn add_column_sql(&self, table: &str, column: &ColumnSchema) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(column)
        )
    }

    /// Generates SQL for dropping a column.
    fn drop_column_sql(&self, table: &str, column_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table),
            self.quote_identifier(column_name)
        )
    }

    /// Generates SQL for creating an index.
    fn create_index_sql(&self, index: &IndexSchema) -> String {
        let quoted: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.table),
            quoted.join(", ")
        )
    }

    /// Generates SQL for dropping an index.
    fn drop_index_sql(&self, _table: &str, name: &str) -> String {
        format!("DROP INDEX {}", self.quote_identifier(name))
    }

    /// Generates SQL creating a standalone enum type, if the dialect has them.
    fn create_enum_type_sql(&self, _enum_type: &EnumType) -> Option<String> {
        None
    }

    /// Generates SQL dropping a standalone enum type, if the dialect has them.
    fn drop_enum_type_sql(&self, _name: &str) -> Option<String> {
        None
    }

    /// Generates SQL adding one value to a standalone enum type.
    fn add_enum_value_sql(&self, _enum_name: &str, _value: &str) -> Option<String> {
        None
    }

    /// Generates SQL restating an ordinal enum column with a new value list.
    fn redefine_enum_column_sql(
        &self,
        _table: &str,
        _column: &ColumnDescriptor,
        _enum_type: &EnumType,
        _nullable: bool,
    ) -> Option<String> {
        None
    }

    /// Generates SQL making a column NOT NULL in place.
    fn set_not_null_sql(&self, _table: &str, _column: &str) -> Option<String> {
        None
    }

    /// Generates SQL setting `column` to `value` wherever it is NULL.
    fn backfill_nulls_sql(&self, table: &str, column: &str, value: &str) -> String {
        let column = self.quote_identifier(column);
        format!(
            "UPDATE {} SET {} = {} WHERE {} IS NULL",
            self.quote_identifier(table),
            column,
            quote_literal(value),
            column
        )
    }
}
