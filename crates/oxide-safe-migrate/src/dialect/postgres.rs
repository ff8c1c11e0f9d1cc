//! PostgreSQL dialect for migrations.
//!
//! Enumerations are standalone catalog types created with `CREATE TYPE ...
//! AS ENUM` and referenced by name from columns. New values are appended with
//! `ALTER TYPE ... ADD VALUE`, which cannot be used in the same transaction
//! that later references the new value.

use crate::schema::{quote_literal, ColumnSchema, DefaultValue, EnumType, SqlType};

use super::MigrationDialect;

/// PostgreSQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({})", len),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Enum(e) => self.quote_identifier(&e.name),
        }
    }

    fn auto_increment_keyword(&self) -> &'static str {
        // Serial types carry the sequence.
        ""
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn column_type(&self, column: &ColumnSchema) -> String {
        if column.auto_increment {
            match column.sql_type {
                SqlType::Integer => return "SERIAL".to_string(),
                SqlType::BigInt => return "BIGSERIAL".to_string(),
                SqlType::SmallInt => return "SMALLSERIAL".to_string(),
                _ => {}
            }
        }
        self.type_name(&column.sql_type)
    }

    fn render_default(&self, default: &DefaultValue) -> Option<String> {
        match default {
            DefaultValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            other => other.to_sql(),
        }
    }

    fn enum_check(&self, _column: &str, _enum_type: &EnumType) -> Option<String> {
        None
    }

    fn create_enum_type_sql(&self, enum_type: &EnumType) -> Option<String> {
        Some(format!(
            "CREATE TYPE {} AS ENUM ({})",
            self.quote_identifier(&enum_type.name),
            enum_type.sql_literals()
        ))
    }

    fn drop_enum_type_sql(&self, name: &str) -> Option<String> {
        Some(format!("DROP TYPE {}", self.quote_identifier(name)))
    }

    fn add_enum_value_sql(&self, enum_name: &str, value: &str) -> Option<String> {
        Some(format!(
            "ALTER TYPE {} ADD VALUE IF NOT EXISTS {}",
            self.quote_identifier(enum_name),
            quote_literal(value)
        ))
    }

    fn set_not_null_sql(&self, table: &str, column: &str) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
            self.quote_identifier(table),
            self.quote_identifier(column)
        ))
    }
}
