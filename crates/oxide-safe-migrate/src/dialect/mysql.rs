//! MySQL/MariaDB dialect for migrations.
//!
//! MySQL attaches enumerations to the column as an ordinal `ENUM(...)` list,
//! so widening one restates the whole column definition with
//! `ALTER TABLE ... MODIFY COLUMN`. DDL commits implicitly.

use crate::introspect::ColumnDescriptor;
use crate::schema::{quote_literal, DefaultValue, EnumType, SqlType};

use super::MigrationDialect;

/// MySQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({})", len),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamp => "DATETIME".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Enum(e) => format!("ENUM({})", e.sql_literals()),
        }
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
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

    fn drop_index_sql(&self, table: &str, name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.quote_identifier(table)
        )
    }

    fn redefine_enum_column_sql(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        enum_type: &EnumType,
        nullable: bool,
    ) -> Option<String> {
        let mut sql = format!(
            "ALTER TABLE {} MODIFY COLUMN {} ENUM({})",
            self.quote_identifier(table),
            self.quote_identifier(&column.name),
            enum_type.sql_literals()
        );
        if !nullable {
            sql.push_str(" NOT NULL");
        }
        match column.default.as_deref() {
            None => {}
            Some(d) if d.eq_ignore_ascii_case("NULL") => {
                if nullable {
                    sql.push_str(" DEFAULT NULL");
                }
            }
            // MariaDB reports quoted literals, MySQL reports the bare value.
            Some(d) if d.starts_with('\'') => sql.push_str(&format!(" DEFAULT {}", d)),
            Some(d) => sql.push_str(&format!(" DEFAULT {}", quote_literal(d))),
        }
        Some(sql)
    }
}
