//! ANSI fallback dialect.
//!
//! Used for any backend that is not recognized. Enumerations are rendered as
//! bounded strings with a `CHECK` constraint; capabilities that need a
//! vendor catalog are reported as unsupported by the introspector.

use crate::schema::{DefaultValue, SqlType};

use super::MigrationDialect;

/// Generic SQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
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
            SqlType::Enum(e) => {
                let longest = e.values.iter().map(String::len).max().unwrap_or(0);
                format!("VARCHAR({})", longest.max(32))
            }
        }
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn render_default(&self, default: &DefaultValue) -> Option<String> {
        match default {
            DefaultValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            other => other.to_sql(),
        }
    }
}
