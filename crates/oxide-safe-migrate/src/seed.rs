//! Idempotent seed data.
//!
//! A seed is a set of fixed rows identified by a natural key. The loader
//! checks for the key first and inserts only when it is absent, so the rows
//! exist exactly once however many times the migration runs, including when
//! another provisioning path already created them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::MigrationContext;
use crate::ddl::Applied;
use crate::dialect::MigrationDialect;
use crate::error::Result;
use crate::schema::{quote_literal, DefaultValue};

/// A literal value in a seed row or key filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Text.
    Text(String),
}

impl Value {
    /// Renders the value as an inline SQL literal for `dialect`.
    pub fn to_sql(&self, dialect: &dyn MigrationDialect) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => dialect
                .render_default(&DefaultValue::Bool(*b))
                .unwrap_or_else(|| if *b { "1" } else { "0" }.to_string()),
            Self::Integer(i) => i.to_string(),
            Self::Text(s) => quote_literal(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One row to insert, as ordered column/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRow {
    /// Column/value pairs in insertion order.
    pub values: Vec<(String, Value)>,
}

impl SeedRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Renders the `INSERT` statement for this row.
    pub fn insert_sql(&self, dialect: &dyn MigrationDialect, table: &str) -> String {
        let columns: Vec<String> = self
            .values
            .iter()
            .map(|(c, _)| dialect.quote_identifier(c))
            .collect();
        let values: Vec<String> = self.values.iter().map(|(_, v)| v.to_sql(dialect)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_identifier(table),
            columns.join(", "),
            values.join(", ")
        )
    }
}

/// Identifies seed rows by column equality. An empty filter matches any row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFilter {
    /// Column/value pairs that must all match.
    pub columns: Vec<(String, Value)>,
}

impl KeyFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `column` to equal `value`. [`Value::Null`] matches `IS NULL`.
    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Returns true if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Renders the conditions joined by `AND`, or `None` for an empty filter.
    pub fn where_clause(&self, dialect: &dyn MigrationDialect) -> Option<String> {
        if self.columns.is_empty() {
            return None;
        }
        let conditions: Vec<String> = self
            .columns
            .iter()
            .map(|(column, value)| match value {
                Value::Null => format!("{} IS NULL", dialect.quote_identifier(column)),
                v => format!("{} = {}", dialect.quote_identifier(column), v.to_sql(dialect)),
            })
            .collect();
        Some(conditions.join(" AND "))
    }
}

impl MigrationContext {
    /// Inserts `rows` into `table` unless a row matching `key` already exists.
    pub async fn seed_if_absent(
        &mut self,
        table: &str,
        rows: &[SeedRow],
        key: &KeyFilter,
    ) -> Result<Applied> {
        if self.row_exists(table, key).await? {
            info!(table = %table, "Seed rows already present");
            return Ok(Applied::Skipped);
        }

        let dialect = self.strategy();
        for row in rows {
            let sql = row.insert_sql(dialect, table);
            self.execute(&sql).await?;
        }
        info!(table = %table, rows = rows.len(), "Seeded rows");
        Ok(Applied::Executed)
    }
}
