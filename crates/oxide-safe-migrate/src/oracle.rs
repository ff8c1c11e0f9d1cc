//! Existence checks used to guard every structural change.
//!
//! Each predicate re-reads the catalog. None of them treats "not found" as
//! an error: a missing table simply makes the column, index and row checks
//! answer `false`.

use crate::context::MigrationContext;
use crate::error::Result;
use crate::seed::KeyFilter;

impl MigrationContext {
    /// Returns true if `table` exists.
    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let tables = self.introspector().list_tables().await?;
        Ok(tables.iter().any(|t| t == table))
    }

    /// Returns true if `table` exists and has a column named `column`.
    pub async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool> {
        let columns = self.introspector().list_columns(table).await?;
        Ok(columns.iter().any(|c| c.name == column))
    }

    /// Returns true if `table` exists and has an index named `index`.
    pub async fn index_exists(&mut self, table: &str, index: &str) -> Result<bool> {
        if !self.table_exists(table).await? {
            return Ok(false);
        }
        let indexes = self.introspector().list_indexes(table).await?;
        Ok(indexes.iter().any(|i| i.name == index))
    }

    /// Returns true if `table` exists and holds a row matching `key`.
    /// An empty key matches any row.
    pub async fn row_exists(&mut self, table: &str, key: &KeyFilter) -> Result<bool> {
        if !self.table_exists(table).await? {
            return Ok(false);
        }
        Ok(self.introspector().count_rows(table, key).await? > 0)
    }

    /// Returns true if a standalone enum type named `name` exists. Always
    /// false where enums are not catalog objects.
    pub async fn enum_type_exists(&mut self, name: &str) -> Result<bool> {
        self.introspector().enum_type_exists(name).await
    }
}
