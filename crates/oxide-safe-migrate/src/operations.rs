//! Migration operations.
//!
//! This module defines the schema changes a migration can express. Every
//! operation is applied through [`crate::MigrationContext::apply`], which
//! consults the catalog first and skips operations whose target state
//! already holds.

use serde::{Deserialize, Serialize};

use crate::enums::EnumExtension;
use crate::schema::{ColumnSchema, EnumType, IndexSchema};
use crate::seed::{KeyFilter, SeedRow};

/// A single migration operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationOperation {
    /// Create a new table.
    CreateTable {
        /// Table name.
        name: String,
        /// Column definitions.
        columns: Vec<ColumnSchema>,
        /// Primary key column(s), when not declared on a column.
        primary_key: Vec<String>,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        name: String,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column definition.
        column: ColumnSchema,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column_name: String,
    },

    /// Create an index.
    CreateIndex(IndexSchema),

    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
        /// Table the index belongs to.
        table: String,
    },

    /// Create a standalone enum type. Only materialized where enums are
    /// catalog objects.
    CreateEnumType(EnumType),

    /// Drop a standalone enum type.
    DropEnumType {
        /// Type name.
        name: String,
    },

    /// Widen the value set of an enumerated column.
    ExtendEnum(EnumExtension),

    /// Insert fixed rows unless a row matching `key` exists.
    SeedRows {
        /// Table name.
        table: String,
        /// Rows to insert.
        rows: Vec<SeedRow>,
        /// Natural key identifying the seed.
        key: KeyFilter,
    },

    /// Run raw SQL. Not guarded.
    RunSql {
        /// Forward SQL statement.
        forward: String,
        /// Backward SQL statement for rollback.
        backward: Option<String>,
    },
}

/// What to do with an operation when its migration is rolled back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reversal {
    /// Apply this operation.
    Op(MigrationOperation),
    /// Leave the forward change in place, for the given reason.
    Skip(&'static str),
    /// The forward change cannot be undone.
    Irreversible,
}

impl MigrationOperation {
    /// Creates a CreateTable operation.
    #[must_use]
    pub fn create_table(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: Vec<String>,
    ) -> Self {
        Self::CreateTable {
            name: name.into(),
            columns,
            primary_key,
        }
    }

    /// Creates a DropTable operation.
    #[must_use]
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }

    /// Creates an AddColumn operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnSchema) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a DropColumn operation.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column_name: column_name.into(),
        }
    }

    /// Creates a CreateIndex operation.
    #[must_use]
    pub fn create_index(index: IndexSchema) -> Self {
        Self::CreateIndex(index)
    }

    /// Creates a DropIndex operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::DropIndex {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates a CreateEnumType operation.
    #[must_use]
    pub fn create_enum_type(enum_type: EnumType) -> Self {
        Self::CreateEnumType(enum_type)
    }

    /// Creates a DropEnumType operation.
    #[must_use]
    pub fn drop_enum_type(name: impl Into<String>) -> Self {
        Self::DropEnumType { name: name.into() }
    }

    /// Creates an ExtendEnum operation.
    #[must_use]
    pub fn extend_enum(extension: EnumExtension) -> Self {
        Self::ExtendEnum(extension)
    }

    /// Creates a SeedRows operation.
    #[must_use]
    pub fn seed_rows(table: impl Into<String>, rows: Vec<SeedRow>, key: KeyFilter) -> Self {
        Self::SeedRows {
            table: table.into(),
            rows,
            key,
        }
    }

    /// Creates a RunSql operation.
    #[must_use]
    pub fn run_sql(forward: impl Into<String>, backward: Option<String>) -> Self {
        Self::RunSql {
            forward: forward.into(),
            backward,
        }
    }

    /// Returns what rollback should do with this operation.
    #[must_use]
    pub fn reverse(&self) -> Reversal {
        match self {
            Self::CreateTable { name, .. } => Reversal::Op(Self::drop_table(name.clone())),
            Self::AddColumn { table, column } => {
                Reversal::Op(Self::drop_column(table.clone(), column.name.clone()))
            }
            Self::CreateIndex(index) => {
                Reversal::Op(Self::drop_index(index.name.clone(), index.table.clone()))
            }
            Self::CreateEnumType(enum_type) => {
                Reversal::Op(Self::drop_enum_type(enum_type.name.clone()))
            }
            // Removing a value could orphan rows that hold it.
            Self::ExtendEnum(_) => Reversal::Skip("enum values are never removed"),
            Self::SeedRows { .. } => Reversal::Skip("seed rows are removed with their table"),
            Self::RunSql { forward, backward } => match backward {
                Some(bwd) => Reversal::Op(Self::RunSql {
                    forward: bwd.clone(),
                    backward: Some(forward.clone()),
                }),
                None => Reversal::Irreversible,
            },
            // The original definition is not known.
            Self::DropTable { .. }
            | Self::DropColumn { .. }
            | Self::DropIndex { .. }
            | Self::DropEnumType { .. } => Reversal::Irreversible,
        }
    }

    /// Returns true if rollback can proceed past this operation.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        !matches!(self.reverse(), Reversal::Irreversible)
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { name, .. } => format!("Create table '{}'", name),
            Self::DropTable { name } => format!("Drop table '{}'", name),
            Self::AddColumn { table, column } => {
                format!("Add column '{}' to table '{}'", column.name, table)
            }
            Self::DropColumn { table, column_name } => {
                format!("Drop column '{}' from table '{}'", column_name, table)
            }
            Self::CreateIndex(index) => {
                format!("Create index '{}' on table '{}'", index.name, index.table)
            }
            Self::DropIndex { name, table } => {
                format!("Drop index '{}' from table '{}'", name, table)
            }
            Self::CreateEnumType(enum_type) => format!("Create enum type '{}'", enum_type.name),
            Self::DropEnumType { name } => format!("Drop enum type '{}'", name),
            Self::ExtendEnum(ext) => format!(
                "Extend enum '{}' on '{}.{}' with {}",
                ext.enum_name,
                ext.table,
                ext.column,
                ext.values.join(", ")
            ),
            Self::SeedRows { table, rows, .. } => {
                format!("Seed {} row(s) into table '{}'", rows.len(), table)
            }
            Self::RunSql { .. } => "Run custom SQL".to_string(),
        }
    }
}
