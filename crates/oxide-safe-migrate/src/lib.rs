//! Idempotent, dialect-aware schema migrations.
//!
//! `oxide-safe-migrate` applies schema changes that are safe to run against a
//! database in any prior state:
//! - Every structural change is guarded by a live catalog check, so a second
//!   run issues no statements
//! - Enumerated columns are widened with whatever mechanism the backend
//!   offers (native enum types, ordinal `ENUM` columns, or a shadow-table
//!   rebuild for `CHECK`-constrained strings)
//! - Seed rows are inserted exactly once, keyed by a natural key
//!
//! # Architecture
//!
//! - **Oracle** - Read-only existence predicates over the live catalog
//! - **DDL** - Guarded create/add/drop operations
//! - **Enums** - Enum value extension per dialect
//! - **Rebuild** - The shadow-table rebuild protocol
//! - **Seed** - Exactly-once seed rows
//! - **Dialect** - Capability resolution and SQL rendering per backend
//! - **Executor** - Runs a linear revision chain forward or backward
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_safe_migrate::prelude::*;
//!
//! pub struct AddServiceNote;
//!
//! impl SafeMigration for AddServiceNote {
//!     const REVISION: &'static str = "0005_service_note";
//!     const DOWN_REVISION: Option<&'static str> = Some("0d1e2f3g4h5i");
//!
//!     fn operations() -> Vec<MigrationOperation> {
//!         vec![MigrationOperation::add_column(
//!             "services",
//!             ColumnSchema::new("note", SqlType::Text),
//!         )]
//!     }
//! }
//!
//! let mut chain = oxide_safe_migrate::migrations::chain();
//! chain.push(AddServiceNote::to_executable());
//!
//! let mut ctx = MigrationContext::connect("sqlite::memory:").await?;
//! MigrationExecutor::new(chain)?.upgrade(&mut ctx, None).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply every migration
//! oxide-safe-migrate upgrade
//!
//! # Print the statements a run would issue
//! oxide-safe-migrate upgrade --dry-run
//!
//! # Roll back to a revision
//! oxide-safe-migrate downgrade --target 3cf36a5fde73
//! ```

pub mod context;
pub mod ddl;
pub mod dialect;
pub mod enums;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod migrations;
pub mod operations;
pub mod oracle;
pub mod rebuild;
pub mod schema;
pub mod seed;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::context::MigrationContext;
    pub use crate::ddl::Applied;
    pub use crate::dialect::{
        Dialect, GenericDialect, MigrationDialect, MySqlDialect, PostgresDialect, SqliteDialect,
    };
    pub use crate::enums::EnumExtension;
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{ExecutableMigration, MigrationExecutor};
    pub use crate::introspect::{
        ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexOrigin, Introspector,
        TableDescriptor,
    };
    pub use crate::operations::{MigrationOperation, Reversal};
    pub use crate::rebuild::RebuildStep;
    pub use crate::schema::{
        ColumnSchema, DefaultValue, EnumType, ForeignKeyAction, IndexSchema, SqlType,
    };
    pub use crate::seed::{KeyFilter, SeedRow, Value};
    pub use crate::SafeMigration;
}

/// Trait for migrations defined in Rust code.
///
/// Revisions form a single linear chain: each names the revision it applies
/// on top of.
pub trait SafeMigration {
    /// Revision identifier (e.g., "0001_base_tables", "3cf36a5fde73").
    const REVISION: &'static str;

    /// Revision this one applies on top of. `None` for the first.
    const DOWN_REVISION: Option<&'static str> = None;

    /// Human-readable summary.
    const DESCRIPTION: &'static str = "";

    /// Returns the migration operations.
    fn operations() -> Vec<operations::MigrationOperation>;

    /// Converts to an executable migration.
    fn to_executable() -> executor::ExecutableMigration {
        executor::ExecutableMigration::new(Self::REVISION)
            .down_revision(Self::DOWN_REVISION)
            .description(Self::DESCRIPTION)
            .operations(Self::operations())
    }
}
