//! Error types for the migration system.

use crate::rebuild::RebuildStep;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The catalog could not be queried (broken connection, missing privilege).
    #[error("Introspection failed while running `{query}`: {source}")]
    Introspection {
        /// The catalog query that failed.
        query: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The resolved dialect has no strategy for the requested capability.
    #[error("Operation '{operation}' is not supported by the {dialect} dialect")]
    UnsupportedDialectOperation {
        /// Name of the resolved dialect.
        dialect: &'static str,
        /// The capability that has no implementation.
        operation: &'static str,
    },

    /// Database error while executing DDL or DML.
    ///
    /// A duplicate-object error surfacing here means a guard is missing.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A step of the shadow-table rebuild failed.
    #[error("Rebuild of table '{table}' failed at step {step}: {source}")]
    RebuildFailed {
        /// Table being rebuilt.
        table: String,
        /// Protocol step that failed.
        step: RebuildStep,
        /// Underlying error.
        #[source]
        source: Box<MigrateError>,
    },

    /// A migration has a circular dependency.
    #[error("Circular dependency detected in migrations at '{0}'")]
    CircularDependency(String),

    /// A migration depends on another that doesn't exist.
    #[error("Migration '{migration}' depends on '{dependency}' which doesn't exist")]
    MissingDependency {
        /// The migration with the missing dependency.
        migration: String,
        /// The dependency that's missing.
        dependency: String,
    },

    /// A migration is not reversible.
    #[error("Migration '{0}' is not reversible")]
    NotReversible(String),

    /// Migration not found.
    #[error("Migration not found: {0}")]
    MigrationNotFound(String),

    /// Invalid migration state.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),

    /// A migration failed after others in the same run had completed.
    #[error(
        "Migration '{failed}' failed after {} completed in this run ({}): {source}",
        .completed.len(),
        .completed.join(", ")
    )]
    PartialRun {
        /// Revision that failed.
        failed: String,
        /// Revisions that completed before the failure.
        completed: Vec<String>,
        /// Whether the dialect can roll back DDL.
        transactional_ddl: bool,
        /// Underlying error.
        #[source]
        source: Box<MigrateError>,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrateError {
    /// Wraps a driver error raised by a catalog query.
    pub(crate) fn introspection(query: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Introspection {
            query: query.into(),
            source,
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_run_message_names_completed_revisions() {
        let err = MigrateError::PartialRun {
            failed: "0003".to_string(),
            completed: vec!["0001".to_string(), "0002".to_string()],
            transactional_ddl: false,
            source: Box::new(MigrateError::InvalidState("boom".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("'0003'"));
        assert!(msg.contains("after 2 completed"));
        assert!(msg.contains("0001, 0002"));
        assert!(msg.ends_with("Invalid migration state: boom"));
    }

    #[test]
    fn test_unsupported_message() {
        let err = MigrateError::UnsupportedDialectOperation {
            dialect: "generic",
            operation: "list_indexes",
        };
        assert_eq!(
            err.to_string(),
            "Operation 'list_indexes' is not supported by the generic dialect"
        );
    }
}
