//! Migration executor.
//!
//! This module runs a linear chain of migrations forward or backward. No
//! record of applied revisions is kept: every operation is guarded, so
//! running a unit whose changes already exist is a no-op.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::context::MigrationContext;
use crate::error::{MigrateError, Result};
use crate::operations::{MigrationOperation, Reversal};

/// A migration ready to be executed.
#[derive(Debug, Clone)]
pub struct ExecutableMigration {
    /// Revision identifier.
    pub revision: String,
    /// Revision this one applies on top of.
    pub down_revision: Option<String>,
    /// Human-readable summary.
    pub description: String,
    /// Migration operations, in forward order.
    pub operations: Vec<MigrationOperation>,
}

impl ExecutableMigration {
    /// Creates a new executable migration.
    #[must_use]
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            down_revision: None,
            description: String::new(),
            operations: Vec::new(),
        }
    }

    /// Sets the revision this one applies on top of.
    #[must_use]
    pub fn down_revision(mut self, revision: Option<&str>) -> Self {
        self.down_revision = revision.map(ToString::to_string);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds an operation to this migration.
    #[must_use]
    pub fn operation(mut self, op: MigrationOperation) -> Self {
        self.operations.push(op);
        self
    }

    /// Adds operations to this migration.
    #[must_use]
    pub fn operations(mut self, ops: Vec<MigrationOperation>) -> Self {
        self.operations.extend(ops);
        self
    }

    /// Returns whether this migration can be rolled back.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.operations.iter().all(MigrationOperation::is_reversible)
    }

    /// Applies every operation in order.
    pub async fn forward(&self, ctx: &mut MigrationContext) -> Result<()> {
        info!(revision = %self.revision, "Upgrading");
        for operation in &self.operations {
            ctx.apply(operation).await?;
        }
        Ok(())
    }

    /// Reverses every operation in reverse order.
    ///
    /// Fails with [`MigrateError::NotReversible`] before touching the
    /// database if any operation cannot be reversed.
    pub async fn backward(&self, ctx: &mut MigrationContext) -> Result<()> {
        if !self.is_reversible() {
            return Err(MigrateError::NotReversible(self.revision.clone()));
        }

        info!(revision = %self.revision, "Downgrading");
        for operation in self.operations.iter().rev() {
            match operation.reverse() {
                Reversal::Op(reverse) => {
                    ctx.apply(&reverse).await?;
                }
                Reversal::Skip(reason) => {
                    warn!(
                        revision = %self.revision,
                        operation = %operation.description(),
                        reason,
                        "Leaving change in place"
                    );
                }
                Reversal::Irreversible => {
                    return Err(MigrateError::NotReversible(self.revision.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Checks that `chain` is linear: each migration's down revision names the
/// one before it, and the first has none.
pub fn validate_chain(chain: &[ExecutableMigration]) -> Result<()> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (i, migration) in chain.iter().enumerate() {
        if positions.insert(&migration.revision, i).is_some() {
            return Err(MigrateError::InvalidState(format!(
                "Duplicate revision '{}'",
                migration.revision
            )));
        }
    }

    for (i, migration) in chain.iter().enumerate() {
        match migration.down_revision.as_deref() {
            None if i == 0 => {}
            None => {
                return Err(MigrateError::InvalidState(format!(
                    "Migration '{}' has no down revision but is not the first",
                    migration.revision
                )))
            }
            Some(dependency) => match positions.get(dependency) {
                None => {
                    return Err(MigrateError::MissingDependency {
                        migration: migration.revision.clone(),
                        dependency: dependency.to_string(),
                    })
                }
                Some(&j) if j >= i => {
                    return Err(MigrateError::CircularDependency(migration.revision.clone()))
                }
                Some(&j) if j + 1 != i => {
                    return Err(MigrateError::InvalidState(format!(
                        "Migration '{}' branches from '{}'; only linear chains are supported",
                        migration.revision, dependency
                    )))
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}

/// Executes a validated chain of migrations.
#[derive(Debug, Clone)]
pub struct MigrationExecutor {
    chain: Vec<ExecutableMigration>,
}

impl MigrationExecutor {
    /// Creates a new migration executor.
    pub fn new(chain: Vec<ExecutableMigration>) -> Result<Self> {
        validate_chain(&chain)?;
        Ok(Self { chain })
    }

    /// Returns the chain in forward order.
    #[must_use]
    pub fn migrations(&self) -> &[ExecutableMigration] {
        &self.chain
    }

    /// Returns the revision identifiers in forward order.
    #[must_use]
    pub fn revisions(&self) -> Vec<&str> {
        self.chain.iter().map(|m| m.revision.as_str()).collect()
    }

    fn position(&self, revision: &str) -> Result<usize> {
        self.chain
            .iter()
            .position(|m| m.revision == revision)
            .ok_or_else(|| MigrateError::MigrationNotFound(revision.to_string()))
    }

    /// Runs every migration forward up to and including `target` (all
    /// when `None`). Returns the revisions that ran.
    pub async fn upgrade(
        &self,
        ctx: &mut MigrationContext,
        target: Option<&str>,
    ) -> Result<Vec<String>> {
        let end = match target {
            Some(revision) => self.position(revision)? + 1,
            None => self.chain.len(),
        };

        let mut completed = Vec::new();
        for migration in &self.chain[..end] {
            if let Err(e) = migration.forward(ctx).await {
                return Err(partial(ctx, migration, completed, e));
            }
            completed.push(migration.revision.clone());
        }

        info!(count = completed.len(), "Upgrade complete");
        Ok(completed)
    }

    /// Runs migrations backward, newest first, down to but excluding
    /// `target` (all when `None`). Returns the revisions that ran.
    pub async fn downgrade(
        &self,
        ctx: &mut MigrationContext,
        target: Option<&str>,
    ) -> Result<Vec<String>> {
        let start = match target {
            Some(revision) => self.position(revision)? + 1,
            None => 0,
        };

        let mut completed = Vec::new();
        for migration in self.chain[start..].iter().rev() {
            if let Err(e) = migration.backward(ctx).await {
                return Err(partial(ctx, migration, completed, e));
            }
            completed.push(migration.revision.clone());
        }

        info!(count = completed.len(), "Downgrade complete");
        Ok(completed)
    }
}

fn partial(
    ctx: &MigrationContext,
    failed: &ExecutableMigration,
    completed: Vec<String>,
    source: MigrateError,
) -> MigrateError {
    if completed.is_empty() {
        return source;
    }
    let transactional_ddl = ctx.dialect().transactional_ddl();
    warn!(
        failed = %failed.revision,
        completed = %completed.join(", "),
        transactional_ddl,
        "Run stopped part way"
    );
    MigrateError::PartialRun {
        failed: failed.revision.clone(),
        completed,
        transactional_ddl,
        source: Box::new(source),
    }
}
