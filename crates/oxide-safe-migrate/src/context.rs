//! The execution context every migration step runs against.

use sqlx::{AnyConnection, Connection, Executor};
use tracing::{debug, info};

use crate::dialect::{Dialect, MigrationDialect};
use crate::error::Result;
use crate::introspect::Introspector;

/// One connection, its resolved dialect, and a journal of the mutating
/// statements issued through it.
///
/// The dialect is resolved once when the context is created. All guard
/// checks re-query the catalog through [`MigrationContext::introspector`];
/// nothing is cached between operations.
pub struct MigrationContext {
    conn: AnyConnection,
    dialect: Dialect,
    dry_run: bool,
    journal: Vec<String>,
}

impl MigrationContext {
    /// Opens a connection to `url` and resolves its dialect.
    pub async fn connect(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let conn = AnyConnection::connect(url).await?;
        Ok(Self::new(conn))
    }

    /// Wraps an open connection.
    pub fn new(conn: AnyConnection) -> Self {
        let dialect = Dialect::resolve(&conn);
        info!(backend = conn.backend_name(), dialect = %dialect, "Resolved dialect");
        Self {
            conn,
            dialect,
            dry_run: false,
            journal: Vec::new(),
        }
    }

    /// When enabled, mutating statements are journaled but not executed.
    /// Guard checks still read the live catalog.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns true if statements are only journaled.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the resolved dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the SQL rendering strategy of the resolved dialect.
    pub fn strategy(&self) -> &'static dyn MigrationDialect {
        self.dialect.strategy()
    }

    /// Returns the statements issued so far.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    /// Returns the statements issued so far and clears the journal.
    pub fn take_journal(&mut self) -> Vec<String> {
        std::mem::take(&mut self.journal)
    }

    /// Returns a catalog reader over this context's connection.
    pub fn introspector(&mut self) -> Introspector<'_> {
        Introspector::new(&mut self.conn, self.dialect)
    }

    /// Returns the underlying connection.
    pub fn connection(&mut self) -> &mut AnyConnection {
        &mut self.conn
    }

    /// Closes the connection.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    /// Journals and executes one mutating statement.
    pub(crate) async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, dry_run = self.dry_run, "Executing SQL");
        self.journal.push(sql.to_string());
        if !self.dry_run {
            self.conn.execute(sql).await?;
        }
        Ok(())
    }

    /// Executes a session setting that changes no schema. Not journaled.
    pub(crate) async fn set_session(&mut self, sql: &str) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        debug!(sql = %sql, "Setting session option");
        self.conn.execute(sql).await?;
        Ok(())
    }

    /// Reads one integer session setting, such as a SQLite pragma.
    pub(crate) async fn session_flag(&mut self, sql: &str) -> Result<i64> {
        let (value,): (i64,) = sqlx::query_as(sql).fetch_one(&mut self.conn).await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_journals_statements() {
        let mut ctx = MigrationContext::connect("sqlite::memory:").await.unwrap();
        assert_eq!(ctx.dialect(), Dialect::ConstrainedString);

        ctx.execute("CREATE TABLE t (id INTEGER)").await.unwrap();
        assert_eq!(ctx.journal(), ["CREATE TABLE t (id INTEGER)"]);
        assert!(ctx.introspector().list_tables().await.unwrap().contains(&"t".to_string()));

        let taken = ctx.take_journal();
        assert_eq!(taken.len(), 1);
        assert!(ctx.journal().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_does_not_touch_catalog() {
        let mut ctx = MigrationContext::connect("sqlite::memory:")
            .await
            .unwrap()
            .dry_run(true);
        assert!(ctx.is_dry_run());

        ctx.execute("CREATE TABLE t (id INTEGER)").await.unwrap();
        assert_eq!(ctx.journal().len(), 1);
        assert!(ctx.introspector().list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_flag() {
        let mut ctx = MigrationContext::connect("sqlite::memory:").await.unwrap();
        ctx.set_session("PRAGMA foreign_keys = ON").await.unwrap();
        assert_eq!(ctx.session_flag("PRAGMA foreign_keys").await.unwrap(), 1);
        assert!(ctx.journal().is_empty());
    }
}
