//! oxide-safe-migrate CLI
//!
//! Command-line tool for running the built-in migration chain.

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_safe_migrate::migrations;
use oxide_safe_migrate::prelude::*;

/// Idempotent, dialect-aware schema migrations.
#[derive(Parser)]
#[command(name = "oxide-safe-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (sqlite:, mysql: or postgres:).
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:db.sqlite3?mode=rwc"
    )]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations up to a revision.
    Upgrade {
        /// Last revision to apply (all if not specified).
        #[arg(short, long)]
        target: Option<String>,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Roll back migrations down to a revision.
    Downgrade {
        /// Revision to stop at, which stays applied (all if not specified).
        #[arg(short, long)]
        target: Option<String>,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// List the revisions in the chain.
    ShowMigrations,

    /// Show the dialect resolved for the database.
    Dialect,

    /// Print the live definition of a table as JSON.
    Inspect {
        /// Table name.
        table: String,
    },

    /// Show the SQL the chain would run against this database.
    Sql {
        /// Show rollback SQL instead of forward SQL.
        #[arg(short, long)]
        reverse: bool,
    },
}

fn print_statements(statements: &[String]) {
    if statements.is_empty() {
        println!("-- nothing to do");
    }
    for sql in statements {
        println!("{};", sql.trim_end_matches(';'));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let executor = migrations::executor()?;
    let mut ctx = MigrationContext::connect(&cli.database).await?;

    match cli.command {
        Commands::Upgrade { target, dry_run } => {
            let mut ctx = ctx.dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let ran = executor.upgrade(&mut ctx, target.as_deref()).await?;
            info!(revisions = %ran.join(", "), "Upgraded");
            if dry_run {
                print_statements(&ctx.take_journal());
            }
            ctx.close().await?;
        }

        Commands::Downgrade { target, dry_run } => {
            let mut ctx = ctx.dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let ran = executor.downgrade(&mut ctx, target.as_deref()).await?;
            info!(revisions = %ran.join(", "), "Downgraded");
            if dry_run {
                print_statements(&ctx.take_journal());
            }
            ctx.close().await?;
        }

        Commands::ShowMigrations => {
            println!("\nMigrations:");
            println!("{:-<60}", "");
            for migration in executor.migrations() {
                println!(
                    " {} <- {} {}{}",
                    migration.revision,
                    migration.down_revision.as_deref().unwrap_or("(base)"),
                    migration.description,
                    if migration.is_reversible() {
                        ""
                    } else {
                        " [irreversible]"
                    }
                );
            }
            println!();
            ctx.close().await?;
        }

        Commands::Dialect => {
            let dialect = ctx.dialect();
            println!(
                "{} (transactional DDL: {})",
                dialect.name(),
                if dialect.transactional_ddl() { "yes" } else { "no" }
            );
            ctx.close().await?;
        }

        Commands::Inspect { table } => {
            let Some(descriptor) = ctx.introspector().describe_table(&table).await? else {
                anyhow::bail!("Table '{}' does not exist", table);
            };
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            ctx.close().await?;
        }

        Commands::Sql { reverse } => {
            let mut ctx = ctx.dry_run(true);
            if reverse {
                executor.downgrade(&mut ctx, None).await?;
            } else {
                executor.upgrade(&mut ctx, None).await?;
            }
            print_statements(&ctx.take_journal());
            ctx.close().await?;
        }
    }

    Ok(())
}
