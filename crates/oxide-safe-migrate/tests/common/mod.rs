#![allow(dead_code)]

use std::path::Path;

use sqlx::Executor;

use oxide_safe_migrate::migrations;
use oxide_safe_migrate::prelude::*;

pub async fn memory() -> MigrationContext {
    MigrationContext::connect("sqlite::memory:")
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory SQLite: {e}"))
}

/// Opens (creating if needed) a SQLite database file inside `dir`.
pub async fn file(dir: &Path) -> MigrationContext {
    let url = format!("sqlite:{}?mode=rwc", dir.join("panel.sqlite3").display());
    MigrationContext::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("Failed to open {url}: {e}"))
}

pub async fn run(ctx: &mut MigrationContext, sql: &str) {
    ctx.connection()
        .execute(sql)
        .await
        .unwrap_or_else(|e| panic!("Failed to run: {sql}\nError: {e:?}"));
}

pub async fn upgrade(ctx: &mut MigrationContext) -> Vec<String> {
    migrations::executor()
        .unwrap()
        .upgrade(ctx, None)
        .await
        .unwrap_or_else(|e| panic!("Upgrade failed: {e}"))
}

/// JSON rendering of every table, in name order.
pub async fn catalog_dump(ctx: &mut MigrationContext) -> String {
    let mut tables = ctx.introspector().list_tables().await.unwrap();
    tables.sort();
    let mut descriptors = Vec::new();
    for table in tables {
        descriptors.push(ctx.introspector().describe_table(&table).await.unwrap());
    }
    serde_json::to_string_pretty(&descriptors).unwrap()
}

pub async fn count(ctx: &mut MigrationContext, sql: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql)
        .fetch_one(ctx.connection())
        .await
        .unwrap_or_else(|e| panic!("Failed to run: {sql}\nError: {e:?}"));
    n
}

/// Values of `column`, ordered by `id`.
pub async fn texts(ctx: &mut MigrationContext, table: &str, column: &str) -> Vec<String> {
    let sql = format!("SELECT {column} FROM {table} ORDER BY id");
    sqlx::query_as::<_, (String,)>(&sql)
        .fetch_all(ctx.connection())
        .await
        .unwrap_or_else(|e| panic!("Failed to run: {sql}\nError: {e:?}"))
        .into_iter()
        .map(|(v,)| v)
        .collect()
}
