//! Integration tests for exactly-once seed rows.

mod common;

use oxide_safe_migrate::prelude::*;

use common::{count, run};

fn system_row() -> SeedRow {
    SeedRow::new()
        .set("id", 1)
        .set("uplink", 0)
        .set("downlink", 0)
}

fn system_key() -> KeyFilter {
    KeyFilter::new().where_eq("id", 1)
}

async fn system_table() -> MigrationContext {
    let mut ctx = common::memory().await;
    run(
        &mut ctx,
        "CREATE TABLE system (id INTEGER PRIMARY KEY, uplink BIGINT, downlink BIGINT)",
    )
    .await;
    ctx
}

#[tokio::test]
async fn fresh_table_is_seeded() {
    let mut ctx = system_table().await;
    let applied = ctx
        .seed_if_absent("system", &[system_row()], &system_key())
        .await
        .unwrap();
    assert_eq!(applied, Applied::Executed);
    assert_eq!(count(&mut ctx, "SELECT COUNT(*) FROM system").await, 1);
}

#[tokio::test]
async fn row_created_elsewhere_is_left_alone() {
    let mut ctx = system_table().await;
    run(
        &mut ctx,
        "INSERT INTO system (id, uplink, downlink) VALUES (1, 42, 43)",
    )
    .await;

    let applied = ctx
        .seed_if_absent("system", &[system_row()], &system_key())
        .await
        .unwrap();
    assert_eq!(applied, Applied::Skipped);
    assert_eq!(
        count(&mut ctx, "SELECT uplink FROM system WHERE id = 1").await,
        42
    );
}

#[tokio::test]
async fn rerun_inserts_nothing() {
    let mut ctx = system_table().await;
    for _ in 0..3 {
        ctx.seed_if_absent("system", &[system_row()], &system_key())
            .await
            .unwrap();
    }
    assert_eq!(ctx.journal().len(), 1);
    assert_eq!(count(&mut ctx, "SELECT COUNT(*) FROM system").await, 1);
}

#[tokio::test]
async fn seed_through_operation() {
    let mut ctx = system_table().await;
    let op = MigrationOperation::seed_rows("system", vec![system_row()], system_key());
    assert_eq!(ctx.apply(&op).await.unwrap(), Applied::Executed);
    assert_eq!(ctx.apply(&op).await.unwrap(), Applied::Skipped);
}

#[tokio::test]
async fn text_values_are_escaped() {
    let mut ctx = common::memory().await;
    run(
        &mut ctx,
        "CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT, enabled BOOLEAN)",
    )
    .await;
    let row = SeedRow::new()
        .set("key", "motd")
        .set("value", "it's up")
        .set("enabled", true);
    ctx.seed_if_absent("settings", &[row], &KeyFilter::new().where_eq("key", "motd"))
        .await
        .unwrap();

    let (value, enabled): (String, i64) =
        sqlx::query_as("SELECT value, CAST(enabled AS INTEGER) FROM settings WHERE key = 'motd'")
            .fetch_one(ctx.connection())
            .await
            .unwrap();
    assert_eq!(value, "it's up");
    assert_eq!(enabled, 1);
}
