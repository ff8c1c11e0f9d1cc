//! Runs the built-in chain against live MySQL and PostgreSQL servers.
//!
//! Skipped unless `TEST_MYSQL_URL` / `TEST_POSTGRES_URL` point at a scratch
//! database. Every test starts by rolling the chain all the way back.

mod common;

use oxide_safe_migrate::migrations;
use oxide_safe_migrate::prelude::*;

use common::run;

async fn connect(var: &str) -> Option<MigrationContext> {
    let Ok(url) = std::env::var(var) else {
        eprintln!("{var} not set, skipping");
        return None;
    };
    let ctx = MigrationContext::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to {var}: {e}"));
    Some(ctx)
}

async fn roles(ctx: &mut MigrationContext, cast: &str) -> Vec<String> {
    let sql = format!("SELECT {cast} FROM admins ORDER BY id");
    sqlx::query_as::<_, (String,)>(&sql)
        .fetch_all(ctx.connection())
        .await
        .unwrap()
        .into_iter()
        .map(|(r,)| r)
        .collect()
}

async fn role_extension_keeps_rows(mut ctx: MigrationContext, role_cast: &str) {
    let executor = migrations::executor().unwrap();
    executor.downgrade(&mut ctx, None).await.unwrap();

    executor
        .upgrade(&mut ctx, Some("backup_schedule_panel"))
        .await
        .unwrap();
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('root', 'sudo')",
    )
    .await;

    executor.upgrade(&mut ctx, None).await.unwrap();
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('bob', 'reseller')",
    )
    .await;
    assert_eq!(roles(&mut ctx, role_cast).await, vec!["sudo", "reseller"]);
    assert_eq!(common::count(&mut ctx, "SELECT COUNT(*) FROM system").await, 1);

    ctx.take_journal();
    executor.upgrade(&mut ctx, None).await.unwrap();
    assert!(ctx.journal().is_empty(), "{:?}", ctx.journal());

    executor.downgrade(&mut ctx, None).await.unwrap();
    ctx.close().await.unwrap();
}

#[tokio::test]
async fn mysql_chain() {
    let Some(ctx) = connect("TEST_MYSQL_URL").await else {
        return;
    };
    assert_eq!(ctx.dialect(), Dialect::OrdinalEnum);
    role_extension_keeps_rows(ctx, "CAST(role AS CHAR)").await;
}

#[tokio::test]
async fn postgres_chain() {
    let Some(ctx) = connect("TEST_POSTGRES_URL").await else {
        return;
    };
    assert_eq!(ctx.dialect(), Dialect::NativeEnum);
    role_extension_keeps_rows(ctx, "role::text").await;
}
