//! Integration tests for widening enumerated columns.

mod common;

use sqlx::Executor;

use oxide_safe_migrate::prelude::*;

use common::{count, run, texts};

fn reseller() -> EnumExtension {
    EnumExtension::new(
        "admins",
        "role",
        "adminrole",
        ["standard", "reseller", "sudo", "full_access"],
    )
    .backfill("standard")
}

async fn admins(role_column: &str) -> MigrationContext {
    let mut ctx = common::memory().await;
    run(
        &mut ctx,
        &format!(
            "CREATE TABLE admins (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 username VARCHAR(34) NOT NULL,
                 {role_column}
             );
             CREATE UNIQUE INDEX ix_admins_username ON admins (username);
             CREATE INDEX ix_admins_role ON admins (role);"
        ),
    )
    .await;
    ctx
}

#[tokio::test]
async fn existing_rows_keep_their_values() {
    let mut ctx = admins(
        "role TEXT NOT NULL CHECK (role IN ('standard', 'sudo', 'full_access'))",
    )
    .await;
    for i in 0..25 {
        let role = ["standard", "sudo", "full_access"][i % 3];
        run(
            &mut ctx,
            &format!("INSERT INTO admins (username, role) VALUES ('user{i}', '{role}')"),
        )
        .await;
    }
    let before = texts(&mut ctx, "admins", "role").await;

    assert_eq!(ctx.extend_enum(&reseller()).await.unwrap(), Applied::Executed);

    assert_eq!(texts(&mut ctx, "admins", "role").await, before);
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('new', 'reseller')",
    )
    .await;
    assert_eq!(count(&mut ctx, "SELECT COUNT(*) FROM admins").await, 26);
}

#[tokio::test]
async fn null_roles_are_backfilled_and_column_tightened() {
    let mut ctx = admins("role TEXT CHECK (role IN ('standard', 'sudo'))").await;
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('a', NULL), ('b', 'sudo'), ('c', NULL)",
    )
    .await;

    ctx.extend_enum(&reseller()).await.unwrap();

    assert_eq!(
        texts(&mut ctx, "admins", "role").await,
        vec!["standard", "sudo", "standard"]
    );
    let columns = ctx.introspector().list_columns("admins").await.unwrap();
    let role = columns.iter().find(|c| c.name == "role").unwrap();
    assert!(!role.nullable);
}

#[tokio::test]
async fn unconstrained_column_gains_check() {
    let mut ctx = admins("role TEXT NOT NULL").await;
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('root', 'sudo')",
    )
    .await;

    ctx.extend_enum(&reseller()).await.unwrap();

    let values = ctx
        .introspector()
        .enum_values("admins", "role", "adminrole")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(values, reseller().target());
}

#[tokio::test]
async fn indexes_survive_rebuild() {
    let mut ctx = admins(
        "role TEXT NOT NULL CHECK (role IN ('standard', 'sudo', 'full_access'))",
    )
    .await;
    ctx.extend_enum(&reseller()).await.unwrap();

    let indexes = ctx.introspector().list_indexes("admins").await.unwrap();
    let names: Vec<&str> = indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["ix_admins_role", "ix_admins_username"]);
    assert!(indexes[1].unique);

    let tables = ctx.introspector().list_tables().await.unwrap();
    assert_eq!(tables, vec!["admins"]);

    let descriptor = ctx.introspector().describe_table("admins").await.unwrap().unwrap();
    assert!(descriptor.autoincrement);
    assert_eq!(descriptor.primary_key(), vec!["id"]);
}

async fn rejected(ctx: &mut MigrationContext, sql: &str) -> bool {
    ctx.connection().execute(sql).await.is_err()
}

#[tokio::test]
async fn other_constraints_survive_rebuild() {
    let mut ctx = common::memory().await;
    run(
        &mut ctx,
        "CREATE TABLE admins (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             username TEXT NOT NULL COLLATE NOCASE CHECK (length(username) > 0),
             upper_name TEXT GENERATED ALWAYS AS (upper(username)) VIRTUAL,
             role TEXT CHECK (role IN ('standard', 'sudo')),
             UNIQUE (username)
         );
         INSERT INTO admins (username, role) VALUES ('root', 'sudo');",
    )
    .await;

    assert_eq!(ctx.extend_enum(&reseller()).await.unwrap(), Applied::Executed);

    assert!(rejected(&mut ctx, "INSERT INTO admins (username, role) VALUES ('', 'standard')").await);
    assert!(rejected(&mut ctx, "INSERT INTO admins (username, role) VALUES ('Root', 'standard')").await);
    assert!(rejected(&mut ctx, "INSERT INTO admins (username, role) VALUES ('bob', 'owner')").await);
    run(
        &mut ctx,
        "INSERT INTO admins (username, role) VALUES ('bob', 'reseller')",
    )
    .await;

    assert_eq!(
        texts(&mut ctx, "admins", "upper_name").await,
        vec!["ROOT", "BOB"]
    );
    let columns = ctx.introspector().list_columns("admins").await.unwrap();
    let upper_name = columns.iter().find(|c| c.name == "upper_name").unwrap();
    assert!(upper_name.generated);

    assert_eq!(ctx.extend_enum(&reseller()).await.unwrap(), Applied::Skipped);
}

#[tokio::test]
async fn already_widened_is_skipped() {
    let mut ctx = admins(
        "role TEXT NOT NULL CHECK (role IN ('standard', 'reseller', 'sudo', 'full_access'))",
    )
    .await;
    assert_eq!(ctx.extend_enum(&reseller()).await.unwrap(), Applied::Skipped);
    assert!(ctx.journal().is_empty());
}

#[tokio::test]
async fn dry_run_leaves_table_untouched() {
    let ctx = admins("role TEXT NOT NULL CHECK (role IN ('standard', 'sudo'))").await;
    let mut ctx = ctx.dry_run(true);

    assert_eq!(ctx.extend_enum(&reseller()).await.unwrap(), Applied::Executed);
    let journal = ctx.take_journal();
    assert!(journal[0].starts_with("CREATE TABLE \"_shadow_admins\""));
    assert!(journal[1].starts_with("INSERT INTO \"_shadow_admins\""));

    let values = ctx
        .introspector()
        .enum_values("admins", "role", "adminrole")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(values.values, vec!["standard", "sudo"]);
}

#[test]
fn ordinal_dialect_restates_the_full_set() {
    let column = ColumnDescriptor {
        name: "role".to_string(),
        type_name: "enum('standard','sudo','full_access')".to_string(),
        nullable: false,
        default: None,
        primary_key: 0,
        generated: false,
    };
    let current = EnumType::new("adminrole", ["standard", "sudo", "full_access"]);
    let widened = current.extended_with(&reseller().values);

    let sql = Dialect::OrdinalEnum
        .strategy()
        .redefine_enum_column_sql("admins", &column, &widened, false)
        .unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE `admins` MODIFY COLUMN `role` \
         ENUM('standard', 'reseller', 'sudo', 'full_access') NOT NULL"
    );
}

#[test]
fn native_dialect_adds_values_one_at_a_time() {
    let sql = Dialect::NativeEnum
        .strategy()
        .add_enum_value_sql("adminrole", "reseller")
        .unwrap();
    assert_eq!(
        sql,
        "ALTER TYPE \"adminrole\" ADD VALUE IF NOT EXISTS 'reseller'"
    );
}
