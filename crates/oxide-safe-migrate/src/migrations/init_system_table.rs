//! Revision `3cf36a5fde73`: the `system` traffic counter table, seeded with
//! its single row.

use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, IndexSchema, SqlType};
use crate::seed::{KeyFilter, SeedRow};
use crate::SafeMigration;

/// Creates the `system` traffic counters and their singleton row.
pub struct InitSystemTable;

impl SafeMigration for InitSystemTable {
    const REVISION: &'static str = "3cf36a5fde73";
    const DOWN_REVISION: Option<&'static str> = Some("0001_base_tables");
    const DESCRIPTION: &'static str = "init system table";

    fn operations() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::create_table(
                "system",
                vec![
                    ColumnSchema::new("id", SqlType::Integer)
                        .primary_key()
                        .not_null(),
                    ColumnSchema::new("uplink", SqlType::BigInt),
                    ColumnSchema::new("downlink", SqlType::BigInt),
                ],
                vec![],
            ),
            MigrationOperation::create_index(
                IndexSchema::new("ix_system_id", "system", ["id"]).unique(),
            ),
            MigrationOperation::seed_rows(
                "system",
                vec![SeedRow::new()
                    .set("id", 1)
                    .set("uplink", 0)
                    .set("downlink", 0)],
                KeyFilter::new().where_eq("id", 1),
            ),
        ]
    }
}
