//! Revision `0001_base_tables`: the panel tables every later revision
//! builds on, and the `adminrole` enum with its original three roles.

use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, EnumType, IndexSchema, SqlType};
use crate::SafeMigration;

/// Role values the panel shipped with.
fn initial_admin_role() -> EnumType {
    EnumType::new("adminrole", ["standard", "sudo", "full_access"])
}

/// Creates the tables later revisions build on.
pub struct BaseTables;

impl SafeMigration for BaseTables {
    const REVISION: &'static str = "0001_base_tables";
    const DESCRIPTION: &'static str = "base tables";

    fn operations() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::create_enum_type(initial_admin_role()),
            MigrationOperation::create_table(
                "admins",
                vec![
                    ColumnSchema::new("id", SqlType::Integer)
                        .primary_key()
                        .auto_increment(),
                    ColumnSchema::new("username", SqlType::Varchar(34)).not_null(),
                    ColumnSchema::new("role", SqlType::Enum(initial_admin_role())).not_null(),
                ],
                vec![],
            ),
            MigrationOperation::create_index(
                IndexSchema::new("ix_admins_username", "admins", ["username"]).unique(),
            ),
            MigrationOperation::create_table(
                "services",
                vec![
                    ColumnSchema::new("id", SqlType::Integer)
                        .primary_key()
                        .auto_increment(),
                    ColumnSchema::new("name", SqlType::Varchar(64)).not_null(),
                ],
                vec![],
            ),
            MigrationOperation::create_table(
                "panel_settings",
                vec![ColumnSchema::new("id", SqlType::Integer)
                    .primary_key()
                    .auto_increment()],
                vec![],
            ),
        ]
    }
}
