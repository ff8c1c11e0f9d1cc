//! Revision `0d1e2f3g4h5i`: service flow and the reseller role.

use crate::enums::EnumExtension;
use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, SqlType};
use crate::SafeMigration;

/// Adds `services.flow` and the `reseller` admin role.
///
/// Rolling back drops `flow` but leaves `reseller` accepted, since admins
/// may already hold it.
pub struct ServiceFlowColumn;

impl SafeMigration for ServiceFlowColumn {
    const REVISION: &'static str = "0d1e2f3g4h5i";
    const DOWN_REVISION: Option<&'static str> = Some("backup_schedule_panel");
    const DESCRIPTION: &'static str = "add flow column to services and reseller role to admins";

    fn operations() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::add_column(
                "services",
                ColumnSchema::new("flow", SqlType::Varchar(255)),
            ),
            MigrationOperation::extend_enum(
                EnumExtension::new(
                    "admins",
                    "role",
                    "adminrole",
                    ["standard", "reseller", "sudo", "full_access"],
                )
                .backfill("standard"),
            ),
        ]
    }
}
