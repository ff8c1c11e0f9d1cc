//! Revision `backup_schedule_panel`.

use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, DefaultValue, SqlType};
use crate::SafeMigration;

/// Adds scheduled backup settings to the panel.
pub struct PanelBackupSchedule;

impl SafeMigration for PanelBackupSchedule {
    const REVISION: &'static str = "backup_schedule_panel";
    const DOWN_REVISION: Option<&'static str> = Some("3cf36a5fde73");
    const DESCRIPTION: &'static str = "add backup schedule fields to panel_settings";

    fn operations() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::add_column(
                "panel_settings",
                ColumnSchema::new("backup_enabled", SqlType::Boolean)
                    .not_null()
                    .default(DefaultValue::Bool(false)),
            ),
            MigrationOperation::add_column(
                "panel_settings",
                ColumnSchema::new("backup_cron_schedule", SqlType::Varchar(255)),
            ),
        ]
    }
}
