//! Built-in revision chain for the panel database.
//!
//! Each revision is a [`SafeMigration`]; the chain runs in the order
//! returned by [`chain`].

mod base_tables;
mod init_system_table;
mod panel_backup_schedule;
mod service_flow_column;

pub use base_tables::BaseTables;
pub use init_system_table::InitSystemTable;
pub use panel_backup_schedule::PanelBackupSchedule;
pub use service_flow_column::ServiceFlowColumn;

use crate::error::Result;
use crate::executor::{ExecutableMigration, MigrationExecutor};
use crate::SafeMigration;

/// Returns the built-in revisions in forward order.
#[must_use]
pub fn chain() -> Vec<ExecutableMigration> {
    vec![
        BaseTables::to_executable(),
        InitSystemTable::to_executable(),
        PanelBackupSchedule::to_executable(),
        ServiceFlowColumn::to_executable(),
    ]
}

/// Returns an executor over the built-in chain.
pub fn executor() -> Result<MigrationExecutor> {
    MigrationExecutor::new(chain())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_linear() {
        let executor = executor().unwrap();
        assert_eq!(
            executor.revisions(),
            vec![
                "0001_base_tables",
                "3cf36a5fde73",
                "backup_schedule_panel",
                "0d1e2f3g4h5i",
            ]
        );
    }

    #[test]
    fn test_every_revision_can_be_rolled_back() {
        assert!(chain().iter().all(ExecutableMigration::is_reversible));
    }
}
