use crate::config::Config;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    /// Finish a write transaction according to the benchmarking convention:
    /// roll back when the flag is set (so load-test runs stay idempotent on
    /// data volume while still paying the full write cost), commit otherwise.
    pub async fn finish_write(&self, txn: DatabaseTransaction) -> Result<(), DbErr> {
        if self.config.benchmarking_enabled() {
            txn.rollback().await
        } else {
            txn.commit().await
        }
    }
}
