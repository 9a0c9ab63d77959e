//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_table;
use crate::drivers::postgres::SslMode;
use crate::error::{Result, StoreError};
use crate::migration::MigrationList;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let db = &config.database;
    if db.host.is_empty() {
        return Err(StoreError::Config("database.host is required".into()));
    }
    if db.database.is_empty() {
        return Err(StoreError::Config("database.database is required".into()));
    }
    if db.user.is_empty() {
        return Err(StoreError::Config("database.user is required".into()));
    }
    if db.port == 0 {
        return Err(StoreError::Config("database.port must be non-zero".into()));
    }
    if db.max_connections == 0 {
        return Err(StoreError::Config(
            "database.max_connections must be at least 1".into(),
        ));
    }
    SslMode::parse(&db.ssl_mode)?;

    validate_table(&config.migrations.log_table)
        .map_err(|e| StoreError::Config(format!("migrations.log_table: {}", e)))?;

    MigrationList::from_steps(config.migrations.steps.iter().cloned())?;

    Ok(())
}
