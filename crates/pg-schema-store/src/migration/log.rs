//! Migration log table: record type, schema and DDL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{FieldDescriptor, ObjectSchema};
use crate::error::Result;

/// Default name of the migration log table.
pub const DEFAULT_LOG_TABLE: &str = "migration_log";

/// One attempted migration step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationLogRecord {
    pub creation_order: i64,
    pub description: String,
    pub run_timestamp: Option<DateTime<Utc>>,
    pub query_executed: String,
    pub successful: bool,
    pub message: Option<String>,
}

/// Schema of the log table. `runTimestamp` is stored in `run_ts`.
pub fn log_schema() -> Result<ObjectSchema<MigrationLogRecord>> {
    ObjectSchema::<MigrationLogRecord>::builder("migrationLog")
        .field("creationOrder", |r| &r.creation_order, |r| &mut r.creation_order)
        .field("description", |r| &r.description, |r| &mut r.description)
        .descriptor(
            FieldDescriptor::<MigrationLogRecord>::new("runTimestamp", |r| &r.run_timestamp, |r| &mut r.run_timestamp)
                .with_column("run_ts"),
        )
        .field("queryExecuted", |r| &r.query_executed, |r| &mut r.query_executed)
        .field("successful", |r| &r.successful, |r| &mut r.successful)
        .field("message", |r| &r.message, |r| &mut r.message)
        .build()
}

/// Idempotent DDL for a log table called `table`.
pub fn create_log_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {}(creation_order DECIMAL PRIMARY KEY, description TEXT, \
         run_ts TIMESTAMPTZ, query_executed TEXT, successful BOOLEAN, message TEXT)",
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_schema_columns() {
        let schema = log_schema().unwrap();
        assert_eq!(
            schema.columns(),
            vec![
                "creation_order",
                "description",
                "run_ts",
                "query_executed",
                "successful",
                "message"
            ]
        );
    }

    #[test]
    fn test_create_log_table_sql() {
        assert_eq!(
            create_log_table_sql(DEFAULT_LOG_TABLE),
            "CREATE TABLE IF NOT EXISTS migration_log(creation_order DECIMAL PRIMARY KEY, description TEXT, \
             run_ts TIMESTAMPTZ, query_executed TEXT, successful BOOLEAN, message TEXT)"
        );
    }
}
