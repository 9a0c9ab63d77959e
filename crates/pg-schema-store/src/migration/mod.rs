//! Forward-only schema migrations.
//!
//! A [`MigrationList`] is an append-only, order-validated list of steps. The
//! [`MigrationProcessor`] records every attempt in a log table, refuses to run
//! when applied history no longer matches the list, and applies pending steps
//! in order until one fails.

pub mod list;
pub mod log;
pub mod processor;
pub mod result;

pub use list::{migration_list, MigrationList, MigrationStep};
pub use log::{create_log_table_sql, log_schema, MigrationLogRecord, DEFAULT_LOG_TABLE};
pub use processor::{MigrationProcessor, ProcessorOptions};
pub use result::MigrationResult;
