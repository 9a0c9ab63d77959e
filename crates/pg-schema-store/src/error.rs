//! Error types for the persistence and migration library.

use thiserror::Error;

/// Exit code for configuration and input errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for database connection and query errors.
pub const EXIT_DATABASE_ERROR: u8 = 2;
/// Exit code when the migration log disagrees with the configured steps.
pub const EXIT_HISTORY_MISMATCH: u8 = 3;
/// Exit code when a migration step failed to apply.
pub const EXIT_MIGRATION_FAILED: u8 = 4;
/// Exit code for filesystem errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for persistence and migration operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Configuration error (invalid YAML, missing fields, bad overrides, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A non-optional schema field has no matching column in a result set.
    #[error("Field '{field}' (column '{column}') is missing from the query result")]
    SchemaFieldMissing { field: String, column: String },

    /// A returned column could not be converted by its field's decoder.
    #[error("Failed to decode field '{field}': {source}")]
    FieldDecode {
        field: String,
        #[source]
        source: ValueError,
    },

    /// The driver rejected a statement.
    #[error("Query execution failed: {message}")]
    QueryExecution { message: String },

    /// Connection pool error with context.
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A step was appended out of order to a migration list.
    #[error("Migration order {order} is invalid: orders must be positive and greater than {previous}")]
    InvalidMigrationOrder { order: i64, previous: i64 },

    /// The migration log references a step the current list does not define.
    #[error("Migration {order} was applied but is not defined in the migration list")]
    MigrationStepMissing { order: i64 },

    /// An applied step's query text no longer matches the list.
    #[error("Migration {order} was modified after it was applied\n  Applied: {applied}\n  Current: {current}")]
    MigrationImmutability {
        order: i64,
        applied: String,
        current: String,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conversion failure between a [`SqlValue`](crate::core::SqlValue) and a field type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected NULL for a non-nullable field")]
    UnexpectedNull,

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("cannot parse '{value}' as {target}")]
    Parse { value: String, target: &'static str },
}

impl StoreError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        StoreError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a QueryExecution error from a driver message
    pub fn query(message: impl Into<String>) -> Self {
        StoreError::QueryExecution {
            message: message.into(),
        }
    }

    /// The bare driver message for query failures, the display form otherwise.
    ///
    /// This is what ends up in the `message` column of a failed migration attempt.
    pub fn driver_message(&self) -> String {
        match self {
            StoreError::QueryExecution { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            StoreError::Config(_)
            | StoreError::Yaml(_)
            | StoreError::Json(_)
            | StoreError::InvalidMigrationOrder { .. } => EXIT_CONFIG_ERROR,
            StoreError::SchemaFieldMissing { .. }
            | StoreError::FieldDecode { .. }
            | StoreError::QueryExecution { .. }
            | StoreError::Pool { .. } => EXIT_DATABASE_ERROR,
            StoreError::MigrationStepMissing { .. } | StoreError::MigrationImmutability { .. } => {
                EXIT_HISTORY_MISMATCH
            }
            StoreError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Prefer the server's message over the "db error: ..." wrapper.
        let message = match err.as_db_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        StoreError::QueryExecution { message }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
