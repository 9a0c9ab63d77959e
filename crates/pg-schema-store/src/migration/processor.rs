//! Reconciles a [`MigrationList`] against the migration log and applies
//! whatever has not run yet.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::identifier::validate_table;
use crate::core::{ObjectSchema, Session};
use crate::error::{Result, StoreError};
use crate::migration::list::{MigrationList, MigrationStep};
use crate::migration::log::{create_log_table_sql, log_schema, MigrationLogRecord, DEFAULT_LOG_TABLE};
use crate::migration::result::MigrationResult;
use crate::query::{multi_insert, select, Overrides};

/// Processor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorOptions {
    /// Name of the migration log table.
    #[serde(default = "default_log_table")]
    pub log_table: String,

    /// Tolerate applied steps whose query text has since changed (warn only).
    #[serde(default)]
    pub allow_content_changes: bool,
}

fn default_log_table() -> String {
    DEFAULT_LOG_TABLE.to_string()
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            log_table: default_log_table(),
            allow_content_changes: false,
        }
    }
}

/// Applies a migration list, forward only.
///
/// The processor takes no locks; callers must not run `migrate` concurrently
/// against the same database.
pub struct MigrationProcessor {
    migrations: MigrationList,
    options: ProcessorOptions,
    log_schema: ObjectSchema<MigrationLogRecord>,
}

impl MigrationProcessor {
    pub fn new(migrations: MigrationList) -> Result<Self> {
        Self::with_options(migrations, ProcessorOptions::default())
    }

    pub fn with_options(migrations: MigrationList, options: ProcessorOptions) -> Result<Self> {
        validate_table(&options.log_table)?;
        Ok(Self {
            migrations,
            options,
            log_schema: log_schema()?,
        })
    }

    pub fn migrations(&self) -> &MigrationList {
        &self.migrations
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Create the log table if it does not exist yet.
    pub async fn initialize<S: Session + ?Sized>(&self, session: &S) -> Result<()> {
        debug!("Ensuring migration log table {}", self.options.log_table);
        session
            .batch_execute(&create_log_table_sql(&self.options.log_table))
            .await
    }

    /// All log rows, ordered by creation order.
    pub async fn history<S: Session + ?Sized>(&self, session: &S) -> Result<Vec<MigrationLogRecord>> {
        select(
            session,
            &self.log_schema,
            &format!("{} ORDER BY creation_order", self.options.log_table),
            &[],
            &Overrides::none(),
        )
        .await
    }

    /// Verify applied history, prune failed attempts, then apply pending steps.
    ///
    /// History violations are returned as errors before any step runs. A step
    /// that fails to execute is logged and reported as
    /// [`MigrationResult::Failure`]; steps after it are not attempted.
    pub async fn migrate<S: Session + ?Sized>(&self, session: &S) -> Result<MigrationResult> {
        let history = self.history(session).await?;
        let mut last_successful = self.verify_history(&history)?;

        let pruned = session
            .query(
                &format!("DELETE FROM {} WHERE successful = false", self.options.log_table),
                &[],
            )
            .await?
            .rows_affected;
        if pruned > 0 {
            info!("Removed {} failed migration attempt(s) from {}", pruned, self.options.log_table);
        }

        let pending: Vec<&MigrationStep> = self.migrations.pending_after(last_successful).collect();
        if pending.is_empty() {
            info!("Schema is up to date (last successful order: {})", last_successful);
        }

        for step in pending {
            info!("Applying migration {}: {}", step.order, step.description);
            match session.batch_execute(&step.query).await {
                Ok(()) => {
                    self.record(session, step, None).await?;
                    last_successful = step.order;
                }
                Err(e) => {
                    let message = e.driver_message();
                    error!("Migration {} failed: {}", step.order, message);
                    self.record(session, step, Some(message.clone())).await?;
                    return Ok(MigrationResult::Failure {
                        last_successful_order: last_successful,
                        error_message: message,
                    });
                }
            }
        }

        Ok(MigrationResult::Success {
            last_successful_order: last_successful,
        })
    }

    /// Check every successful log row against the list. Returns the highest
    /// applied order.
    fn verify_history(&self, history: &[MigrationLogRecord]) -> Result<i64> {
        let mut last_successful = 0;
        for record in history.iter().filter(|r| r.successful) {
            let step = self
                .migrations
                .find(record.creation_order)
                .ok_or(StoreError::MigrationStepMissing {
                    order: record.creation_order,
                })?;

            if step.query != record.query_executed {
                if !self.options.allow_content_changes {
                    return Err(StoreError::MigrationImmutability {
                        order: record.creation_order,
                        applied: record.query_executed.clone(),
                        current: step.query.clone(),
                    });
                }
                warn!(
                    "Migration {} changed after it was applied; continuing because content changes are allowed",
                    record.creation_order
                );
            }

            last_successful = last_successful.max(record.creation_order);
        }
        Ok(last_successful)
    }

    async fn record<S: Session + ?Sized>(&self, session: &S, step: &MigrationStep, failure: Option<String>) -> Result<()> {
        let record = MigrationLogRecord {
            creation_order: step.order,
            description: step.description.clone(),
            run_timestamp: None,
            query_executed: step.query.clone(),
            successful: failure.is_none(),
            message: failure,
        };
        multi_insert(
            session,
            &self.log_schema,
            &self.options.log_table,
            &[record],
            &Overrides::none().now("runTimestamp"),
            None,
        )
        .await?;
        Ok(())
    }
}
