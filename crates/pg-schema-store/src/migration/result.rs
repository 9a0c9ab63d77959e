//! Outcome of a migrate run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of [`MigrationProcessor::migrate`](super::MigrationProcessor::migrate).
///
/// A failing step is reported here rather than as an error: the steps before it
/// stay applied and logged, and the next run resumes after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationResult {
    Success {
        #[serde(rename = "lastSuccessfulOrder")]
        last_successful_order: i64,
    },
    Failure {
        #[serde(rename = "lastSuccessfulOrder")]
        last_successful_order: i64,
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl MigrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MigrationResult::Success { .. })
    }

    /// Highest order applied successfully, 0 when nothing has run.
    pub fn last_successful_order(&self) -> i64 {
        match self {
            MigrationResult::Success { last_successful_order }
            | MigrationResult::Failure {
                last_successful_order, ..
            } => *last_successful_order,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            MigrationResult::Success { .. } => None,
            MigrationResult::Failure { error_message, .. } => Some(error_message),
        }
    }
}

impl fmt::Display for MigrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationResult::Success { last_successful_order } => {
                write!(f, "success (last successful order: {})", last_successful_order)
            }
            MigrationResult::Failure {
                last_successful_order,
                error_message,
            } => write!(
                f,
                "failure (last successful order: {}): {}",
                last_successful_order, error_message
            ),
        }
    }
}
