//! Driver/session contract consumed by the engine.
//!
//! The engine talks to the database exclusively through [`Session`]. A session
//! executes one statement at a time and returns results in column-array form:
//! the column names once, then each row as a vector of [`SqlValue`]s in the same
//! order.
//!
//! Sessions are handed out by a [`SessionProvider`] and must be released with
//! [`Session::close`] on every exit path.

use async_trait::async_trait;

use crate::core::value::SqlValue;
use crate::error::Result;

/// Result of a statement in column-array form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Returned column names, in result order.
    pub fields: Vec<String>,

    /// Returned rows; each row is aligned with `fields`.
    pub rows: Vec<Vec<SqlValue>>,

    /// Rows inserted/updated/deleted, as reported by the server.
    pub rows_affected: u64,
}

/// A database session.
///
/// Implementations must be `Send + Sync`; the engine never issues two
/// statements on one session concurrently.
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute a parameterised statement with `$n` positional parameters.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult>;

    /// Execute a parameterless script that may contain several statements.
    async fn batch_execute(&self, sql: &str) -> Result<()>;

    /// Release the session.
    async fn close(self: Box<Self>);

    /// Backend name for logging/debugging.
    fn backend_type(&self) -> &'static str;
}

/// Source of database sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Acquire a session. The caller owns it until [`Session::close`].
    async fn acquire(&self) -> Result<Box<dyn Session>>;
}
