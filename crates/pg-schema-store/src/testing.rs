//! In-memory session used by unit tests.
//!
//! [`FakeSession`] records every statement it receives and answers from a
//! queue of canned results. It also understands the handful of statements the
//! migration processor issues against the migration log, so processor and
//! lifecycle tests can run whole migrate cycles without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::{QueryResult, Session, SessionProvider, SqlValue};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct FakeLogRow {
    pub order: i64,
    pub description: String,
    pub run_ts: DateTime<Utc>,
    pub query: String,
    pub successful: bool,
    pub message: Option<String>,
}

impl FakeLogRow {
    fn to_row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Decimal(Decimal::from(self.order)),
            SqlValue::Text(self.description.clone()),
            SqlValue::Timestamp(self.run_ts),
            SqlValue::Text(self.query.clone()),
            SqlValue::Bool(self.successful),
            self.message.clone().map(SqlValue::Text).unwrap_or(SqlValue::Null),
        ]
    }
}

const LOG_COLUMNS: [&str; 6] = [
    "creation_order",
    "description",
    "run_ts",
    "query_executed",
    "successful",
    "message",
];

#[derive(Debug, Default)]
struct FakeState {
    results: VecDeque<QueryResult>,
    executed: Vec<(String, Vec<SqlValue>)>,
    batches: Vec<String>,
    query_failures: Vec<(String, String)>,
    batch_failures: Vec<(String, String)>,
    log: Option<Vec<FakeLogRow>>,
    closes: usize,
}

impl FakeState {
    fn failure(rules: &[(String, String)], sql: &str) -> Option<String> {
        rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, message)| message.clone())
    }

    fn log_mut(&mut self) -> Result<&mut Vec<FakeLogRow>> {
        self.log
            .as_mut()
            .ok_or_else(|| StoreError::query("relation \"migration_log\" does not exist"))
    }

    fn select_log(&mut self) -> Result<QueryResult> {
        let log = self.log_mut()?;
        let mut rows = log.clone();
        rows.sort_by_key(|r| r.order);
        Ok(QueryResult {
            fields: LOG_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(FakeLogRow::to_row).collect(),
            rows_affected: 0,
        })
    }

    fn delete_failed(&mut self) -> Result<QueryResult> {
        let log = self.log_mut()?;
        let before = log.len();
        log.retain(|r| r.successful);
        Ok(QueryResult {
            rows_affected: (before - log.len()) as u64,
            ..Default::default()
        })
    }

    fn insert_log(&mut self, params: &[SqlValue]) -> Result<QueryResult> {
        let log = self.log_mut()?;
        let mut inserted = 0;
        for chunk in params.chunks(5) {
            let order = match &chunk[0] {
                SqlValue::Integer(n) => *n,
                other => return Err(StoreError::query(format!("bad creation_order {other:?}"))),
            };
            if log.iter().any(|r| r.order == order) {
                return Err(StoreError::query(
                    "duplicate key value violates unique constraint \"migration_log_pkey\"",
                ));
            }
            let text = |v: &SqlValue| match v {
                SqlValue::Text(s) => Some(s.clone()),
                _ => None,
            };
            log.push(FakeLogRow {
                order,
                description: text(&chunk[1]).unwrap_or_default(),
                run_ts: Utc::now(),
                query: text(&chunk[2]).unwrap_or_default(),
                successful: chunk[3] == SqlValue::Bool(true),
                message: text(&chunk[4]),
            });
            inserted += 1;
        }
        Ok(QueryResult {
            rows_affected: inserted,
            ..Default::default()
        })
    }
}

/// Scripted in-memory session. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next statement that is not a migration log statement.
    pub fn push_result(&self, result: QueryResult) {
        self.state.lock().unwrap().results.push_back(result);
    }

    /// Fail any parameterised statement containing `pattern`.
    pub fn fail_query_on(&self, pattern: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .query_failures
            .push((pattern.to_string(), message.to_string()));
    }

    /// Fail any script containing `pattern`.
    pub fn fail_batch_on(&self, pattern: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .batch_failures
            .push((pattern.to_string(), message.to_string()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.query_failures.clear();
        state.batch_failures.clear();
    }

    /// Pretend the log table already holds `rows`.
    pub fn seed_log(&self, rows: Vec<FakeLogRow>) {
        self.state.lock().unwrap().log = Some(rows);
    }

    pub fn log_rows(&self) -> Vec<FakeLogRow> {
        self.state.lock().unwrap().log.clone().unwrap_or_default()
    }

    pub fn executed(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn batches(&self) -> Vec<String> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

/// Build a successful or failed log row for seeding.
pub fn log_row(order: i64, query: &str, successful: bool) -> FakeLogRow {
    FakeLogRow {
        order,
        description: format!("step {order}"),
        run_ts: Utc::now(),
        query: query.to_string(),
        successful,
        message: (!successful).then(|| "previous failure".to_string()),
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let mut state = self.state.lock().unwrap();
        state.executed.push((sql.to_string(), params.to_vec()));

        if let Some(message) = FakeState::failure(&state.query_failures, sql) {
            return Err(StoreError::query(message));
        }

        if sql.starts_with("SELECT creation_order") {
            state.select_log()
        } else if sql.starts_with("DELETE FROM") && sql.contains("successful") {
            state.delete_failed()
        } else if sql.starts_with("INSERT INTO") && sql.contains("creation_order") {
            state.insert_log(params)
        } else {
            Ok(state.results.pop_front().unwrap_or_default())
        }
    }

    async fn batch_execute(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.batches.push(sql.to_string());

        if let Some(message) = FakeState::failure(&state.batch_failures, sql) {
            return Err(StoreError::query(message));
        }

        if sql.starts_with("CREATE TABLE IF NOT EXISTS") && sql.contains("creation_order") && state.log.is_none() {
            state.log = Some(Vec::new());
        }
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.state.lock().unwrap().closes += 1;
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

/// Provider handing out clones of one [`FakeSession`].
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub session: FakeSession,
    acquire_error: Option<String>,
    acquires: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    /// A provider whose every acquire fails.
    pub fn unavailable(message: &str) -> Self {
        Self {
            acquire_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn acquire_count(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        match &self.acquire_error {
            Some(message) => Err(StoreError::pool(message, "acquiring session")),
            None => Ok(Box::new(self.session.clone())),
        }
    }
}
