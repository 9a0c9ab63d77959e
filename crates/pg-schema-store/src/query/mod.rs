//! Query/persistence engine.
//!
//! Typed reads ([`typed_query`], [`select`]) decode column-array results into
//! records through an [`ObjectSchema`]. Typed writes ([`multi_insert`],
//! [`multi_upsert`]) encode a batch of records into a single multi-row
//! `INSERT`, optionally with an `ON CONFLICT` clause.

pub mod directives;
pub mod statement;

use tracing::{debug, error};

use crate::core::{params_to_json, ObjectSchema, Session, SqlValue};
use crate::error::{Result, StoreError};

pub use directives::{ConflictPolicy, FieldOverride, Overrides, UpsertDirective};
pub use statement::{build_multi_insert, build_select, resolve_batch_conflicts, Statement};

/// Run `sql` and decode every returned row into `R`.
///
/// Returned columns are matched to schema fields by name (snake_case column to
/// camelCase field, or the field's explicit column). A non-optional field
/// without a matching column fails with [`StoreError::SchemaFieldMissing`];
/// an optional one is left at its default.
pub async fn typed_query<R, S>(session: &S, schema: &ObjectSchema<R>, sql: &str, params: &[SqlValue]) -> Result<Vec<R>>
where
    R: Default,
    S: Session + ?Sized,
{
    debug!("typed_query [{}]: {}", schema.name(), sql);
    let result = session.query(sql, params).await?;
    let decoder = schema.row_decoder(&result.fields)?;
    result.rows.into_iter().map(|row| decoder.decode(row)).collect()
}

/// `SELECT` the schema's non-omitted columns from `table_and_conditions`.
pub async fn select<R, S>(
    session: &S,
    schema: &ObjectSchema<R>,
    table_and_conditions: &str,
    params: &[SqlValue],
    overrides: &Overrides,
) -> Result<Vec<R>>
where
    R: Default,
    S: Session + ?Sized,
{
    let sql = build_select(schema, table_and_conditions, overrides)?;
    debug!("select [{}]: {}", schema.name(), sql);
    let result = session.query(&sql, params).await?;
    let decoder = schema.row_decoder_excluding(&result.fields, |field| overrides.is_omitted(field))?;
    result.rows.into_iter().map(|row| decoder.decode(row)).collect()
}

/// Insert `records` with one statement. Returns the affected row count.
///
/// An empty batch executes nothing and returns 0.
pub async fn multi_insert<R, S>(
    session: &S,
    schema: &ObjectSchema<R>,
    table: &str,
    records: &[R],
    overrides: &Overrides,
    upsert: Option<&UpsertDirective>,
) -> Result<u64>
where
    S: Session + ?Sized,
{
    let Some(stmt) = build_multi_insert(schema, table, records, overrides, upsert)? else {
        debug!("multi_insert into {}: empty batch, nothing to do", table);
        return Ok(0);
    };

    debug!(
        "multi_insert into {}: {} records, {} params",
        table,
        records.len(),
        stmt.params.len()
    );

    match session.query(&stmt.sql, &stmt.params).await {
        Ok(result) => Ok(result.rows_affected),
        Err(e) => {
            error!(
                "Insert into {} ({}) failed: {}\n  statement: {}\n  params: {}",
                table,
                session.backend_type(),
                e,
                stmt.sql,
                params_to_json(&stmt.params)
            );
            Err(StoreError::query(e.driver_message()))
        }
    }
}

/// [`multi_insert`] with a mandatory conflict key.
///
/// An empty conflict key is rejected with [`StoreError::Config`] instead of
/// silently producing a plain `INSERT` without an `ON CONFLICT` clause; call
/// [`multi_insert`] with no directive for that.
pub async fn multi_upsert<R, S>(
    session: &S,
    schema: &ObjectSchema<R>,
    table: &str,
    records: &[R],
    upsert: &UpsertDirective,
    overrides: &Overrides,
) -> Result<u64>
where
    S: Session + ?Sized,
{
    if upsert.conflict_key.is_empty() {
        return Err(StoreError::Config(format!(
            "Upsert into {} requires a non-empty conflict key",
            table
        )));
    }
    multi_insert(session, schema, table, records, overrides, Some(upsert)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QueryResult;
    use crate::testing::FakeSession;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        id: i64,
        display_name: String,
        nickname: Option<String>,
        balance: i128,
        rate: Option<Decimal>,
    }

    fn schema() -> ObjectSchema<Account> {
        ObjectSchema::<Account>::builder("account")
            .field("id", |a| &a.id, |a| &mut a.id)
            .field("displayName", |a| &a.display_name, |a| &mut a.display_name)
            .descriptor(
                crate::core::FieldDescriptor::<Account>::new("nickname", |a| &a.nickname, |a| &mut a.nickname)
                    .optional(),
            )
            .field("balance", |a| &a.balance, |a| &mut a.balance)
            .field("rate", |a| &a.rate, |a| &mut a.rate)
            .build()
            .unwrap()
    }

    fn account_result(rows: Vec<Vec<SqlValue>>) -> QueryResult {
        QueryResult {
            fields: vec![
                "id".into(),
                "display_name".into(),
                "nickname".into(),
                "balance".into(),
                "rate".into(),
            ],
            rows,
            rows_affected: 0,
        }
    }

    #[tokio::test]
    async fn test_typed_query_decodes_rows() {
        let session = FakeSession::new();
        session.push_result(account_result(vec![vec![
            SqlValue::Integer(1),
            SqlValue::Text("Alice".into()),
            SqlValue::Null,
            SqlValue::Decimal(Decimal::from_str("12345678901234567890").unwrap()),
            SqlValue::Decimal(Decimal::from_str("0.25").unwrap()),
        ]]));

        let rows = typed_query(&session, &schema(), "SELECT * FROM accounts", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "Alice");
        assert_eq!(rows[0].balance, 12345678901234567890_i128);
        assert_eq!(rows[0].rate, Some(Decimal::from_str("0.25").unwrap()));
    }

    #[tokio::test]
    async fn test_typed_query_missing_required_column() {
        let session = FakeSession::new();
        session.push_result(QueryResult {
            fields: vec!["id".into(), "balance".into(), "rate".into()],
            rows: vec![],
            rows_affected: 0,
        });

        let err = typed_query(&session, &schema(), "SELECT id, balance, rate FROM accounts", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaFieldMissing { ref field, .. } if field == "displayName"));
    }

    #[tokio::test]
    async fn test_typed_query_missing_optional_column_left_default() {
        let session = FakeSession::new();
        session.push_result(QueryResult {
            fields: vec!["id".into(), "display_name".into(), "balance".into(), "rate".into()],
            rows: vec![vec![
                SqlValue::Integer(7),
                SqlValue::Text("Bob".into()),
                SqlValue::Integer(3),
                SqlValue::Null,
            ]],
            rows_affected: 0,
        });

        let rows = typed_query(&session, &schema(), "SELECT id, display_name, balance, rate FROM accounts", &[])
            .await
            .unwrap();
        assert_eq!(rows[0].nickname, None);
        assert_eq!(rows[0].balance, 3);
    }

    #[tokio::test]
    async fn test_select_builds_statement_and_skips_omitted() {
        let session = FakeSession::new();
        session.push_result(QueryResult {
            fields: vec!["id".into(), "display_name".into(), "balance".into()],
            rows: vec![vec![SqlValue::Integer(1), SqlValue::Text("Alice".into()), SqlValue::Integer(10)]],
            rows_affected: 0,
        });

        let overrides = Overrides::none().omit("nickname").omit("rate");
        let rows = select(
            &session,
            &schema(),
            "accounts WHERE id = $1",
            &[SqlValue::Integer(1)],
            &overrides,
        )
        .await
        .unwrap();

        assert_eq!(rows[0].rate, None);
        let executed = session.executed();
        assert_eq!(executed[0].0, "SELECT id, display_name, balance FROM accounts WHERE id = $1");
        assert_eq!(executed[0].1, vec![SqlValue::Integer(1)]);
    }

    #[tokio::test]
    async fn test_multi_insert_empty_batch_executes_nothing() {
        let session = FakeSession::new();
        let affected = multi_insert(&session, &schema(), "accounts", &[], &Overrides::none(), None)
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert!(session.executed().is_empty());
    }

    #[tokio::test]
    async fn test_multi_upsert_sends_resolved_batch() {
        let session = FakeSession::new();
        session.push_result(QueryResult {
            rows_affected: 2,
            ..Default::default()
        });

        let records = vec![
            Account {
                id: 1,
                display_name: "One".into(),
                ..Default::default()
            },
            Account {
                id: 1,
                display_name: "Uno".into(),
                ..Default::default()
            },
            Account {
                id: 2,
                display_name: "Two".into(),
                ..Default::default()
            },
        ];
        let overrides = Overrides::none().omit("nickname").omit("rate").omit("balance");
        let affected = multi_upsert(
            &session,
            &schema(),
            "accounts",
            &records,
            &UpsertDirective::replace(["id"]),
            &overrides,
        )
        .await
        .unwrap();

        assert_eq!(affected, 2);
        let executed = session.executed();
        assert_eq!(
            executed[0].0,
            "INSERT INTO accounts AS _src(id, display_name) VALUES ($1, $2), ($3, $4) \
             ON CONFLICT(id) DO UPDATE SET display_name = EXCLUDED.display_name"
        );
        assert_eq!(
            executed[0].1,
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("Uno".into()),
                SqlValue::Integer(2),
                SqlValue::Text("Two".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_upsert_requires_conflict_key() {
        let session = FakeSession::new();
        let directive = UpsertDirective::new(Vec::<String>::new(), ConflictPolicy::Replace);
        let err = multi_upsert(
            &session,
            &schema(),
            "accounts",
            &[Account::default()],
            &directive,
            &Overrides::none(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
        assert!(session.executed().is_empty());
    }

    #[tokio::test]
    async fn test_multi_insert_failure_carries_driver_message() {
        let session = FakeSession::new();
        session.fail_query_on("INSERT INTO accounts", "duplicate key value violates unique constraint");

        let err = multi_insert(
            &session,
            &schema(),
            "accounts",
            &[Account::default()],
            &Overrides::none(),
            None,
        )
        .await
        .unwrap_err();
        match err {
            StoreError::QueryExecution { message } => {
                assert_eq!(message, "duplicate key value violates unique constraint")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
