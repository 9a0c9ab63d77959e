//! SQL statement builders.
//!
//! Builders are pure: they turn a schema, records and directives into SQL text
//! plus a positional parameter vector, without touching a session. The engine
//! functions in [`crate::query`] execute what these produce.

use std::collections::HashMap;

use crate::core::identifier::validate_table;
use crate::core::{FieldKind, ObjectSchema, SqlValue};
use crate::error::{Result, StoreError};
use crate::query::directives::{ConflictPolicy, FieldOverride, Overrides, UpsertDirective};

/// Alias under which the target table is addressed in upsert expressions.
pub const SOURCE_ALIAS: &str = "_src";

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Param,
    Now,
}

#[derive(Debug)]
struct PlannedColumn<'a> {
    field_idx: usize,
    field: &'a str,
    column: &'a str,
    slot: Slot,
}

/// Resolve overrides against the schema into the statement's column list.
fn plan_columns<'a, R>(schema: &'a ObjectSchema<R>, overrides: &Overrides) -> Result<Vec<PlannedColumn<'a>>> {
    for (name, directive) in overrides.iter() {
        let field = schema.field(name).ok_or_else(|| {
            StoreError::Config(format!(
                "Override references unknown field '{}' in schema '{}'",
                name,
                schema.name()
            ))
        })?;
        if directive == FieldOverride::Now && field.kind() != FieldKind::Date {
            return Err(StoreError::Config(format!(
                "NOW override is only valid for date fields; '{}' is {}",
                name,
                field.kind()
            )));
        }
    }

    let planned: Vec<PlannedColumn<'a>> = schema
        .fields()
        .iter()
        .enumerate()
        .filter_map(|(field_idx, field)| {
            let slot = match overrides.get(field.name()) {
                Some(FieldOverride::Omit) => return None,
                Some(FieldOverride::Now) => Slot::Now,
                None => Slot::Param,
            };
            Some(PlannedColumn {
                field_idx,
                field: field.name(),
                column: field.column(),
                slot,
            })
        })
        .collect();

    if planned.is_empty() {
        return Err(StoreError::Config(format!(
            "Every field of schema '{}' is omitted",
            schema.name()
        )));
    }

    Ok(planned)
}

/// Build `SELECT <non-omitted columns> FROM <table_and_conditions>`.
///
/// `table_and_conditions` is raw SQL supplied by the caller (table plus any
/// joins, filters and ordering) and is appended verbatim.
pub fn build_select<R>(schema: &ObjectSchema<R>, table_and_conditions: &str, overrides: &Overrides) -> Result<String> {
    let columns: Vec<&str> = plan_columns(schema, overrides)?
        .iter()
        .map(|c| c.column)
        .collect();

    Ok(format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        table_and_conditions.trim()
    ))
}

/// Build a single multi-row `INSERT`, optionally with an `ON CONFLICT` clause.
///
/// Returns `Ok(None)` when `records` is empty. Parameters are numbered
/// consecutively across the statement; NOW-overridden columns are emitted as
/// `now()` and take no parameter slot. When an upsert directive with a
/// non-empty key is given, rows sharing a key are first collapsed according to
/// its policy, because the server rejects a statement that touches the same
/// row twice.
pub fn build_multi_insert<R>(
    schema: &ObjectSchema<R>,
    table: &str,
    records: &[R],
    overrides: &Overrides,
    upsert: Option<&UpsertDirective>,
) -> Result<Option<Statement>> {
    if records.is_empty() {
        return Ok(None);
    }

    validate_table(table)?;
    let planned = plan_columns(schema, overrides)?;
    let fields = schema.fields();

    let param_columns: Vec<&PlannedColumn<'_>> = planned.iter().filter(|c| c.slot == Slot::Param).collect();
    let param_count = param_columns.len();

    let mut rows: Vec<Vec<SqlValue>> = records
        .iter()
        .map(|record| {
            param_columns
                .iter()
                .map(|c| fields[c.field_idx].encode(record))
                .collect()
        })
        .collect();

    let conflict = match upsert {
        Some(directive) if !directive.conflict_key.is_empty() => Some(directive),
        _ => None,
    };

    let mut key_columns = Vec::new();
    if let Some(directive) = conflict {
        let mut key_positions = Vec::with_capacity(directive.conflict_key.len());
        for key in &directive.conflict_key {
            let position = param_columns.iter().position(|c| c.field == key).ok_or_else(|| {
                StoreError::Config(format!(
                    "Conflict key field '{}' must be a parameterised field of schema '{}'",
                    key,
                    schema.name()
                ))
            })?;
            key_positions.push(position);
            key_columns.push(param_columns[position].column);
        }
        rows = resolve_batch_conflicts(rows, &key_positions, directive.policy);
    }

    let column_list: Vec<&str> = planned.iter().map(|c| c.column).collect();
    let mut tuples = Vec::with_capacity(rows.len());
    for record_idx in 0..rows.len() {
        let mut offset = 0;
        let cells: Vec<String> = planned
            .iter()
            .map(|c| match c.slot {
                Slot::Now => "now()".to_string(),
                Slot::Param => {
                    offset += 1;
                    format!("${}", record_idx * param_count + offset)
                }
            })
            .collect();
        tuples.push(format!("({})", cells.join(", ")));
    }

    let mut sql = format!(
        "INSERT INTO {} AS {}({}) VALUES {}",
        table,
        SOURCE_ALIAS,
        column_list.join(", "),
        tuples.join(", ")
    );

    if let Some(directive) = conflict {
        let update_columns: Vec<&str> = column_list
            .iter()
            .copied()
            .filter(|c| !key_columns.contains(c))
            .collect();

        let action = match directive.policy {
            ConflictPolicy::Ignore => "DO NOTHING".to_string(),
            // An empty SET list is invalid; a key-only row has nothing to update.
            _ if update_columns.is_empty() => "DO NOTHING".to_string(),
            ConflictPolicy::Replace => format!(
                "DO UPDATE SET {}",
                update_columns
                    .iter()
                    .map(|c| format!("{c} = EXCLUDED.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ConflictPolicy::ReplaceIfNull => format!(
                "DO UPDATE SET {}",
                update_columns
                    .iter()
                    .map(|c| format!("{c} = COALESCE({SOURCE_ALIAS}.{c}, EXCLUDED.{c})"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };

        sql.push_str(&format!(" ON CONFLICT({}) {}", key_columns.join(", "), action));
    }

    let params = rows.into_iter().flatten().collect();
    Ok(Some(Statement { sql, params }))
}

/// Collapse rows that share a conflict key, scanning in input order.
///
/// - `Replace`: the last row for a key wins.
/// - `Ignore`: the first row for a key wins.
/// - `ReplaceIfNull`: rows are merged column by column; a later non-null value
///   replaces an earlier one, a later null never does.
///
/// Each surviving key stays at the position of its first occurrence.
pub fn resolve_batch_conflicts(
    rows: Vec<Vec<SqlValue>>,
    key_positions: &[usize],
    policy: ConflictPolicy,
) -> Vec<Vec<SqlValue>> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut resolved: Vec<Vec<SqlValue>> = Vec::with_capacity(rows.len());

    for row in rows {
        let key = conflict_key(&row, key_positions);
        match index.get(&key) {
            None => {
                index.insert(key, resolved.len());
                resolved.push(row);
            }
            Some(&idx) => match policy {
                ConflictPolicy::Replace => resolved[idx] = row,
                ConflictPolicy::Ignore => {}
                ConflictPolicy::ReplaceIfNull => {
                    for (kept, incoming) in resolved[idx].iter_mut().zip(row) {
                        if !incoming.is_null() {
                            *kept = incoming;
                        }
                    }
                }
            },
        }
    }

    resolved
}

/// Stringified key tuple, e.g. `[2,"eu"]`. Decimals are normalized so values
/// the server compares as equal (`2.0`, `2.00`) share a key.
fn conflict_key(row: &[SqlValue], key_positions: &[usize]) -> String {
    let values: Vec<serde_json::Value> = key_positions
        .iter()
        .map(|&p| match &row[p] {
            SqlValue::Decimal(d) => SqlValue::Decimal(d.normalize()).to_json(),
            other => other.to_json(),
        })
        .collect();
    serde_json::Value::Array(values).to_string()
}
