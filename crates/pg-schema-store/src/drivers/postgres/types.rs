//! Conversion between [`SqlValue`] and the PostgreSQL wire format.
//!
//! Parameters are bound against the type the server inferred for each `$n`
//! slot, so one `SqlValue` variant can serve several column types (an
//! `Integer` bound to a `NUMERIC` column, a `BigInteger` bound to `TEXT`, and
//! so on). Dispatch is on the type name, as reported by the server.
//!
//! Native arrays travel as [`SqlValue::Json`] arrays: each element is bound
//! against the array's member type, and array columns read back as JSON.
//! `uuid` columns read back as text; `bytea` maps to [`SqlValue::Bytes`].

use std::error::Error;
use std::str::FromStr;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::core::SqlValue;
use crate::error::{Result, StoreError};

type BoxError = Box<dyn Error + Sync + Send>;

fn unsupported(value: &SqlValue, ty: &Type) -> BoxError {
    format!("cannot bind {} value to a parameter of type {}", value.type_name(), ty.name()).into()
}

fn is_text(ty: &Type) -> bool {
    matches!(ty.name(), "text" | "varchar" | "bpchar" | "name" | "unknown" | "citext")
}

fn integer_to_sql(n: i128, value: &SqlValue, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match ty.name() {
        "int2" => i16::try_from(n)?.to_sql(ty, out),
        "int4" => i32::try_from(n)?.to_sql(ty, out),
        "int8" => i64::try_from(n)?.to_sql(ty, out),
        "oid" => u32::try_from(n)?.to_sql(ty, out),
        "numeric" => Decimal::try_from_i128_with_scale(n, 0)?.to_sql(ty, out),
        "float4" => (n as f32).to_sql(ty, out),
        "float8" => (n as f64).to_sql(ty, out),
        "json" | "jsonb" => match i64::try_from(n) {
            Ok(small) => serde_json::Value::from(small).to_sql(ty, out),
            Err(_) => serde_json::Value::String(n.to_string()).to_sql(ty, out),
        },
        _ if is_text(ty) => n.to_string().as_str().to_sql(ty, out),
        _ => Err(unsupported(value, ty)),
    }
}

fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match ty.name() {
        "int2" => s.trim().parse::<i16>()?.to_sql(ty, out),
        "int4" => s.trim().parse::<i32>()?.to_sql(ty, out),
        "int8" => s.trim().parse::<i64>()?.to_sql(ty, out),
        "numeric" => Decimal::from_str(s.trim())?.to_sql(ty, out),
        "float4" => s.trim().parse::<f32>()?.to_sql(ty, out),
        "float8" => s.trim().parse::<f64>()?.to_sql(ty, out),
        "bool" => s.trim().parse::<bool>()?.to_sql(ty, out),
        "timestamptz" => DateTime::parse_from_rfc3339(s.trim())?
            .with_timezone(&Utc)
            .to_sql(ty, out),
        "timestamp" => DateTime::parse_from_rfc3339(s.trim())?
            .naive_utc()
            .to_sql(ty, out),
        "date" => NaiveDate::from_str(s.trim())?.to_sql(ty, out),
        "uuid" => Uuid::parse_str(s.trim())?.to_sql(ty, out),
        "bytea" => match s.strip_prefix("\\x") {
            Some(encoded) => hex::decode(encoded)?.to_sql(ty, out),
            None => s.as_bytes().to_sql(ty, out),
        },
        "json" | "jsonb" => {
            let value = serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string()));
            value.to_sql(ty, out)
        }
        _ if matches!(ty.kind(), Kind::Array(_)) => {
            Err(format!("cannot bind text value to a parameter of type {}", ty.name()).into())
        }
        // Text, enums and domains over text share the UTF-8 binary form.
        _ => {
            out.extend_from_slice(s.as_bytes());
            Ok(IsNull::No)
        }
    }
}

/// Element of a JSON array, as bound to a native array's member type.
fn json_element(value: &serde_json::Value) -> SqlValue {
    match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => match Decimal::from_str(&n.to_string()) {
                Ok(d) => SqlValue::Decimal(d),
                Err(_) => n.as_f64().map_or_else(|| SqlValue::Json(value.clone()), SqlValue::Float),
            },
        },
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Json(other.clone()),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => match ty.name() {
                "bool" => b.to_sql(ty, out),
                _ if is_text(ty) => b.to_string().as_str().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            SqlValue::Integer(n) => integer_to_sql(i128::from(*n), self, ty, out),
            SqlValue::BigInteger(n) => integer_to_sql(*n, self, ty, out),
            SqlValue::Decimal(d) => match ty.name() {
                "numeric" => d.to_sql(ty, out),
                "float4" | "float8" => d
                    .to_f64()
                    .ok_or_else(|| unsupported(self, ty))?
                    .to_sql(ty, out),
                "int2" | "int4" | "int8" if d.fract().is_zero() => {
                    let n = d.to_i128().ok_or_else(|| unsupported(self, ty))?;
                    integer_to_sql(n, self, ty, out)
                }
                _ if is_text(ty) => d.to_string().as_str().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            SqlValue::Float(f) => match ty.name() {
                "float8" => f.to_sql(ty, out),
                "float4" => (*f as f32).to_sql(ty, out),
                "numeric" => Decimal::try_from(*f)?.to_sql(ty, out),
                _ if is_text(ty) => f.to_string().as_str().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            SqlValue::Text(s) => text_to_sql(s, ty, out),
            SqlValue::Timestamp(ts) => match ty.name() {
                "timestamptz" => ts.to_sql(ty, out),
                "timestamp" => ts.naive_utc().to_sql(ty, out),
                "date" => ts.date_naive().to_sql(ty, out),
                _ if is_text(ty) => ts.to_rfc3339().as_str().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            SqlValue::Json(v) => match ty.name() {
                "json" | "jsonb" => v.to_sql(ty, out),
                _ if is_text(ty) => v.to_string().as_str().to_sql(ty, out),
                _ => match (v, ty.kind()) {
                    (serde_json::Value::Array(items), Kind::Array(_)) => {
                        let elements: Vec<SqlValue> = items.iter().map(json_element).collect();
                        elements.to_sql(ty, out)
                    }
                    _ => Err(unsupported(self, ty)),
                },
            },
            SqlValue::Bytes(b) => match ty.name() {
                "bytea" => b.to_sql(ty, out),
                _ if is_text(ty) => format!("\\x{}", hex::encode(b)).as_str().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// JSON form of a numeric array element. Integral values within `i64` become
/// numbers; anything else keeps its exact text.
fn decimal_json(d: Decimal) -> serde_json::Value {
    match d.fract().is_zero().then(|| d.to_i64()).flatten() {
        Some(n) => serde_json::Value::from(n),
        None => serde_json::Value::String(d.normalize().to_string()),
    }
}

fn collect_array<'a, T, F>(row: &'a Row, idx: usize, to_json: F) -> Result<Option<serde_json::Value>>
where
    T: FromSql<'a>,
    F: Fn(T) -> serde_json::Value,
{
    let items = row.try_get::<_, Option<Vec<Option<T>>>>(idx)?;
    Ok(items.map(|items| {
        serde_json::Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(serde_json::Value::Null, &to_json))
                .collect(),
        )
    }))
}

fn array_value(row: &Row, idx: usize, member: &Type) -> Result<Option<serde_json::Value>> {
    match member.name() {
        "bool" => collect_array::<bool, _>(row, idx, serde_json::Value::Bool),
        "int2" => collect_array::<i16, _>(row, idx, serde_json::Value::from),
        "int4" => collect_array::<i32, _>(row, idx, serde_json::Value::from),
        "int8" => collect_array::<i64, _>(row, idx, serde_json::Value::from),
        "float4" => collect_array::<f32, _>(row, idx, |f| serde_json::Value::from(f64::from(f))),
        "float8" => collect_array::<f64, _>(row, idx, serde_json::Value::from),
        "numeric" => collect_array::<Decimal, _>(row, idx, decimal_json),
        "uuid" => collect_array::<Uuid, _>(row, idx, |u| serde_json::Value::String(u.to_string())),
        "timestamptz" => collect_array::<DateTime<Utc>, _>(row, idx, |ts| serde_json::Value::String(ts.to_rfc3339())),
        "timestamp" => collect_array::<NaiveDateTime, _>(row, idx, |ts| {
            serde_json::Value::String(ts.and_utc().to_rfc3339())
        }),
        "date" => collect_array::<NaiveDate, _>(row, idx, |d| serde_json::Value::String(d.to_string())),
        "json" | "jsonb" => collect_array::<serde_json::Value, _>(row, idx, |v| v),
        _ if is_text(member) => collect_array::<String, _>(row, idx, serde_json::Value::String),
        other => Err(StoreError::query(format!(
            "column '{}' has unsupported array type '{}[]'",
            row.columns()[idx].name(),
            other
        ))),
    }
}

/// Read column `idx` of `row` as a [`SqlValue`].
pub fn row_value(row: &Row, idx: usize) -> Result<SqlValue> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    if let Kind::Array(member) = ty.kind() {
        return Ok(array_value(row, idx, member)?.map_or(SqlValue::Null, SqlValue::Json));
    }

    let value = match ty.name() {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Bool),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|n| SqlValue::Integer(i64::from(n))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|n| SqlValue::Integer(i64::from(n))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::Integer),
        "oid" => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|n| SqlValue::Integer(i64::from(n))),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|f| SqlValue::Float(f64::from(f))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Float),
        "numeric" => row.try_get::<_, Option<Decimal>>(idx)?.map(SqlValue::Decimal),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(SqlValue::Timestamp),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|ts| SqlValue::Timestamp(ts.and_utc())),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ts| SqlValue::Timestamp(ts.and_utc())),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(SqlValue::Json),
        "uuid" => row
            .try_get::<_, Option<Uuid>>(idx)?
            .map(|u| SqlValue::Text(u.to_string())),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(SqlValue::Bytes),
        _ if is_text(ty) => row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text),
        other => {
            return Err(StoreError::query(format!(
                "column '{}' has unsupported type '{}'",
                column.name(),
                other
            )))
        }
    };

    Ok(value.unwrap_or(SqlValue::Null))
}
