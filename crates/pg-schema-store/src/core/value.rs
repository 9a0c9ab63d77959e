//! SQL value types exchanged with the session layer.
//!
//! Every value travelling between typed records and the driver is a [`SqlValue`].
//! Encoders produce them, the driver binds them as positional parameters, and
//! result rows come back as vectors of them.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// SQL value enum for type-safe row handling.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer within the 64-bit range (smallint/int/bigint).
    Integer(i64),

    /// Integer beyond the 64-bit range, sent to the server as NUMERIC.
    BigInteger(i128),

    /// Exact decimal value (numeric/decimal).
    Decimal(Decimal),

    /// Floating point value (real/double precision).
    Float(f64),

    /// Text data.
    Text(String),

    /// Timestamp, always normalised to UTC.
    Timestamp(DateTime<Utc>),

    /// JSON document, used for nested objects and arrays.
    Json(serde_json::Value),

    /// Binary data (bytea).
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short type name used in conversion errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Integer(_) => "integer",
            SqlValue::BigInteger(_) => "big integer",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Json(_) => "json",
            SqlValue::Bytes(_) => "bytes",
        }
    }

    /// JSON rendering for logs.
    ///
    /// Integers beyond the range a double can hold exactly, and all decimals,
    /// are rendered as strings so the logged value is the exact one bound.
    /// Binary data uses the PostgreSQL hex form (`\x...`).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

        match self {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::Bool(b) => serde_json::Value::Bool(*b),
            SqlValue::Integer(n) if n.unsigned_abs() <= MAX_SAFE_INTEGER => serde_json::Value::from(*n),
            SqlValue::Integer(n) => serde_json::Value::String(n.to_string()),
            SqlValue::BigInteger(n) => serde_json::Value::String(n.to_string()),
            SqlValue::Decimal(d) => serde_json::Value::String(d.to_string()),
            SqlValue::Float(f) => serde_json::Value::from(*f),
            SqlValue::Text(s) => serde_json::Value::String(s.clone()),
            SqlValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            SqlValue::Json(v) => v.clone(),
            SqlValue::Bytes(b) => serde_json::Value::String(format!("\\x{}", hex::encode(b))),
        }
    }
}

/// Render a parameter array as a JSON string for logging.
pub fn params_to_json(params: &[SqlValue]) -> String {
    serde_json::Value::Array(params.iter().map(SqlValue::to_json).collect()).to_string()
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Integer(n) => write!(f, "{}", n),
            SqlValue::BigInteger(n) => write!(f, "{}", n),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::Float(n) => write!(f, "{}", n),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            SqlValue::Json(v) => write!(f, "{}", v),
            SqlValue::Bytes(b) => write!(f, "\\x{}", hex::encode(b)),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i128> for SqlValue {
    fn from(v: i128) -> Self {
        SqlValue::BigInteger(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        SqlValue::Json(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}
