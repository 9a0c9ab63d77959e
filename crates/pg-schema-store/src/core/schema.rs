//! Object schemas: ordered field-descriptor tables for typed records.
//!
//! A schema is the only place that knows how a Rust record maps onto SQL
//! columns. Each [`FieldDescriptor`] carries the field's name, its column, a
//! semantic [`FieldKind`], nullability/optionality flags and a pair of typed
//! encode/decode closures. The engine never inspects records directly; it
//! iterates the descriptor table.
//!
//! Field order is significant: it determines column order and therefore the
//! numbering of positional parameters in generated statements.
//!
//! # Example
//!
//! ```
//! use pg_schema_store::core::ObjectSchema;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     id: i64,
//!     name: Option<String>,
//! }
//!
//! let schema = ObjectSchema::<Person>::builder("person")
//!     .field("id", |p| &p.id, |p| &mut p.id)
//!     .field("name", |p| &p.name, |p| &mut p.name)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.columns(), vec!["id", "name"]);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::core::identifier::{camel_to_snake, snake_to_camel, validate_column};
use crate::core::value::SqlValue;
use crate::error::{Result, StoreError, ValueError};

/// Semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Boolean,
    Date,
    Integer,
    BigInteger,
    Decimal,
    Object,
    Array,
    Binary,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Integer => "integer",
            FieldKind::BigInteger => "bigint",
            FieldKind::Decimal => "decimal",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
            FieldKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// Conversion between a Rust field type and [`SqlValue`].
pub trait FieldCodec: Sized {
    /// Semantic type of the field.
    const KIND: FieldKind;

    /// Whether the Rust type can represent NULL.
    const NULLABLE: bool = false;

    fn encode(&self) -> SqlValue;

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError>;
}

fn mismatch(expected: &'static str, found: &SqlValue) -> ValueError {
    match found {
        SqlValue::Null => ValueError::UnexpectedNull,
        other => ValueError::TypeMismatch {
            expected,
            found: other.type_name(),
        },
    }
}

impl FieldCodec for String {
    const KIND: FieldKind = FieldKind::String;

    fn encode(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FieldCodec for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn encode(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FieldCodec for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn encode(&self) -> SqlValue {
        SqlValue::Integer(*self)
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        let wide = i128::decode(value)?;
        i64::try_from(wide).map_err(|_| ValueError::OutOfRange {
            value: wide.to_string(),
            target: "i64",
        })
    }
}

impl FieldCodec for i32 {
    const KIND: FieldKind = FieldKind::Integer;

    fn encode(&self) -> SqlValue {
        SqlValue::Integer(i64::from(*self))
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        let wide = i128::decode(value)?;
        i32::try_from(wide).map_err(|_| ValueError::OutOfRange {
            value: wide.to_string(),
            target: "i32",
        })
    }
}

impl FieldCodec for i128 {
    const KIND: FieldKind = FieldKind::BigInteger;

    fn encode(&self) -> SqlValue {
        SqlValue::BigInteger(*self)
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Integer(n) => Ok(i128::from(n)),
            SqlValue::BigInteger(n) => Ok(n),
            SqlValue::Decimal(d) if d.fract().is_zero() => {
                d.to_i128().ok_or_else(|| ValueError::OutOfRange {
                    value: d.to_string(),
                    target: "i128",
                })
            }
            SqlValue::Decimal(d) => Err(ValueError::Parse {
                value: d.to_string(),
                target: "integer",
            }),
            SqlValue::Text(s) => s.trim().parse::<i128>().map_err(|_| ValueError::Parse {
                value: s,
                target: "integer",
            }),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FieldCodec for Decimal {
    const KIND: FieldKind = FieldKind::Decimal;

    fn encode(&self) -> SqlValue {
        SqlValue::Decimal(*self)
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Decimal(d) => Ok(d),
            SqlValue::Integer(n) => Ok(Decimal::from(n)),
            SqlValue::BigInteger(n) => {
                Decimal::try_from_i128_with_scale(n, 0).map_err(|_| ValueError::OutOfRange {
                    value: n.to_string(),
                    target: "decimal",
                })
            }
            SqlValue::Float(f) => Decimal::try_from(f).map_err(|_| ValueError::OutOfRange {
                value: f.to_string(),
                target: "decimal",
            }),
            SqlValue::Text(s) => Decimal::from_str(s.trim()).map_err(|_| ValueError::Parse {
                value: s,
                target: "decimal",
            }),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FieldCodec for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::Date;

    fn encode(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Timestamp(ts) => Ok(ts),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| ValueError::Parse {
                    value: s,
                    target: "timestamp",
                }),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl FieldCodec for serde_json::Value {
    const KIND: FieldKind = FieldKind::Object;

    fn encode(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Json(v) => Ok(v),
            SqlValue::Text(s) => serde_json::from_str(&s).map_err(|_| ValueError::Parse {
                value: s,
                target: "json",
            }),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl<T> FieldCodec for Vec<T>
where
    T: Serialize + DeserializeOwned,
{
    const KIND: FieldKind = FieldKind::Array;

    fn encode(&self) -> SqlValue {
        match serde_json::to_value(self) {
            Ok(json) => SqlValue::Json(json),
            Err(e) => {
                error!("Array value could not be serialized, storing NULL: {}", e);
                SqlValue::Null
            }
        }
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        let json = serde_json::Value::decode(value)?;
        let rendered = json.to_string();
        serde_json::from_value(json).map_err(|_| ValueError::Parse {
            value: rendered,
            target: "array",
        })
    }
}

impl FieldCodec for Bytes {
    const KIND: FieldKind = FieldKind::Binary;

    fn encode(&self) -> SqlValue {
        SqlValue::Bytes(self.to_vec())
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Bytes(b) => Ok(Bytes::from(b)),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl<T: FieldCodec> FieldCodec for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn encode(&self) -> SqlValue {
        match self {
            Some(v) => v.encode(),
            None => SqlValue::Null,
        }
    }

    fn decode(value: SqlValue) -> std::result::Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }
}

type EncodeFn<R> = Box<dyn Fn(&R) -> SqlValue + Send + Sync>;
type DecodeFn<R> = Box<dyn Fn(&mut R, SqlValue) -> std::result::Result<(), ValueError> + Send + Sync>;

/// Descriptor for one field of an [`ObjectSchema`].
pub struct FieldDescriptor<R> {
    name: String,
    column: String,
    explicit_column: bool,
    kind: FieldKind,
    not_null: bool,
    optional: bool,
    encode: EncodeFn<R>,
    decode: DecodeFn<R>,
}

impl<R: 'static> FieldDescriptor<R> {
    /// Descriptor for a record field reached through accessor functions.
    ///
    /// Kind and nullability come from the field type's [`FieldCodec`].
    pub fn new<T>(name: impl Into<String>, get: fn(&R) -> &T, set: fn(&mut R) -> &mut T) -> Self
    where
        T: FieldCodec + 'static,
    {
        Self::custom(
            name,
            T::KIND,
            !T::NULLABLE,
            move |record: &R| get(record).encode(),
            move |record: &mut R, value| {
                *set(record) = T::decode(value)?;
                Ok(())
            },
        )
    }

    /// Descriptor with hand-written encode/decode functions.
    pub fn custom<E, D>(name: impl Into<String>, kind: FieldKind, not_null: bool, encode: E, decode: D) -> Self
    where
        E: Fn(&R) -> SqlValue + Send + Sync + 'static,
        D: Fn(&mut R, SqlValue) -> std::result::Result<(), ValueError> + Send + Sync + 'static,
    {
        let name = name.into();
        let column = camel_to_snake(&name);
        Self {
            name,
            column,
            explicit_column: false,
            kind,
            not_null,
            optional: false,
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }

    /// Store the field in a column whose name is not derived from the field name.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self.explicit_column = true;
        self
    }

    /// Mark the field optional: it may be absent from query results.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl<R> FieldDescriptor<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Encode this field of `record`.
    pub fn encode(&self, record: &R) -> SqlValue {
        (self.encode)(record)
    }

    /// Decode `value` into this field of `record`.
    pub fn decode_into(&self, record: &mut R, value: SqlValue) -> Result<()> {
        if value.is_null() && self.not_null {
            return Err(StoreError::FieldDecode {
                field: self.name.clone(),
                source: ValueError::UnexpectedNull,
            });
        }
        (self.decode)(record, value).map_err(|source| StoreError::FieldDecode {
            field: self.name.clone(),
            source,
        })
    }

    /// Whether a result column named `column` belongs to this field.
    fn matches_column(&self, column: &str) -> bool {
        if self.explicit_column {
            column == self.column
        } else {
            snake_to_camel(column) == self.name
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("not_null", &self.not_null)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Ordered, immutable description of a record type.
pub struct ObjectSchema<R> {
    name: String,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: Default + 'static> ObjectSchema<R> {
    /// Start building a schema.
    pub fn builder(name: impl Into<String>) -> ObjectSchemaBuilder<R> {
        ObjectSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }
}

impl<R> ObjectSchema<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    /// Look up a field by its (camelCase) name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names in field order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }

    /// Encode every field of `record`, in field order.
    pub fn encode(&self, record: &R) -> Vec<SqlValue> {
        self.fields.iter().map(|f| f.encode(record)).collect()
    }

    /// Prepare a decoder for rows with the given result columns.
    ///
    /// Fails with [`StoreError::SchemaFieldMissing`] if a non-optional field has
    /// no matching column. Columns not described by the schema are ignored.
    pub fn row_decoder<'a>(&'a self, columns: &[String]) -> Result<RowDecoder<'a, R>> {
        self.row_decoder_excluding(columns, |_| false)
    }

    /// Like [`row_decoder`](Self::row_decoder), but fields for which `excluded`
    /// returns true are neither required nor decoded.
    pub fn row_decoder_excluding<'a, F>(&'a self, columns: &[String], excluded: F) -> Result<RowDecoder<'a, R>>
    where
        F: Fn(&str) -> bool,
    {
        let mut positions = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if excluded(&field.name) {
                positions.push(None);
                continue;
            }
            let position = columns.iter().position(|c| field.matches_column(c));
            if position.is_none() && !field.optional {
                return Err(StoreError::SchemaFieldMissing {
                    field: field.name.clone(),
                    column: field.column.clone(),
                });
            }
            positions.push(position);
        }
        Ok(RowDecoder {
            schema: self,
            positions,
        })
    }
}

impl<R> fmt::Debug for ObjectSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`ObjectSchema`].
pub struct ObjectSchemaBuilder<R> {
    name: String,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: Default + 'static> ObjectSchemaBuilder<R> {
    /// Append a field reached through accessor functions.
    #[must_use]
    pub fn field<T>(self, name: &str, get: fn(&R) -> &T, set: fn(&mut R) -> &mut T) -> Self
    where
        T: FieldCodec + 'static,
    {
        self.descriptor(FieldDescriptor::new(name, get, set))
    }

    /// Append a prepared descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: FieldDescriptor<R>) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Validate and freeze the schema.
    pub fn build(self) -> Result<ObjectSchema<R>> {
        if self.fields.is_empty() {
            return Err(StoreError::Config(format!(
                "Schema '{}' has no fields",
                self.name
            )));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for field in &self.fields {
            validate_column(&field.column)?;
            if !names.insert(field.name.as_str()) {
                return Err(StoreError::Config(format!(
                    "Schema '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
            if !columns.insert(field.column.as_str()) {
                return Err(StoreError::Config(format!(
                    "Schema '{}' maps two fields to column '{}'",
                    self.name, field.column
                )));
            }
        }

        Ok(ObjectSchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// Decodes result rows into records using a precomputed column mapping.
pub struct RowDecoder<'a, R> {
    schema: &'a ObjectSchema<R>,
    positions: Vec<Option<usize>>,
}

impl<R: Default> RowDecoder<'_, R> {
    /// Decode one row. Optional fields without a column keep their default.
    pub fn decode(&self, row: Vec<SqlValue>) -> Result<R> {
        let mut values: Vec<Option<SqlValue>> = row.into_iter().map(Some).collect();
        let mut record = R::default();
        for (field, position) in self.schema.fields.iter().zip(&self.positions) {
            let Some(idx) = *position else { continue };
            let value = values
                .get_mut(idx)
                .and_then(Option::take)
                .unwrap_or(SqlValue::Null);
            field.decode_into(&mut record, value)?;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        id: i64,
        display_name: Option<String>,
        balance: i128,
        active: bool,
        opened_at: Option<DateTime<Utc>>,
        rate: Decimal,
        profile: serde_json::Value,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    fn account_schema() -> ObjectSchema<Account> {
        ObjectSchema::<Account>::builder("account")
            .field("id", |a| &a.id, |a| &mut a.id)
            .field("displayName", |a| &a.display_name, |a| &mut a.display_name)
            .field("balance", |a| &a.balance, |a| &mut a.balance)
            .field("active", |a| &a.active, |a| &mut a.active)
            .field("openedAt", |a| &a.opened_at, |a| &mut a.opened_at)
            .field("rate", |a| &a.rate, |a| &mut a.rate)
            .field("profile", |a| &a.profile, |a| &mut a.profile)
            .field("tags", |a| &a.tags, |a| &mut a.tags)
            .descriptor(FieldDescriptor::<Account>::new("nickname", |a| &a.nickname, |a| &mut a.nickname).optional())
            .build()
            .unwrap()
    }

    fn sample() -> Account {
        Account {
            id: 7,
            display_name: Some("Seven".into()),
            balance: 12345678901234567890,
            active: true,
            opened_at: Some(DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().with_timezone(&Utc)),
            rate: Decimal::new(1250, 3),
            profile: serde_json::json!({"tier": "gold"}),
            tags: vec!["a".into(), "b".into()],
            nickname: Some("sev".into()),
        }
    }

    fn columns(schema: &ObjectSchema<Account>) -> Vec<String> {
        schema.columns().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_columns_are_snake_case() {
        let schema = account_schema();
        assert_eq!(
            schema.columns(),
            vec!["id", "display_name", "balance", "active", "opened_at", "rate", "profile", "tags", "nickname"]
        );
        assert_eq!(schema.field("openedAt").unwrap().kind(), FieldKind::Date);
        assert!(!schema.field("displayName").unwrap().is_not_null());
        assert!(schema.field("id").unwrap().is_not_null());
        assert_eq!(schema.field("tags").unwrap().kind(), FieldKind::Array);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let schema = account_schema();
        let record = sample();
        let row = schema.encode(&record);
        assert_eq!(row[2], SqlValue::BigInteger(12345678901234567890));

        let decoder = schema.row_decoder(&columns(&schema)).unwrap();
        assert_eq!(decoder.decode(row).unwrap(), record);
    }

    #[test]
    fn test_big_integer_survives_numeric_wire_form() {
        // NUMERIC columns come back from the driver as decimals.
        let value = Decimal::from_str("12345678901234567890").unwrap();
        assert_eq!(i128::decode(SqlValue::Decimal(value)).unwrap(), 12345678901234567890);
        assert_eq!(
            i128::decode(SqlValue::Text("12345678901234567890".into())).unwrap(),
            12345678901234567890
        );
        assert!(i64::decode(SqlValue::BigInteger(12345678901234567890)).is_err());
    }

    #[test]
    fn test_missing_required_column_fails() {
        let schema = account_schema();
        let cols: Vec<String> = vec!["id".into(), "display_name".into()];
        match schema.row_decoder(&cols) {
            Err(StoreError::SchemaFieldMissing { field, column }) => {
                assert_eq!(field, "balance");
                assert_eq!(column, "balance");
            }
            other => panic!("expected SchemaFieldMissing, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_optional_column_is_skipped() {
        let schema = account_schema();
        let mut cols = columns(&schema);
        cols.pop();
        let mut row = schema.encode(&sample());
        row.pop();

        let decoded = schema.row_decoder(&cols).unwrap().decode(row).unwrap();
        assert_eq!(decoded.nickname, None);
        assert_eq!(decoded.id, 7);
    }

    #[test]
    fn test_decode_error_names_field() {
        let schema = account_schema();
        let mut row = schema.encode(&sample());
        row[3] = SqlValue::Text("yes".into());

        let err = schema.row_decoder(&columns(&schema)).unwrap().decode(row).unwrap_err();
        match err {
            StoreError::FieldDecode { field, source } => {
                assert_eq!(field, "active");
                assert_eq!(
                    source,
                    ValueError::TypeMismatch {
                        expected: "boolean",
                        found: "text"
                    }
                );
            }
            other => panic!("expected FieldDecode, got {:?}", other),
        }
    }

    #[test]
    fn test_null_into_not_null_field_fails() {
        let schema = account_schema();
        let mut row = schema.encode(&sample());
        row[0] = SqlValue::Null;
        let err = schema.row_decoder(&columns(&schema)).unwrap().decode(row).unwrap_err();
        assert!(matches!(err, StoreError::FieldDecode { ref field, source: ValueError::UnexpectedNull } if field == "id"));
    }

    #[test]
    fn test_explicit_column_matches_raw_name() {
        #[derive(Debug, Default)]
        struct Entry {
            ran_at: Option<DateTime<Utc>>,
        }
        let schema = ObjectSchema::<Entry>::builder("entry")
            .descriptor(FieldDescriptor::<Entry>::new("runTimestamp", |e| &e.ran_at, |e| &mut e.ran_at).with_column("run_ts"))
            .build()
            .unwrap();
        assert_eq!(schema.columns(), vec!["run_ts"]);
        assert!(schema.row_decoder(&["run_ts".to_string()]).is_ok());
        assert!(schema.row_decoder(&["run_timestamp".to_string()]).is_err());
    }

    #[test]
    fn test_binary_field_round_trip() {
        #[derive(Debug, Default, PartialEq)]
        struct Blob {
            payload: Bytes,
        }
        let schema = ObjectSchema::<Blob>::builder("blob")
            .field("payload", |b| &b.payload, |b| &mut b.payload)
            .build()
            .unwrap();
        assert_eq!(schema.field("payload").unwrap().kind(), FieldKind::Binary);

        let record = Blob {
            payload: Bytes::from_static(&[0, 159, 146, 150]),
        };
        let row = schema.encode(&record);
        assert_eq!(row[0], SqlValue::Bytes(vec![0, 159, 146, 150]));
        let decoder = schema.row_decoder(&["payload".to_string()]).unwrap();
        assert_eq!(decoder.decode(row).unwrap(), record);
        assert!(Bytes::decode(SqlValue::Text("abc".into())).is_err());
    }

    #[test]
    fn test_unserializable_array_encodes_as_null() {
        use std::collections::BTreeMap;

        let mut grid = BTreeMap::new();
        grid.insert((1, 2), 3);
        assert_eq!(vec![grid].encode(), SqlValue::Null);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = ObjectSchema::<Account>::builder("dup")
            .field("id", |a| &a.id, |a| &mut a.id)
            .field("id", |a| &a.id, |a| &mut a.id)
            .build();
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
