//! Core abstractions shared by the query engine and the migration engine.
//!
//! - [`identifier`]: camelCase/snake_case mapping and identifier validation
//! - [`value`]: wire-level SQL value representation
//! - [`schema`]: field-descriptor tables describing typed records
//! - [`session`]: the driver contract every backend implements

pub mod identifier;
pub mod schema;
pub mod session;
pub mod value;

pub use schema::{FieldCodec, FieldDescriptor, FieldKind, ObjectSchema, ObjectSchemaBuilder, RowDecoder};
pub use session::{QueryResult, Session, SessionProvider};
pub use value::{params_to_json, SqlValue};
