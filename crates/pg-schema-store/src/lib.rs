//! # pg-schema-store
//!
//! Schema-typed PostgreSQL persistence with forward-only migrations.
//!
//! This library provides:
//!
//! - **Typed reads** that decode rows into records through an [`ObjectSchema`]
//! - **Batched writes** as a single multi-row `INSERT`, with `REPLACE`,
//!   `REPLACE_IF_NULL` and `IGNORE` conflict policies
//! - **Migrations**: an append-only [`MigrationList`] applied by a
//!   [`MigrationProcessor`] that refuses to run over altered history
//! - **Lifecycle handling** for Create/Update/Delete provisioning requests
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg_schema_store::{
//!     migration_list, Config, MigrationProcessor, PgSessionProvider, SessionProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> pg_schema_store::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let provider = PgSessionProvider::new(&config.database)?;
//!
//!     let list = migration_list()
//!         .migration(1, "create users", "CREATE TABLE users(id BIGINT PRIMARY KEY, name TEXT)")?;
//!     let processor = MigrationProcessor::new(list)?;
//!
//!     let session = provider.acquire().await?;
//!     processor.initialize(session.as_ref()).await?;
//!     let result = processor.migrate(session.as_ref()).await;
//!     session.close().await;
//!     println!("{}", result?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod lifecycle;
pub mod migration;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use crate::config::{Config, DatabaseConfig, MigrationsConfig};
pub use crate::core::{FieldDescriptor, FieldKind, ObjectSchema, QueryResult, Session, SessionProvider, SqlValue};
pub use drivers::{PgSession, PgSessionProvider, SslMode};
pub use error::{Result, StoreError, ValueError};
pub use lifecycle::{LifecycleRequest, LifecycleResponse, MigrationLifecycle, RequestType, ResponseStatus};
pub use migration::{
    migration_list, MigrationList, MigrationLogRecord, MigrationProcessor, MigrationResult, MigrationStep,
    ProcessorOptions,
};
pub use query::{
    build_multi_insert, build_select, multi_insert, multi_upsert, select, typed_query, ConflictPolicy,
    FieldOverride, Overrides, Statement, UpsertDirective,
};
