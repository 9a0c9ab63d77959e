//! Database driver implementations of the session contract.
//!
//! - [`postgres`]: PostgreSQL via `tokio-postgres` and `deadpool-postgres`

pub mod postgres;

pub use postgres::{PgSession, PgSessionProvider, SslMode};
