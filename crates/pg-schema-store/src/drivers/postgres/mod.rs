//! PostgreSQL driver.
//!
//! - [`PgSessionProvider`]: pooled session source (`deadpool-postgres`)
//! - [`PgSession`]: a pooled client implementing the session contract
//! - [`SslMode`]: TLS settings (`rustls`)

mod session;
mod tls;
mod types;

pub use session::{HealthCheck, PgSession, PgSessionProvider};
pub use tls::{make_tls_connect, SslMode};
pub use types::row_value;
