//! Pooled PostgreSQL sessions.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::{pin_mut, TryStreamExt};
use serde::Serialize;
use tokio_postgres::types::ToSql;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::core::{QueryResult, Session, SessionProvider, SqlValue};
use crate::drivers::postgres::tls::{make_tls_connect, SslMode};
use crate::drivers::postgres::types::row_value;
use crate::error::{Result, StoreError};

/// Outcome of [`PgSessionProvider::health_check`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Hands out sessions from a `deadpool-postgres` pool.
///
/// Connections are opened on first use, so building a provider never touches
/// the network.
pub struct PgSessionProvider {
    pool: Pool,
    target: String,
}

impl PgSessionProvider {
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        pg_config.application_name(config.application_name.as_deref().unwrap_or("pg-schema-store"));

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let mgr = match make_tls_connect(ssl_mode)? {
            Some(tls) => Manager::from_config(pg_config, tls, mgr_config),
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config)
            }
        };

        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| StoreError::pool(e, "creating PostgreSQL pool"))?;

        let target = format!("{}:{}/{}", config.host, config.port, config.database);
        info!(
            "PostgreSQL pool ready for {} (ssl_mode={}, max_connections={})",
            target, ssl_mode, config.max_connections
        );

        Ok(Self { pool, target })
    }

    /// `host:port/database` this provider connects to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Round-trip a `SELECT 1` and report latency. Connection failures are
    /// reported in the result rather than as an error.
    pub async fn health_check(&self) -> HealthCheck {
        let start = Instant::now();
        let outcome = async {
            let client = self
                .pool
                .get()
                .await
                .map_err(|e| StoreError::pool(e, "health check"))?;
            client.simple_query("SELECT 1").await?;
            let row = client.query_one("SHOW server_version", &[]).await?;
            Ok::<String, StoreError>(row.try_get(0)?)
        }
        .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(version) => HealthCheck {
                connected: true,
                latency_ms,
                server_version: Some(version),
                error: None,
            },
            Err(e) => HealthCheck {
                connected: false,
                latency_ms,
                server_version: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl SessionProvider for PgSessionProvider {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::pool(e, format!("acquiring session for {}", self.target)))?;
        Ok(Box::new(PgSession { client }))
    }
}

/// A pooled client. Closing it returns the connection to the pool.
pub struct PgSession {
    client: Object,
}

#[async_trait]
impl Session for PgSession {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        debug!("postgres query ({} params): {}", params.len(), sql);
        let statement = self.client.prepare_cached(sql).await?;
        let fields: Vec<String> = statement.columns().iter().map(|c| c.name().to_string()).collect();

        let stream = self
            .client
            .query_raw(&statement, params.iter().map(|p| p as &(dyn ToSql + Sync)))
            .await?;
        pin_mut!(stream);

        let mut rows = Vec::new();
        while let Some(row) = stream.try_next().await? {
            let values = (0..row.len()).map(|idx| row_value(&row, idx)).collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }

        Ok(QueryResult {
            fields,
            rows,
            rows_affected: stream.rows_affected().unwrap_or(0),
        })
    }

    async fn batch_execute(&self, sql: &str) -> Result<()> {
        debug!("postgres batch: {}", sql);
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        drop(self.client);
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
