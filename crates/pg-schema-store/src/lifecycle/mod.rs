//! Drives the migration processor from provisioning lifecycle requests.
//!
//! Create initializes the log table and migrates, Update only migrates, and
//! Delete does nothing: applied migrations are never rolled back. Every
//! outcome, including errors, is turned into a [`LifecycleResponse`].

pub mod types;

use tracing::{error, info};

use crate::core::{Session, SessionProvider};
use crate::error::Result;
use crate::migration::{MigrationProcessor, MigrationResult};

pub use types::{LifecycleRequest, LifecycleResponse, RequestType, ResponseData, ResponseStatus};

/// Result text reported for Delete requests.
pub const DELETE_RESULT: &str = "no-op: applied migrations are kept";

/// Fresh resource identity derived from a request id.
pub fn resource_id(request_id: &str) -> String {
    format!("migrations-{}", request_id)
}

pub struct MigrationLifecycle<P> {
    provider: P,
    processor: MigrationProcessor,
}

impl<P: SessionProvider> MigrationLifecycle<P> {
    pub fn new(provider: P, processor: MigrationProcessor) -> Self {
        Self { provider, processor }
    }

    pub fn processor(&self) -> &MigrationProcessor {
        &self.processor
    }

    /// Handle one request. Never fails; errors become FAILED responses.
    pub async fn handle(&self, request: &LifecycleRequest) -> LifecycleResponse {
        let physical_id = match request.request_type {
            RequestType::Create => resource_id(&request.request_id),
            RequestType::Update | RequestType::Delete => request
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| resource_id(&request.request_id)),
        };

        info!(
            "{:?} request {} for {} ({})",
            request.request_type, request.request_id, request.logical_resource_id, physical_id
        );

        let outcome = match request.request_type {
            RequestType::Delete => {
                return LifecycleResponse::success(request, physical_id, DELETE_RESULT.to_string());
            }
            RequestType::Create => self.run(true).await,
            RequestType::Update => self.run(false).await,
        };

        match outcome {
            Ok(result @ MigrationResult::Success { .. }) => {
                info!("Migrations finished: {}", result);
                LifecycleResponse::success(request, physical_id, result.to_string())
            }
            Ok(result) => {
                let reason = result.error_message().unwrap_or_default().to_string();
                error!("Migrations failed: {}", result);
                LifecycleResponse::failed(request, physical_id, reason, result.to_string())
            }
            Err(e) => {
                error!("{:?} request {} failed: {}", request.request_type, request.request_id, e);
                let message = e.to_string();
                LifecycleResponse::failed(request, physical_id, message.clone(), message)
            }
        }
    }

    async fn run(&self, initialize: bool) -> Result<MigrationResult> {
        let session = self.provider.acquire().await?;
        let outcome = self.apply(session.as_ref(), initialize).await;
        session.close().await;
        outcome
    }

    async fn apply(&self, session: &dyn Session, initialize: bool) -> Result<MigrationResult> {
        if initialize {
            self.processor.initialize(session).await?;
        }
        self.processor.migrate(session).await
    }
}
